// ==========================================
// 邮件预热与送达准入控制引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 发送信誉保护 (准入控制 + 反馈状态机)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// API 层 - 业务接口
pub mod api;

// 数据库基础设施 (连接初始化/PRAGMA/schema 统一)
pub mod db;

// 日志系统
pub mod logging;

// 时钟注入 (UTC 日界确定性)
pub mod clock;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ContentRiskLevel, EntityKind, HealthStatus, OutcomeKind, PauseAction, PauseKind, PlanTier,
    Provider, SendMode, WarmupStatus,
};

// 领域实体
pub use domain::{
    OutcomeEvent, PauseRecord, PlanLimits, ReputationSnapshot, RiskAssessment, SendingEntity,
    WarmupPolicy,
};

// 引擎
pub use engine::{
    AutoPauseGuard, ContentRiskAdvisor, PlanEntitlementGate, QuotaGuard, ReputationTracker,
    RiskClassifier, WarmupScheduler,
};

// API
pub use api::{ApiError, ApiResult, WarmupApi};

// 时钟
pub use clock::{Clock, FixedClock, SystemClock};

/// 引擎版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
