// ==========================================
// 邮件预热引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assessment;
pub mod entity;
pub mod outcome;
pub mod pause;
pub mod policy;
pub mod types;

// 重导出核心类型
pub use assessment::RiskAssessment;
pub use entity::SendingEntity;
pub use outcome::{OutcomeEvent, ReputationSnapshot};
pub use pause::PauseRecord;
pub use policy::{PlanLimits, WarmupPolicy};
pub use types::{
    ContentRiskLevel, EntityKind, HealthStatus, OutcomeKind, PauseAction, PauseKind, PlanTier,
    Provider, SendMode, WarmupStatus,
};
