// ==========================================
// 邮件预热引擎 - 决策引擎层
// ==========================================
// 红线: 引擎无持久状态，输入实体/策略，输出判定与转换记录
// 并发约束: 作用于同一实体的引擎调用由 API 层的实体锁序列化
// ==========================================

pub mod advisor;
pub mod auto_pause;
pub mod entitlement;
pub mod quota;
pub mod reputation;
pub mod scheduler;

// 重导出核心引擎
pub use advisor::{ContentRiskAdvisor, HeuristicClassifier, RiskClassifier};
pub use auto_pause::{AutoPauseGuard, ResumeError};
pub use entitlement::{EntitlementViolation, PlanEntitlementGate, PLAN_MATRIX_VERSION};
pub use quota::{QuotaGuard, RejectReason, ReserveDecision};
pub use reputation::ReputationTracker;
pub use scheduler::{DayRollover, WarmupScheduler};
