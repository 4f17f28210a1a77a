// ==========================================
// 邮件预热引擎 - API 层
// ==========================================
// 业务接口层: 组合仓储与引擎，承载并发控制
// ==========================================

pub mod dto;
pub mod error;
pub mod warmup_api;

// 重导出核心接口
pub use dto::{DashboardStats, EntityStatusView, OutcomeApplied, ReserveOutcome};
pub use error::{ApiError, ApiResult};
pub use warmup_api::WarmupApi;
