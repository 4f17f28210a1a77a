// ==========================================
// 邮件预热引擎 - API 层错误类型
// ==========================================
// 面向调用方的错误口径:
// - 配置缺失响亮失败 (PolicyNotFound)，不静默回退
// - 恢复覆核失败携带当前指标 (可解释拒绝)
// - 仓储错误统一收敛，不向外泄漏 SQL 细节
// ==========================================

use crate::domain::types::{EntityKind, PauseKind, PlanTier, SendMode};
use crate::engine::auto_pause::ResumeError;
use crate::engine::entitlement::EntitlementViolation;
use crate::engine::quota::RejectReason;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
///
/// 配额/暂停类拒绝在预留路径上是一等判定值 (ReserveDecision)，
/// 这里的错误形态供希望以 Result 口径消费的调用方使用
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 资源错误 =====
    #[error("记录未找到: {0}")]
    NotFound(String),

    #[error("记录已存在: {0}")]
    AlreadyExists(String),

    // ===== 准入拒绝 =====
    #[error("当日预热额度已耗尽")]
    QuotaExhausted,

    #[error("实体处于暂停状态 ({kind}): {reason:?}")]
    EntityPaused {
        kind: PauseKind,
        reason: Option<String>,
    },

    // ===== 配置错误 =====
    #[error("预热策略缺失: plan={plan}, kind={kind} (拒绝服务，不回退默认值)")]
    PolicyNotFound { plan: PlanTier, kind: EntityKind },

    // ===== 套餐授权 =====
    #[error("套餐实体数已达上限: {max} (当前 {current})")]
    PlanLimitExceeded { max: i64, current: i64 },

    #[error("套餐不允许发送模式: {mode}")]
    ModeNotAllowed { mode: SendMode },

    // ===== 状态机 =====
    #[error("实体 {entity_id} 未通过验证，不能启动预热")]
    NotVerified { entity_id: String },

    #[error("非法状态转换: 实体 {entity_id} 当前 {from}, 不能执行 {action}")]
    InvalidStateTransition {
        entity_id: String,
        from: String,
        action: String,
    },

    #[error(
        "指标仍超阈值，拒绝恢复: 退信率 {bounce_rate_pct:.2}%, 垃圾率 {spam_rate_pct:.2}%, 投诉数 {spam_count}"
    )]
    ResumeRejectedStillOverThreshold {
        bounce_rate_pct: f64,
        spam_rate_pct: f64,
        spam_count: i64,
    },

    // ===== 输入校验 =====
    #[error("参数校验失败: {0}")]
    ValidationError(String),

    // ===== 基础设施 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 仓储错误收敛
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::AlreadyExists(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("数据质量错误 (field={}): {}", field, message))
            }
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// 恢复覆核失败映射
impl ApiError {
    pub fn from_resume_error(err: ResumeError, entity_id: &str, from: &str) -> Self {
        match err {
            ResumeError::NotPaused => ApiError::InvalidStateTransition {
                entity_id: entity_id.to_string(),
                from: from.to_string(),
                action: "RESUME".to_string(),
            },
            ResumeError::StillOverThreshold {
                bounce_rate_pct,
                spam_rate_pct,
                spam_count,
            } => ApiError::ResumeRejectedStillOverThreshold {
                bounce_rate_pct,
                spam_rate_pct,
                spam_count,
            },
        }
    }
}

// 套餐授权拒绝映射
impl From<EntitlementViolation> for ApiError {
    fn from(err: EntitlementViolation) -> Self {
        match err {
            EntitlementViolation::EntityLimitReached { max, current } => {
                ApiError::PlanLimitExceeded { max, current }
            }
            EntitlementViolation::ModeNotAllowed { mode } => ApiError::ModeNotAllowed { mode },
        }
    }
}

// 预留拒绝的 Result 口径
impl From<RejectReason> for ApiError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::EntityPaused { kind, reason } => ApiError::EntityPaused { kind, reason },
            RejectReason::QuotaExhausted
            | RejectReason::WarmupInactive
            | RejectReason::WarmupDayZeroWeekend => ApiError::QuotaExhausted,
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
