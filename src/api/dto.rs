// ==========================================
// 邮件预热引擎 - API 层数据传输对象
// ==========================================
// 回包口径: 实体状态视图 + 预留判定 + 结果回执 + 看板聚合
// ==========================================

use crate::domain::entity::SendingEntity;
use crate::domain::outcome::ReputationSnapshot;
use crate::domain::types::{
    EntityKind, HealthStatus, PauseKind, PlanTier, Provider, SendMode, WarmupStatus,
};
use crate::engine::quota::ReserveDecision;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// EntityStatusView - 实体状态视图
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStatusView {
    pub entity_id: String,
    pub user_id: String,
    pub address: String,
    pub kind: EntityKind,
    pub mode: SendMode,
    pub provider: Option<Provider>,
    pub plan: PlanTier,

    pub warmup_status: WarmupStatus,
    pub warmup_day: i64,
    pub warmup_length: i64,

    pub daily_limit: i64,
    pub sent_today: i64,
    pub remaining_today: i64,
    pub last_computed_day: Option<NaiveDate>,

    pub health_score: i64,
    pub health_status: HealthStatus,
    pub bounce_rate_pct: f64,
    pub spam_rate_pct: f64,
    pub delivery_rate_pct: f64,
    pub total_sent: i64,

    pub is_paused: bool,
    pub pause_kind: PauseKind,
    pub pause_reason: Option<String>,
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityStatusView {
    pub fn build(
        entity: &SendingEntity,
        snapshot: &ReputationSnapshot,
        warmup_length: i64,
    ) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            user_id: entity.user_id.clone(),
            address: entity.address.clone(),
            kind: entity.kind,
            mode: entity.mode,
            provider: entity.provider,
            plan: entity.plan,
            warmup_status: entity.warmup_status,
            warmup_day: entity.warmup_day,
            warmup_length,
            daily_limit: entity.daily_limit,
            sent_today: entity.sent_today,
            remaining_today: entity.remaining_today(),
            last_computed_day: entity.last_computed_day,
            health_score: entity.health_score,
            health_status: snapshot.health_status,
            bounce_rate_pct: snapshot.bounce_rate_pct,
            spam_rate_pct: snapshot.spam_rate_pct,
            delivery_rate_pct: snapshot.delivery_rate_pct,
            total_sent: entity.total_sent,
            is_paused: entity.is_paused,
            pause_kind: entity.pause_kind,
            pause_reason: entity.pause_reason.clone(),
            is_verified: entity.is_verified,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

// ==========================================
// ReserveOutcome - 预留判定回包
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveOutcome {
    pub entity_id: String,
    pub granted: bool,
    pub remaining_today: i64,
    /// 机器可读拒绝码 (granted=true 时为 None)
    pub reject_code: Option<String>,
    /// 人类可读拒绝说明
    pub reject_reason: Option<String>,
}

impl ReserveOutcome {
    pub fn from_decision(entity_id: &str, decision: &ReserveDecision) -> Self {
        match decision {
            ReserveDecision::Granted { remaining } => Self {
                entity_id: entity_id.to_string(),
                granted: true,
                remaining_today: *remaining,
                reject_code: None,
                reject_reason: None,
            },
            ReserveDecision::Rejected { reason, remaining } => Self {
                entity_id: entity_id.to_string(),
                granted: false,
                remaining_today: *remaining,
                reject_code: Some(reason.code().to_string()),
                reject_reason: Some(reason.describe()),
            },
        }
    }
}

// ==========================================
// OutcomeApplied - 结果上报回执
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeApplied {
    pub event_id: String,
    /// event_id 已消费过，本次为幂等无操作
    pub duplicate: bool,
    /// 本次是否触发了自动暂停
    pub auto_paused: bool,
    pub snapshot: ReputationSnapshot,
}

// ==========================================
// DashboardStats - 看板聚合
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub user_id: String,
    pub total_entities: i64,
    /// 爬坡中 (ACTIVE) 的实体数
    pub entities_in_warmup: i64,
    pub completed_entities: i64,
    pub paused_entities: i64,
    pub emails_sent_today: i64,
    /// 无实体时为 100
    pub average_health_score: i64,
}
