// ==========================================
// 邮件预热引擎 - 暂停转换审计记录
// ==========================================
// pause_record 仅追加日志:
// - 每次 暂停/恢复 转换一条，携带触发时刻的指标快照
// - 用途: 审计 + 恢复覆核 (自动暂停的恢复必须指标回落)
// ==========================================

use crate::domain::outcome::ReputationSnapshot;
use crate::domain::types::{PauseAction, PauseKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// PauseRecord - 暂停/恢复转换记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseRecord {
    pub record_id: String,
    pub entity_id: String,
    pub action: PauseAction,
    pub kind: PauseKind,
    /// 可解释原因 (自动暂停时为触发指标描述)
    pub reason: String,

    // ===== 触发时刻的指标快照 =====
    pub bounce_rate_pct: f64,
    pub spam_rate_pct: f64,
    pub spam_count: i64,
    pub health_score: i64,

    pub created_at: DateTime<Utc>,
}

impl PauseRecord {
    /// 从信誉快照构造转换记录
    pub fn from_snapshot(
        entity_id: &str,
        action: PauseAction,
        kind: PauseKind,
        reason: String,
        snapshot: &ReputationSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            entity_id: entity_id.to_string(),
            action,
            kind,
            reason,
            bounce_rate_pct: snapshot.bounce_rate_pct,
            spam_rate_pct: snapshot.spam_rate_pct,
            spam_count: snapshot.spam_count,
            health_score: snapshot.health_score,
            created_at: now,
        }
    }
}
