// ==========================================
// 邮件预热引擎 - 投递结果事件与信誉快照
// ==========================================
// OutcomeEvent: 不可变事实，传输协作方产生，信誉引擎恰好消费一次
// event_id 是幂等键: 重复上报不会二次计数
// ReputationSnapshot: 累计口径的滚动统计 (分子分母口径与阈值一致)
// ==========================================

use crate::domain::types::{HealthStatus, OutcomeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// OutcomeEvent - 投递结果事件 (仅追加)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// 幂等键，由传输方生成
    pub event_id: String,
    pub entity_id: String,
    pub campaign_id: String,
    pub kind: OutcomeKind,
    pub occurred_at: DateTime<Utc>,
}

impl OutcomeEvent {
    pub fn new(
        event_id: String,
        entity_id: String,
        campaign_id: String,
        kind: OutcomeKind,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            entity_id,
            campaign_id,
            kind,
            occurred_at,
        }
    }
}

// ==========================================
// ReputationSnapshot - 信誉快照
// ==========================================
// 累计口径 (total_* 计数器), 每次 record_outcome 同步重算，
// 自动暂停评估永远观察到新鲜数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub entity_id: String,
    pub total_sent: i64,
    pub bounce_rate_pct: f64,
    pub spam_rate_pct: f64,
    pub delivery_rate_pct: f64,
    pub reply_rate_pct: f64,
    pub open_rate_pct: f64,
    pub spam_count: i64,
    pub health_score: i64,
    pub health_status: HealthStatus,
}
