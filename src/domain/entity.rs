// ==========================================
// 邮件预热引擎 - 发送实体
// ==========================================
// sending_entity 是唯一事实层:
// - 每日配额字段 (daily_limit / sent_today / last_computed_day)
// - 预热进度 (warmup_day / warmup_status)
// - 暂停状态 (is_paused / pause_kind / pause_reason)
// - 累计计数器 (反规范化，与 outcome_event 事务一致)
// 不变式: sent_today <= daily_limit 恒成立;
//         warmup_day 单调不减 (仅冷却重置策略例外)
// ==========================================

use crate::domain::types::{
    EntityKind, PauseKind, PlanTier, Provider, SendMode, WarmupStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// SendingEntity - 发送实体 (域名 或 账号)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendingEntity {
    pub entity_id: String,
    pub user_id: String,
    /// 域名 (kind=DOMAIN) 或 发信地址 (kind=ACCOUNT)
    pub address: String,
    pub kind: EntityKind,
    pub mode: SendMode,
    /// 仅账号类实体携带
    pub provider: Option<Provider>,
    pub plan: PlanTier,

    // ===== 预热进度 =====
    pub warmup_status: WarmupStatus,
    pub warmup_day: i64,

    // ===== 每日配额 =====
    pub daily_limit: i64,
    pub sent_today: i64,
    /// 最近一次日界重算的 UTC 日期 (CAS 字段，与配额预留同一互斥域)
    pub last_computed_day: Option<NaiveDate>,

    // ===== 信誉 =====
    pub health_score: i64,

    // ===== 暂停状态 =====
    pub is_paused: bool,
    pub pause_kind: PauseKind,
    pub pause_reason: Option<String>,

    // ===== 投递前提 =====
    pub is_verified: bool,

    // ===== 累计计数器 =====
    pub total_sent: i64,
    pub total_delivered: i64,
    pub total_bounced: i64,
    pub total_spam_complaints: i64,
    pub total_replies: i64,
    pub total_opens: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SendingEntity {
    /// 创建新实体 (注册时刻, 预热未启动)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_id: String,
        user_id: String,
        address: String,
        kind: EntityKind,
        mode: SendMode,
        provider: Option<Provider>,
        plan: PlanTier,
        start_volume: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id,
            user_id,
            address,
            kind,
            mode,
            provider,
            plan,
            warmup_status: WarmupStatus::Inactive,
            warmup_day: 0,
            daily_limit: start_volume,
            sent_today: 0,
            last_computed_day: None,
            health_score: 100,
            is_paused: false,
            pause_kind: PauseKind::None,
            pause_reason: None,
            is_verified: false,
            total_sent: 0,
            total_delivered: 0,
            total_bounced: 0,
            total_spam_complaints: 0,
            total_replies: 0,
            total_opens: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 今日剩余配额
    pub fn remaining_today(&self) -> i64 {
        (self.daily_limit - self.sent_today).max(0)
    }

    /// 预热是否已完成 (配额视同 active)
    pub fn warmup_completed(&self) -> bool {
        self.warmup_status == WarmupStatus::Completed
    }
}
