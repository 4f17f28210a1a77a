// ==========================================
// 邮件预热引擎 - 预热策略与套餐限额
// ==========================================
// WarmupPolicy: 按 (plan, entity_kind) 的爬坡配置
// - 归属套餐/授权系统，引擎只读
// - 缺失即配置故障 (PolicyNotFound)，绝不静默回退默认值
// PlanLimits: 套餐功能矩阵 (engine::entitlement 提供纯映射)
// ==========================================

use crate::domain::types::{EntityKind, PlanTier, SendMode};
use serde::{Deserialize, Serialize};

// ==========================================
// WarmupPolicy - 预热策略 (不可变配置)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupPolicy {
    pub plan: PlanTier,
    pub entity_kind: EntityKind,

    /// 第 0 天起始额度
    pub start_volume: i64,
    /// 每爬坡一天增加的额度
    pub ramp_increment: i64,
    /// 预热天数 (观测产品: 域名 15 天, 账号 30 天)
    pub warmup_length: i64,
    /// 周末是否发送 (false: 周末额度为 0 且不计入爬坡)
    pub weekend_sending: bool,

    /// 自动暂停: 退信率阈值 (百分比)
    pub auto_pause_bounce_rate_pct: f64,
    /// 自动暂停: 垃圾投诉率阈值 (百分比, 可选)
    pub auto_pause_spam_rate_pct: Option<f64>,
    /// 自动暂停: 垃圾投诉绝对数阈值 (可选)
    pub auto_pause_spam_count: Option<i64>,

    /// 冷却策略: 自动暂停恢复后是否重置预热进度 (开放问题，做成可配置)
    pub cooldown_resets_warmup: bool,
}

impl WarmupPolicy {
    /// 域名默认策略 (15 天爬坡, 0.2% 垃圾率阈值)
    pub fn default_for_domain(plan: PlanTier) -> Self {
        Self {
            plan,
            entity_kind: EntityKind::Domain,
            start_volume: 10,
            ramp_increment: 5,
            warmup_length: 15,
            weekend_sending: false,
            auto_pause_bounce_rate_pct: 4.0,
            auto_pause_spam_rate_pct: Some(0.2),
            auto_pause_spam_count: None,
            cooldown_resets_warmup: false,
        }
    }

    /// 账号默认策略 (30 天爬坡, 绝对投诉数阈值)
    pub fn default_for_account(plan: PlanTier) -> Self {
        Self {
            plan,
            entity_kind: EntityKind::Account,
            start_volume: 5,
            ramp_increment: 2,
            warmup_length: 30,
            weekend_sending: false,
            auto_pause_bounce_rate_pct: 4.0,
            auto_pause_spam_rate_pct: None,
            auto_pause_spam_count: Some(3),
            cooldown_resets_warmup: false,
        }
    }
}

// ==========================================
// PlanLimits - 套餐限额 (纯映射表的值对象)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub plan: PlanTier,
    /// 可注册的发送实体上限
    pub max_entities: i64,
    /// 预热完成后的稳态日发送上限 (也是爬坡封顶值)
    pub daily_ceiling: i64,
    /// 套餐允许的发送模式
    pub allowed_modes: Vec<SendMode>,
}

impl PlanLimits {
    pub fn mode_allowed(&self, mode: SendMode) -> bool {
        self.allowed_modes.contains(&mode)
    }
}
