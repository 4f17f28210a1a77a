// ==========================================
// 邮件预热引擎 - 预热调度引擎
// ==========================================
// 职责: 日界翻转 + 当日额度计算
// 规则:
// - 每实体每 UTC 日最多重算一次 (last_computed_day 比对，
//   与配额预留在同一互斥域内执行，并发观察不到"都未翻转")
// - warmup_day 每日最多 +1，停机多日不补偿爬坡 (避免信誉尖峰)
// - 周末 (weekend_sending=false): 当日额度 0 且不计入爬坡
// - warmup_day >= warmup_length: 预热完成，额度为套餐稳态上限
// ==========================================

use crate::domain::entity::SendingEntity;
use crate::domain::policy::WarmupPolicy;
use crate::domain::types::WarmupStatus;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// DayRollover - 日界翻转结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayRollover {
    /// 当日已重算过，无变化
    AlreadyCurrent,
    /// 周末零额度日 (不爬坡)
    WeekendHold,
    /// 预热未启动，额度保持起始值
    InactiveHold,
    /// 暂停中，计数器重置但不爬坡
    PausedHold,
    /// 爬坡 +1 天
    Advanced,
    /// 本次翻转到达预热完成
    Completed,
    /// 此前已完成，额度维持稳态上限
    SteadyState,
}

// ==========================================
// WarmupScheduler - 预热调度引擎
// ==========================================
pub struct WarmupScheduler {
    // 无状态引擎，翻转作用于调用方持锁的实体
}

impl WarmupScheduler {
    pub fn new() -> Self {
        Self {}
    }

    /// 日界翻转 + 当日额度计算
    ///
    /// 调用方必须持有该实体的互斥锁 (与配额预留同一原子步骤)
    ///
    /// # 参数
    /// - `entity`: 发送实体 (原地修改)
    /// - `policy`: 预热策略
    /// - `daily_ceiling`: 套餐稳态日上限 (爬坡封顶值)
    /// - `today`: 显式 UTC 日历日
    ///
    /// # 返回
    /// DayRollover 翻转结果
    pub fn roll_day(
        &self,
        entity: &mut SendingEntity,
        policy: &WarmupPolicy,
        daily_ceiling: i64,
        today: NaiveDate,
    ) -> DayRollover {
        // CAS: 当日已重算则直接返回
        if entity.last_computed_day == Some(today) {
            return DayRollover::AlreadyCurrent;
        }

        entity.last_computed_day = Some(today);
        entity.sent_today = 0;

        // 周末零额度: 不爬坡
        if !policy.weekend_sending && is_weekend(today) {
            entity.daily_limit = 0;
            tracing::debug!(
                entity_id = %entity.entity_id,
                %today,
                "周末零额度日，不计入爬坡"
            );
            return DayRollover::WeekendHold;
        }

        match entity.warmup_status {
            // 未启动: 额度保持起始值，不爬坡
            WarmupStatus::Inactive => {
                entity.daily_limit = policy.start_volume.min(daily_ceiling);
                DayRollover::InactiveHold
            }

            // 已完成: 稳态上限
            WarmupStatus::Completed => {
                entity.daily_limit = daily_ceiling;
                DayRollover::SteadyState
            }

            // 暂停中: 不爬坡，额度按当前进度维持
            WarmupStatus::Paused => {
                entity.daily_limit = self.ramp_limit(entity.warmup_day, policy, daily_ceiling);
                DayRollover::PausedHold
            }

            // 爬坡: 恰好 +1 天，停机多日不补偿
            WarmupStatus::Active => {
                let new_day = (entity.warmup_day + 1).min(policy.warmup_length);
                entity.warmup_day = new_day;

                if new_day >= policy.warmup_length {
                    entity.warmup_status = WarmupStatus::Completed;
                    entity.daily_limit = daily_ceiling;
                    tracing::info!(
                        entity_id = %entity.entity_id,
                        warmup_day = new_day,
                        daily_limit = daily_ceiling,
                        "预热完成，进入稳态"
                    );
                    DayRollover::Completed
                } else {
                    entity.daily_limit = self.ramp_limit(new_day, policy, daily_ceiling);
                    tracing::debug!(
                        entity_id = %entity.entity_id,
                        warmup_day = new_day,
                        daily_limit = entity.daily_limit,
                        "爬坡推进一天"
                    );
                    DayRollover::Advanced
                }
            }
        }
    }

    /// 爬坡额度公式: min(start_volume + ramp_increment * warmup_day, ceiling)
    fn ramp_limit(&self, warmup_day: i64, policy: &WarmupPolicy, daily_ceiling: i64) -> i64 {
        (policy.start_volume + policy.ramp_increment * warmup_day).min(daily_ceiling)
    }
}

impl Default for WarmupScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// UTC 日历日是否周末
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
