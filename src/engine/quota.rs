// ==========================================
// 邮件预热引擎 - 配额准入引擎
// ==========================================
// 职责: 发送前的 TryReserve 准入判定
// 红线: 检查与扣减在调用方持有的实体锁内完成，
//       并发预留不会突破当日额度 (恰好 limit 次放行)
// 判定顺序: 暂停 > 预热未启动 > 周末零额度 > 额度耗尽
// ==========================================

use crate::domain::entity::SendingEntity;
use crate::domain::policy::WarmupPolicy;
use crate::domain::types::{PauseKind, WarmupStatus};
use crate::engine::scheduler::is_weekend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RejectReason - 预留拒绝原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// 实体处于暂停状态 (自动或手动)
    EntityPaused {
        kind: PauseKind,
        reason: Option<String>,
    },
    /// 预热尚未启动
    WarmupInactive,
    /// 周末零额度日
    WarmupDayZeroWeekend,
    /// 当日额度已耗尽
    QuotaExhausted,
}

impl RejectReason {
    /// 机器可读拒绝码 (回包字段)
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::EntityPaused { .. } => "entity_paused",
            RejectReason::WarmupInactive => "warmup_inactive",
            RejectReason::WarmupDayZeroWeekend => "warmup_day_zero_weekend",
            RejectReason::QuotaExhausted => "quota_exhausted",
        }
    }

    /// 人类可读说明
    pub fn describe(&self) -> String {
        match self {
            RejectReason::EntityPaused { kind, reason } => match reason {
                Some(r) => format!("实体已{}暂停: {}", kind_label(*kind), r),
                None => format!("实体已{}暂停", kind_label(*kind)),
            },
            RejectReason::WarmupInactive => "预热尚未启动，发送被拒绝".to_string(),
            RejectReason::WarmupDayZeroWeekend => "周末零额度日，当日不发送".to_string(),
            RejectReason::QuotaExhausted => "当日预热额度已耗尽".to_string(),
        }
    }
}

fn kind_label(kind: PauseKind) -> &'static str {
    match kind {
        PauseKind::Auto => "自动",
        // is_paused=true 时 kind 不为 NONE
        PauseKind::Manual | PauseKind::None => "手动",
    }
}

// ==========================================
// ReserveDecision - 预留判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReserveDecision {
    /// 放行: sent_today 已 +1
    Granted { remaining: i64 },
    /// 拒绝: 计数器不变
    Rejected { reason: RejectReason, remaining: i64 },
}

impl ReserveDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, ReserveDecision::Granted { .. })
    }
}

// ==========================================
// QuotaGuard - 配额准入引擎
// ==========================================
pub struct QuotaGuard {
    // 无状态引擎，判定作用于调用方持锁的实体
}

impl QuotaGuard {
    pub fn new() -> Self {
        Self {}
    }

    /// 发送前准入判定 (TryReserve)
    ///
    /// 调用方必须已完成当日日界翻转并持有该实体的互斥锁
    ///
    /// # 参数
    /// - `entity`: 发送实体 (放行时原地扣减)
    /// - `policy`: 预热策略 (区分周末零额度与普通耗尽)
    /// - `today`: 显式 UTC 日历日
    ///
    /// # 返回
    /// ReserveDecision 判定结果，放行时 sent_today 已 +1
    pub fn try_reserve(
        &self,
        entity: &mut SendingEntity,
        policy: &WarmupPolicy,
        today: NaiveDate,
    ) -> ReserveDecision {
        // 暂停态: 最高优先拒绝
        if entity.is_paused {
            return ReserveDecision::Rejected {
                reason: RejectReason::EntityPaused {
                    kind: entity.pause_kind,
                    reason: entity.pause_reason.clone(),
                },
                remaining: entity.remaining_today(),
            };
        }

        // 预热未启动: 未进入爬坡计划的实体不放行
        if entity.warmup_status == WarmupStatus::Inactive {
            return ReserveDecision::Rejected {
                reason: RejectReason::WarmupInactive,
                remaining: 0,
            };
        }

        // 周末零额度: 与普通耗尽区分，便于调用方解释
        if entity.daily_limit == 0 && !policy.weekend_sending && is_weekend(today) {
            return ReserveDecision::Rejected {
                reason: RejectReason::WarmupDayZeroWeekend,
                remaining: 0,
            };
        }

        // 额度检查与扣减 (同一锁内，不超卖)
        if entity.sent_today >= entity.daily_limit {
            return ReserveDecision::Rejected {
                reason: RejectReason::QuotaExhausted,
                remaining: 0,
            };
        }

        entity.sent_today += 1;
        ReserveDecision::Granted {
            remaining: entity.remaining_today(),
        }
    }
}

impl Default for QuotaGuard {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{EntityKind, PlanTier, SendMode};
    use chrono::Utc;

    fn create_test_entity() -> SendingEntity {
        let mut entity = SendingEntity::new(
            "e1".to_string(),
            "u1".to_string(),
            "example.com".to_string(),
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
            10,
            Utc::now(),
        );
        entity.warmup_status = WarmupStatus::Active;
        entity.daily_limit = 3;
        entity
    }

    fn create_test_policy() -> WarmupPolicy {
        WarmupPolicy::default_for_domain(PlanTier::Pro)
    }

    fn monday() -> NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_try_reserve_grants_until_limit() {
        let guard = QuotaGuard::new();
        let mut entity = create_test_entity();
        let policy = create_test_policy();

        for expected_remaining in [2, 1, 0] {
            let decision = guard.try_reserve(&mut entity, &policy, monday());
            assert_eq!(
                decision,
                ReserveDecision::Granted {
                    remaining: expected_remaining
                }
            );
        }

        // 第 limit+1 次: 耗尽
        let decision = guard.try_reserve(&mut entity, &policy, monday());
        assert_eq!(
            decision,
            ReserveDecision::Rejected {
                reason: RejectReason::QuotaExhausted,
                remaining: 0
            }
        );
        assert_eq!(entity.sent_today, 3); // 拒绝不扣减
    }

    #[test]
    fn test_try_reserve_rejects_paused() {
        let guard = QuotaGuard::new();
        let mut entity = create_test_entity();
        entity.is_paused = true;
        entity.pause_kind = PauseKind::Auto;
        entity.pause_reason = Some("检测到高退信率: 5.0%".to_string());
        let policy = create_test_policy();

        let decision = guard.try_reserve(&mut entity, &policy, monday());
        match decision {
            ReserveDecision::Rejected {
                reason: RejectReason::EntityPaused { kind, reason },
                ..
            } => {
                assert_eq!(kind, PauseKind::Auto);
                assert!(reason.is_some());
            }
            other => panic!("预期暂停拒绝, 实际: {:?}", other),
        }
        assert_eq!(entity.sent_today, 0);
    }

    #[test]
    fn test_try_reserve_rejects_inactive() {
        let guard = QuotaGuard::new();
        let mut entity = create_test_entity();
        entity.warmup_status = WarmupStatus::Inactive;
        let policy = create_test_policy();

        let decision = guard.try_reserve(&mut entity, &policy, monday());
        assert_eq!(
            decision,
            ReserveDecision::Rejected {
                reason: RejectReason::WarmupInactive,
                remaining: 0
            }
        );
    }

    #[test]
    fn test_try_reserve_weekend_zero_distinct_from_exhausted() {
        let guard = QuotaGuard::new();
        let mut entity = create_test_entity();
        entity.daily_limit = 0;
        let policy = create_test_policy();

        let saturday = chrono::NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let decision = guard.try_reserve(&mut entity, &policy, saturday);
        assert_eq!(
            decision,
            ReserveDecision::Rejected {
                reason: RejectReason::WarmupDayZeroWeekend,
                remaining: 0
            }
        );
    }

    #[test]
    fn test_reject_codes_are_stable() {
        assert_eq!(
            RejectReason::EntityPaused {
                kind: PauseKind::Auto,
                reason: None
            }
            .code(),
            "entity_paused"
        );
        assert_eq!(RejectReason::WarmupInactive.code(), "warmup_inactive");
        assert_eq!(
            RejectReason::WarmupDayZeroWeekend.code(),
            "warmup_day_zero_weekend"
        );
        assert_eq!(RejectReason::QuotaExhausted.code(), "quota_exhausted");
    }
}
