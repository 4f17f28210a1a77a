// ==========================================
// 邮件预热引擎 - 套餐授权引擎
// ==========================================
// 职责: 套餐功能矩阵的唯一事实源
// 红线: 套餐差异只在这张映射表里，不散落条件判断;
//       注册与模式检查都经由本引擎
// ==========================================

use crate::domain::policy::PlanLimits;
use crate::domain::types::{PlanTier, SendMode};
use thiserror::Error;

/// 矩阵版本号 (调整限额时递增，审计日志引用)
pub const PLAN_MATRIX_VERSION: i32 = 1;

// ==========================================
// EntitlementViolation - 授权拒绝
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntitlementViolation {
    #[error("套餐实体数已达上限: {max} (当前 {current})")]
    EntityLimitReached { max: i64, current: i64 },

    #[error("套餐不允许发送模式: {mode}")]
    ModeNotAllowed { mode: SendMode },
}

// ==========================================
// PlanEntitlementGate - 套餐授权引擎 (纯函数)
// ==========================================
pub struct PlanEntitlementGate;

impl PlanEntitlementGate {
    /// 套餐功能矩阵
    pub fn limits(plan: PlanTier) -> PlanLimits {
        match plan {
            PlanTier::Free => PlanLimits {
                plan,
                max_entities: 1,
                daily_ceiling: 20,
                allowed_modes: vec![SendMode::ColdOutreach],
            },
            PlanTier::Premium => PlanLimits {
                plan,
                max_entities: 3,
                daily_ceiling: 150,
                allowed_modes: vec![SendMode::ColdOutreach, SendMode::FounderOutbound],
            },
            PlanTier::Pro => PlanLimits {
                plan,
                max_entities: 10,
                daily_ceiling: 300,
                allowed_modes: vec![
                    SendMode::ColdOutreach,
                    SendMode::FounderOutbound,
                    SendMode::Newsletter,
                ],
            },
            PlanTier::Enterprise => PlanLimits {
                plan,
                max_entities: 50,
                daily_ceiling: 1000,
                allowed_modes: vec![
                    SendMode::ColdOutreach,
                    SendMode::FounderOutbound,
                    SendMode::Newsletter,
                ],
            },
            PlanTier::EnterpriseInternal => PlanLimits {
                plan,
                max_entities: 999,
                daily_ceiling: 10000,
                allowed_modes: vec![
                    SendMode::ColdOutreach,
                    SendMode::FounderOutbound,
                    SendMode::Newsletter,
                ],
            },
        }
    }

    /// 注册前检查: 实体数上限 + 发送模式授权
    pub fn check_registration(
        plan: PlanTier,
        existing_entities: i64,
        mode: SendMode,
    ) -> Result<(), EntitlementViolation> {
        let limits = Self::limits(plan);

        if existing_entities >= limits.max_entities {
            return Err(EntitlementViolation::EntityLimitReached {
                max: limits.max_entities,
                current: existing_entities,
            });
        }
        if !limits.mode_allowed(mode) {
            return Err(EntitlementViolation::ModeNotAllowed { mode });
        }
        Ok(())
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_values() {
        assert_eq!(PlanEntitlementGate::limits(PlanTier::Free).max_entities, 1);
        assert_eq!(PlanEntitlementGate::limits(PlanTier::Free).daily_ceiling, 20);
        assert_eq!(PlanEntitlementGate::limits(PlanTier::Premium).daily_ceiling, 150);
        assert_eq!(PlanEntitlementGate::limits(PlanTier::Pro).daily_ceiling, 300);
        assert_eq!(
            PlanEntitlementGate::limits(PlanTier::Enterprise).daily_ceiling,
            1000
        );
        assert_eq!(
            PlanEntitlementGate::limits(PlanTier::EnterpriseInternal).daily_ceiling,
            10000
        );
    }

    #[test]
    fn test_free_plan_mode_restrictions() {
        let limits = PlanEntitlementGate::limits(PlanTier::Free);
        assert!(limits.mode_allowed(SendMode::ColdOutreach));
        assert!(!limits.mode_allowed(SendMode::FounderOutbound));
        assert!(!limits.mode_allowed(SendMode::Newsletter));

        assert_eq!(
            PlanEntitlementGate::check_registration(PlanTier::Free, 0, SendMode::Newsletter),
            Err(EntitlementViolation::ModeNotAllowed {
                mode: SendMode::Newsletter
            })
        );
    }

    #[test]
    fn test_entity_limit_enforced() {
        assert!(
            PlanEntitlementGate::check_registration(PlanTier::Free, 0, SendMode::ColdOutreach)
                .is_ok()
        );
        assert_eq!(
            PlanEntitlementGate::check_registration(PlanTier::Free, 1, SendMode::ColdOutreach),
            Err(EntitlementViolation::EntityLimitReached { max: 1, current: 1 })
        );
    }

    #[test]
    fn test_premium_founder_outbound_allowed() {
        assert!(PlanEntitlementGate::check_registration(
            PlanTier::Premium,
            2,
            SendMode::FounderOutbound
        )
        .is_ok());
    }
}
