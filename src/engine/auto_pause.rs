// ==========================================
// 邮件预热引擎 - 自动暂停守护引擎
// ==========================================
// 职责: 阈值评估 + 暂停/恢复状态机
// 规则:
// - 每次 record_outcome 后在同一实体锁内评估 (无轮询窗口)
// - 触发条件 (任一命中):
//   退信率 > auto_pause_bounce_rate_pct
//   垃圾率 > auto_pause_spam_rate_pct (配置时)
//   投诉数 >= auto_pause_spam_count (配置时, 达到即触发)
// - 自动暂停的恢复必须覆核: 指标仍超阈值则拒绝 (不允许静默绕过)
// - 手动暂停不覆盖已有的自动暂停 (不改写类别标签)
// - 每次转换写一条 pause_record，携带触发时刻指标快照
// ==========================================

use crate::domain::entity::SendingEntity;
use crate::domain::outcome::ReputationSnapshot;
use crate::domain::pause::PauseRecord;
use crate::domain::policy::WarmupPolicy;
use crate::domain::types::{PauseAction, PauseKind, WarmupStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

// ==========================================
// ResumeError - 恢复拒绝
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResumeError {
    #[error("实体未处于暂停状态，无法恢复")]
    NotPaused,

    #[error(
        "指标仍超阈值，拒绝恢复: 退信率 {bounce_rate_pct:.2}%, 垃圾率 {spam_rate_pct:.2}%, 投诉数 {spam_count}"
    )]
    StillOverThreshold {
        bounce_rate_pct: f64,
        spam_rate_pct: f64,
        spam_count: i64,
    },
}

// ==========================================
// AutoPauseGuard - 自动暂停守护引擎
// ==========================================
pub struct AutoPauseGuard {
    // 无状态引擎，状态机作用于调用方持锁的实体
}

impl AutoPauseGuard {
    pub fn new() -> Self {
        Self {}
    }

    /// 命中的触发描述; None 表示全部指标在阈值内
    fn trigger_reason(policy: &WarmupPolicy, snapshot: &ReputationSnapshot) -> Option<String> {
        if snapshot.bounce_rate_pct > policy.auto_pause_bounce_rate_pct {
            return Some(format!(
                "检测到高退信率: {:.1}% (阈值 {:.1}%)",
                snapshot.bounce_rate_pct, policy.auto_pause_bounce_rate_pct
            ));
        }
        if let Some(threshold) = policy.auto_pause_spam_rate_pct {
            if snapshot.spam_rate_pct > threshold {
                return Some(format!(
                    "检测到高垃圾投诉率: {:.2}% (阈值 {:.2}%)",
                    snapshot.spam_rate_pct, threshold
                ));
            }
        }
        if let Some(threshold) = policy.auto_pause_spam_count {
            if snapshot.spam_count >= threshold {
                return Some(format!(
                    "垃圾投诉数达到上限: {} (阈值 {})",
                    snapshot.spam_count, threshold
                ));
            }
        }
        None
    }

    /// record_outcome 后的阈值评估
    ///
    /// 调用方持有实体锁，snapshot 必须是累加后的新鲜快照
    ///
    /// # 返回
    /// - Some(record): 本次触发了自动暂停，记录待持久化
    /// - None: 阈值内，或实体已处于暂停态 (不重复触发)
    pub fn evaluate_after_outcome(
        &self,
        entity: &mut SendingEntity,
        policy: &WarmupPolicy,
        snapshot: &ReputationSnapshot,
        now: DateTime<Utc>,
    ) -> Option<PauseRecord> {
        if entity.is_paused {
            return None;
        }

        let reason = Self::trigger_reason(policy, snapshot)?;

        entity.is_paused = true;
        entity.pause_kind = PauseKind::Auto;
        entity.pause_reason = Some(reason.clone());
        if entity.warmup_status == WarmupStatus::Active {
            entity.warmup_status = WarmupStatus::Paused;
        }
        entity.updated_at = now;

        tracing::warn!(
            entity_id = %entity.entity_id,
            bounce_rate_pct = snapshot.bounce_rate_pct,
            spam_rate_pct = snapshot.spam_rate_pct,
            spam_count = snapshot.spam_count,
            %reason,
            "阈值触发，实体自动暂停"
        );

        Some(PauseRecord::from_snapshot(
            &entity.entity_id,
            PauseAction::Pause,
            PauseKind::Auto,
            reason,
            snapshot,
            now,
        ))
    }

    /// 手动暂停
    ///
    /// # 返回
    /// - Some(record): 完成暂停转换
    /// - None: 已处于暂停态 (自动暂停不被改写为手动，幂等无操作)
    pub fn manual_pause(
        &self,
        entity: &mut SendingEntity,
        reason: String,
        snapshot: &ReputationSnapshot,
        now: DateTime<Utc>,
    ) -> Option<PauseRecord> {
        if entity.is_paused {
            tracing::warn!(
                entity_id = %entity.entity_id,
                existing_kind = %entity.pause_kind,
                "实体已处于暂停态，手动暂停无操作"
            );
            return None;
        }

        entity.is_paused = true;
        entity.pause_kind = PauseKind::Manual;
        entity.pause_reason = Some(reason.clone());
        if entity.warmup_status == WarmupStatus::Active {
            entity.warmup_status = WarmupStatus::Paused;
        }
        entity.updated_at = now;

        Some(PauseRecord::from_snapshot(
            &entity.entity_id,
            PauseAction::Pause,
            PauseKind::Manual,
            reason,
            snapshot,
            now,
        ))
    }

    /// 恢复 (手动与自动暂停共用入口)
    ///
    /// 自动暂停的恢复必须覆核: 触发指标仍超阈值则拒绝
    ///
    /// # 返回
    /// 恢复转换记录 (调用方持久化)
    pub fn resume(
        &self,
        entity: &mut SendingEntity,
        policy: &WarmupPolicy,
        snapshot: &ReputationSnapshot,
        now: DateTime<Utc>,
    ) -> Result<PauseRecord, ResumeError> {
        if !entity.is_paused {
            return Err(ResumeError::NotPaused);
        }

        let resumed_kind = entity.pause_kind;

        // 自动暂停: 指标覆核
        if resumed_kind == PauseKind::Auto {
            if Self::trigger_reason(policy, snapshot).is_some() {
                return Err(ResumeError::StillOverThreshold {
                    bounce_rate_pct: snapshot.bounce_rate_pct,
                    spam_rate_pct: snapshot.spam_rate_pct,
                    spam_count: snapshot.spam_count,
                });
            }

            // 冷却策略: 恢复后重置预热进度，从头爬坡
            if policy.cooldown_resets_warmup {
                entity.warmup_day = 0;
                entity.daily_limit = policy.start_volume;
                tracing::info!(
                    entity_id = %entity.entity_id,
                    "冷却策略生效，预热进度重置"
                );
            }
        }

        entity.is_paused = false;
        entity.pause_kind = PauseKind::None;
        entity.pause_reason = None;
        // 暂停时只有 ACTIVE 会被置为 PAUSED，COMPLETED 实体保持不变
        if entity.warmup_status == WarmupStatus::Paused {
            entity.warmup_status = WarmupStatus::Active;
        }
        entity.updated_at = now;

        tracing::info!(
            entity_id = %entity.entity_id,
            kind = %resumed_kind,
            "实体恢复发送"
        );

        Ok(PauseRecord::from_snapshot(
            &entity.entity_id,
            PauseAction::Resume,
            resumed_kind,
            "恢复发送".to_string(),
            snapshot,
            now,
        ))
    }
}

impl Default for AutoPauseGuard {
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
    use crate::domain::types::{EntityKind, OutcomeKind, PlanTier, SendMode};
    use crate::engine::reputation::ReputationTracker;
    use chrono::Utc;

    fn create_test_entity(kind: EntityKind) -> SendingEntity {
        let mut entity = SendingEntity::new(
            "e1".to_string(),
            "u1".to_string(),
            "example.com".to_string(),
            kind,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
            10,
            Utc::now(),
        );
        entity.warmup_status = WarmupStatus::Active;
        entity
    }

    fn apply_outcomes(entity: &mut SendingEntity, kind: OutcomeKind, count: usize) {
        let tracker = ReputationTracker::new();
        for _ in 0..count {
            tracker.apply_outcome(entity, kind);
        }
    }

    #[test]
    fn test_bounce_rate_over_threshold_triggers_pause() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        // 95 成功 + 5 退信 = 5.0% > 4.0%
        apply_outcomes(&mut entity, OutcomeKind::Delivered, 95);
        apply_outcomes(&mut entity, OutcomeKind::Bounced, 5);
        let snapshot = tracker.snapshot(&entity);

        let record = guard
            .evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now())
            .expect("应触发自动暂停");

        assert!(entity.is_paused);
        assert_eq!(entity.pause_kind, PauseKind::Auto);
        assert_eq!(entity.warmup_status, WarmupStatus::Paused);
        assert_eq!(record.action, PauseAction::Pause);
        assert_eq!(record.kind, PauseKind::Auto);
        assert!(record.reason.contains("退信率"));
        assert!((record.bounce_rate_pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_within_threshold_no_pause() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        // 96 成功 + 4 退信 = 恰好 4.0%，不触发 (严格大于)
        apply_outcomes(&mut entity, OutcomeKind::Delivered, 96);
        apply_outcomes(&mut entity, OutcomeKind::Bounced, 4);
        let snapshot = tracker.snapshot(&entity);

        let record = guard.evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now());
        assert!(record.is_none());
        assert!(!entity.is_paused);
    }

    #[test]
    fn test_spam_count_threshold_triggers_pause() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_account(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Account);

        // 投诉数达到 3: 触发 (比率口径不适用于账号默认策略)
        apply_outcomes(&mut entity, OutcomeKind::Delivered, 2000);
        apply_outcomes(&mut entity, OutcomeKind::SpamComplaint, 3);
        let snapshot = tracker.snapshot(&entity);

        let record = guard
            .evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now())
            .expect("应触发自动暂停");
        assert!(record.reason.contains("投诉数"));
    }

    #[test]
    fn test_already_paused_no_duplicate_trigger() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        apply_outcomes(&mut entity, OutcomeKind::Bounced, 10);
        let snapshot = tracker.snapshot(&entity);

        assert!(guard
            .evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now())
            .is_some());
        // 再次评估: 已暂停，不再产生记录
        assert!(guard
            .evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now())
            .is_none());
    }

    #[test]
    fn test_manual_pause_does_not_relabel_auto() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        apply_outcomes(&mut entity, OutcomeKind::Bounced, 10);
        let snapshot = tracker.snapshot(&entity);
        guard.evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now());
        assert_eq!(entity.pause_kind, PauseKind::Auto);

        // 自动暂停之上的手动暂停: 无操作，类别不被改写
        let record = guard.manual_pause(&mut entity, "人工检查".to_string(), &snapshot, Utc::now());
        assert!(record.is_none());
        assert_eq!(entity.pause_kind, PauseKind::Auto);
    }

    #[test]
    fn test_resume_rejected_while_over_threshold() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        apply_outcomes(&mut entity, OutcomeKind::Delivered, 90);
        apply_outcomes(&mut entity, OutcomeKind::Bounced, 10);
        let snapshot = tracker.snapshot(&entity);
        guard.evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now());

        // 指标未回落: 拒绝恢复
        let err = guard
            .resume(&mut entity, &policy, &snapshot, Utc::now())
            .expect_err("指标超阈值应拒绝恢复");
        assert!(matches!(err, ResumeError::StillOverThreshold { .. }));
        assert!(entity.is_paused);

        // 大量成功投递稀释退信率后: 允许恢复
        apply_outcomes(&mut entity, OutcomeKind::Delivered, 400);
        let recovered = tracker.snapshot(&entity);
        assert!(recovered.bounce_rate_pct < policy.auto_pause_bounce_rate_pct);

        let record = guard
            .resume(&mut entity, &policy, &recovered, Utc::now())
            .expect("指标回落后应允许恢复");
        assert!(!entity.is_paused);
        assert_eq!(entity.pause_kind, PauseKind::None);
        assert_eq!(entity.warmup_status, WarmupStatus::Active);
        assert_eq!(record.action, PauseAction::Resume);
        assert_eq!(record.kind, PauseKind::Auto);
    }

    #[test]
    fn test_resume_manual_pause_no_metric_check() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);

        let snapshot = tracker.snapshot(&entity);
        guard.manual_pause(&mut entity, "维护窗口".to_string(), &snapshot, Utc::now());
        assert_eq!(entity.pause_kind, PauseKind::Manual);

        // 手动暂停的恢复不做指标覆核
        let record = guard
            .resume(&mut entity, &policy, &snapshot, Utc::now())
            .expect("手动暂停应直接恢复");
        assert!(!entity.is_paused);
        assert_eq!(record.kind, PauseKind::Manual);
    }

    #[test]
    fn test_resume_not_paused_rejected() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        let mut entity = create_test_entity(EntityKind::Domain);
        let snapshot = tracker.snapshot(&entity);

        let err = guard
            .resume(&mut entity, &policy, &snapshot, Utc::now())
            .expect_err("未暂停的实体不能恢复");
        assert_eq!(err, ResumeError::NotPaused);
    }

    #[test]
    fn test_cooldown_resets_warmup_progress() {
        let guard = AutoPauseGuard::new();
        let tracker = ReputationTracker::new();
        let mut policy = WarmupPolicy::default_for_domain(PlanTier::Pro);
        policy.cooldown_resets_warmup = true;

        let mut entity = create_test_entity(EntityKind::Domain);
        entity.warmup_day = 8;
        entity.daily_limit = 50;

        apply_outcomes(&mut entity, OutcomeKind::Delivered, 90);
        apply_outcomes(&mut entity, OutcomeKind::Bounced, 10);
        let snapshot = tracker.snapshot(&entity);
        guard.evaluate_after_outcome(&mut entity, &policy, &snapshot, Utc::now());

        apply_outcomes(&mut entity, OutcomeKind::Delivered, 400);
        let recovered = tracker.snapshot(&entity);
        guard
            .resume(&mut entity, &policy, &recovered, Utc::now())
            .expect("指标回落后应允许恢复");

        // 冷却重置: 进度归零，从起始额度重新爬坡
        assert_eq!(entity.warmup_day, 0);
        assert_eq!(entity.daily_limit, policy.start_volume);
        assert_eq!(entity.warmup_status, WarmupStatus::Active);
    }
}
