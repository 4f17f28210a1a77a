// ==========================================
// 邮件预热引擎 - 预热准入 API
// ==========================================
// 业务接口层: 仓储 + 引擎的组合入口
// 并发红线:
// - 每实体一把互斥锁 (锁注册表)，以下两组步骤各自原子:
//   a. 日界检查 -> 额度重算 -> 预留扣减
//   b. 事件落库 -> 计数累加 -> 阈值评估 -> 状态转换
// - 跨实体操作互不阻塞
// 失败语义: 指标/策略读取失败时保持既有暂停状态，只告警不放行恢复
// ==========================================

use crate::api::dto::{DashboardStats, EntityStatusView, OutcomeApplied, ReserveOutcome};
use crate::api::error::{ApiError, ApiResult};
use crate::clock::{Clock, SystemClock};
use crate::domain::assessment::RiskAssessment;
use crate::domain::entity::SendingEntity;
use crate::domain::outcome::OutcomeEvent;
use crate::domain::pause::PauseRecord;
use crate::domain::policy::WarmupPolicy;
use crate::domain::types::{EntityKind, PlanTier, Provider, SendMode, WarmupStatus};
use crate::engine::advisor::ContentRiskAdvisor;
use crate::engine::auto_pause::AutoPauseGuard;
use crate::engine::entitlement::PlanEntitlementGate;
use crate::engine::quota::QuotaGuard;
use crate::engine::reputation::ReputationTracker;
use crate::engine::scheduler::{is_weekend, WarmupScheduler};
use crate::repository::entity_repo::SendingEntityRepository;
use crate::repository::error::RepositoryError;
use crate::repository::outcome_repo::OutcomeEventRepository;
use crate::repository::pause_repo::PauseRecordRepository;
use crate::repository::policy_repo::WarmupPolicyRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// KeyedLockRegistry - 键控锁注册表
// ==========================================
// 按键懒建互斥锁: entity_id 维度串行化实体状态变更，
// user_id 维度串行化注册时的实体数检查与写入
struct KeyedLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLockRegistry {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn hold(lock: &Arc<Mutex<()>>) -> MutexGuard<'_, ()> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ==========================================
// WarmupApi - 预热准入 API
// ==========================================
pub struct WarmupApi {
    entities: SendingEntityRepository,
    outcomes: OutcomeEventRepository,
    pauses: PauseRecordRepository,
    policies: WarmupPolicyRepository,

    scheduler: WarmupScheduler,
    quota: QuotaGuard,
    reputation: ReputationTracker,
    auto_pause: AutoPauseGuard,
    advisor: ContentRiskAdvisor,

    clock: Arc<dyn Clock>,
    entity_locks: KeyedLockRegistry,
    user_locks: KeyedLockRegistry,
}

impl WarmupApi {
    /// 创建 API 实例 (系统时钟 + 内置启发式分类器)
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Self::from_connection(
            Arc::new(Mutex::new(conn)),
            ContentRiskAdvisor::with_default_classifier(),
            Arc::new(SystemClock),
        ))
    }

    /// 从已有连接创建 (测试注入 FixedClock / 桩分类器)
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        advisor: ContentRiskAdvisor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entities: SendingEntityRepository::from_connection(conn.clone()),
            outcomes: OutcomeEventRepository::from_connection(conn.clone()),
            pauses: PauseRecordRepository::from_connection(conn.clone()),
            policies: WarmupPolicyRepository::from_connection(conn),
            scheduler: WarmupScheduler::new(),
            quota: QuotaGuard::new(),
            reputation: ReputationTracker::new(),
            auto_pause: AutoPauseGuard::new(),
            advisor,
            clock,
            entity_locks: KeyedLockRegistry::new(),
            user_locks: KeyedLockRegistry::new(),
        }
    }

    /// 策略查找 (缺失响亮失败)
    fn find_policy(&self, plan: PlanTier, kind: EntityKind) -> ApiResult<WarmupPolicy> {
        self.policies.find(plan, kind).map_err(|e| match e {
            RepositoryError::NotFound { .. } => ApiError::PolicyNotFound { plan, kind },
            other => other.into(),
        })
    }

    // ==========================================
    // 实体注册与生命周期
    // ==========================================

    /// 注册发送实体
    ///
    /// 套餐检查 (实体数上限 + 发送模式授权) 与策略存在性检查前置，
    /// 注册成功即携带第 0 天起始额度，预热处于 INACTIVE
    pub fn register_entity(
        &self,
        user_id: &str,
        address: &str,
        kind: EntityKind,
        mode: SendMode,
        provider: Option<Provider>,
        plan: PlanTier,
    ) -> ApiResult<EntityStatusView> {
        if address.trim().is_empty() {
            return Err(ApiError::ValidationError("address 不能为空".to_string()));
        }
        match kind {
            EntityKind::Account if provider.is_none() => {
                return Err(ApiError::ValidationError(
                    "账号类实体必须指定 provider".to_string(),
                ));
            }
            EntityKind::Domain if provider.is_some() => {
                return Err(ApiError::ValidationError(
                    "域名类实体不携带 provider".to_string(),
                ));
            }
            _ => {}
        }

        // 策略缺失即配置故障，拒绝注册
        let policy = self.find_policy(plan, kind)?;
        let limits = PlanEntitlementGate::limits(plan);

        // 实体数检查与写入在同一用户锁内，并发注册不突破套餐上限
        let lock = self.user_locks.acquire(user_id);
        let _guard = hold(&lock);

        let existing = self.entities.count_by_user(user_id)?;
        PlanEntitlementGate::check_registration(plan, existing, mode)?;

        let now = self.clock.now();
        let today = self.clock.today_utc();
        let mut entity = SendingEntity::new(
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            address.trim().to_string(),
            kind,
            mode,
            provider,
            plan,
            Self::day_start_limit(&policy, limits.daily_ceiling, today),
            now,
        );
        entity.last_computed_day = Some(today);

        self.entities.insert(&entity).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => {
                ApiError::AlreadyExists(format!("address={} 已注册", entity.address))
            }
            other => other.into(),
        })?;

        tracing::info!(
            entity_id = %entity.entity_id,
            user_id,
            address = %entity.address,
            kind = %kind,
            mode = %mode,
            plan = %plan,
            "发送实体注册成功"
        );

        let snapshot = self.reputation.snapshot(&entity);
        Ok(EntityStatusView::build(&entity, &snapshot, policy.warmup_length))
    }

    /// 标记实体通过投递前提验证 (域名 DNS / 账号连通性)
    ///
    /// 幂等: 已验证的实体重复调用无操作
    pub fn verify_entity(&self, entity_id: &str) -> ApiResult<EntityStatusView> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;
        if !entity.is_verified {
            entity.is_verified = true;
            entity.updated_at = self.clock.now();
            self.entities.update(&entity)?;
            tracing::info!(entity_id, "实体通过投递前提验证");
        }

        self.build_view(&entity)
    }

    /// 启动预热 (INACTIVE -> ACTIVE)
    ///
    /// 前置: 实体已验证; 非 INACTIVE 状态拒绝重复启动
    pub fn start_warmup(&self, entity_id: &str) -> ApiResult<EntityStatusView> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;

        if !entity.is_verified {
            return Err(ApiError::NotVerified {
                entity_id: entity_id.to_string(),
            });
        }
        if entity.warmup_status != WarmupStatus::Inactive {
            return Err(ApiError::InvalidStateTransition {
                entity_id: entity_id.to_string(),
                from: entity.warmup_status.to_string(),
                action: "START_WARMUP".to_string(),
            });
        }

        let policy = self.find_policy(entity.plan, entity.kind)?;
        let limits = PlanEntitlementGate::limits(entity.plan);

        let today = self.clock.today_utc();
        entity.warmup_status = WarmupStatus::Active;
        entity.warmup_day = 0;
        entity.daily_limit = Self::day_start_limit(&policy, limits.daily_ceiling, today);
        entity.sent_today = 0;
        entity.last_computed_day = Some(today);
        entity.updated_at = self.clock.now();
        self.entities.update(&entity)?;

        tracing::info!(
            entity_id,
            start_volume = entity.daily_limit,
            warmup_length = policy.warmup_length,
            "预热启动"
        );

        let snapshot = self.reputation.snapshot(&entity);
        Ok(EntityStatusView::build(&entity, &snapshot, policy.warmup_length))
    }

    /// 查询实体状态 (惰性日界翻转后返回)
    pub fn get_status(&self, entity_id: &str) -> ApiResult<EntityStatusView> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;
        let policy = self.find_policy(entity.plan, entity.kind)?;
        let limits = PlanEntitlementGate::limits(entity.plan);

        let rollover = self.scheduler.roll_day(
            &mut entity,
            &policy,
            limits.daily_ceiling,
            self.clock.today_utc(),
        );
        if rollover != crate::engine::scheduler::DayRollover::AlreadyCurrent {
            entity.updated_at = self.clock.now();
            self.entities.update(&entity)?;
        }

        let snapshot = self.reputation.snapshot(&entity);
        Ok(EntityStatusView::build(&entity, &snapshot, policy.warmup_length))
    }

    // ==========================================
    // 发送准入
    // ==========================================

    /// 发送前预留一个额度 (TryReserve)
    ///
    /// 日界翻转 + 额度判定 + 扣减在同一实体锁内完成，
    /// 并发调用恰好放行 daily_limit 次
    pub fn reserve_send(&self, entity_id: &str) -> ApiResult<ReserveOutcome> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;
        let policy = self.find_policy(entity.plan, entity.kind)?;
        let limits = PlanEntitlementGate::limits(entity.plan);

        let today = self.clock.today_utc();
        self.scheduler
            .roll_day(&mut entity, &policy, limits.daily_ceiling, today);

        let decision = self.quota.try_reserve(&mut entity, &policy, today);

        entity.updated_at = self.clock.now();
        self.entities.update(&entity)?;

        let outcome = ReserveOutcome::from_decision(entity_id, &decision);
        tracing::debug!(
            entity_id,
            granted = outcome.granted,
            remaining = outcome.remaining_today,
            reject_code = outcome.reject_code.as_deref().unwrap_or("-"),
            "发送预留判定"
        );
        Ok(outcome)
    }

    // ==========================================
    // 结果反馈
    // ==========================================

    /// 上报投递结果事件
    ///
    /// 幂等: event_id 重复上报返回 duplicate=true，计数不二次累加。
    /// 事件落库 -> 计数累加 -> 阈值评估在同一实体锁内完成，
    /// 自动暂停评估观察到的是累加后的新鲜指标。
    /// 策略读取失败时跳过阈值评估并保留既有暂停状态 (只告警)。
    pub fn record_outcome(&self, event: &OutcomeEvent) -> ApiResult<OutcomeApplied> {
        let lock = self.entity_locks.acquire(&event.entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(&event.entity_id)?;

        let fresh = self.outcomes.insert_if_absent(event)?;
        if !fresh {
            tracing::debug!(
                event_id = %event.event_id,
                entity_id = %event.entity_id,
                "重复事件，幂等跳过"
            );
            let snapshot = self.reputation.snapshot(&entity);
            return Ok(OutcomeApplied {
                event_id: event.event_id.clone(),
                duplicate: true,
                auto_paused: false,
                snapshot,
            });
        }

        self.reputation.apply_outcome(&mut entity, event.kind);
        let snapshot = self.reputation.snapshot(&entity);

        let now = self.clock.now();
        let mut auto_paused = false;
        match self.find_policy(entity.plan, entity.kind) {
            Ok(policy) => {
                if let Some(record) =
                    self.auto_pause
                        .evaluate_after_outcome(&mut entity, &policy, &snapshot, now)
                {
                    self.pauses.insert(&record)?;
                    auto_paused = true;
                }
            }
            Err(e) => {
                // 保持既有状态，不因配置故障误放行或误暂停
                tracing::warn!(
                    entity_id = %entity.entity_id,
                    error = %e,
                    "策略读取失败，跳过本次阈值评估"
                );
            }
        }

        entity.updated_at = now;
        self.entities.update(&entity)?;

        Ok(OutcomeApplied {
            event_id: event.event_id.clone(),
            duplicate: false,
            auto_paused,
            snapshot: self.reputation.snapshot(&entity),
        })
    }

    // ==========================================
    // 暂停与恢复
    // ==========================================

    /// 手动暂停发送
    ///
    /// 已暂停的实体 (含自动暂停) 无操作，不改写暂停类别
    pub fn pause_entity(&self, entity_id: &str, reason: &str) -> ApiResult<EntityStatusView> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;
        let snapshot = self.reputation.snapshot(&entity);

        if let Some(record) =
            self.auto_pause
                .manual_pause(&mut entity, reason.to_string(), &snapshot, self.clock.now())
        {
            self.pauses.insert(&record)?;
            self.entities.update(&entity)?;
            tracing::info!(entity_id, reason, "实体手动暂停");
        }

        self.build_view(&entity)
    }

    /// 恢复发送 (手动与自动暂停共用入口)
    ///
    /// 自动暂停的恢复做指标覆核: 仍超阈值则拒绝并返回当前指标
    pub fn resume_entity(&self, entity_id: &str) -> ApiResult<EntityStatusView> {
        let lock = self.entity_locks.acquire(entity_id);
        let _guard = hold(&lock);

        let mut entity = self.entities.find_by_id(entity_id)?;
        let policy = self.find_policy(entity.plan, entity.kind)?;
        let snapshot = self.reputation.snapshot(&entity);
        let from = entity.warmup_status.to_string();

        let record = self
            .auto_pause
            .resume(&mut entity, &policy, &snapshot, self.clock.now())
            .map_err(|e| ApiError::from_resume_error(e, entity_id, &from))?;

        self.pauses.insert(&record)?;
        self.entities.update(&entity)?;

        let snapshot = self.reputation.snapshot(&entity);
        Ok(EntityStatusView::build(&entity, &snapshot, policy.warmup_length))
    }

    /// 暂停/恢复转换历史 (审计)
    pub fn warmup_history(&self, entity_id: &str) -> ApiResult<Vec<PauseRecord>> {
        // 实体必须存在，空历史与未知实体可区分
        self.entities.find_by_id(entity_id)?;
        Ok(self.pauses.list_by_entity(entity_id)?)
    }

    // ==========================================
    // 内容风险评估
    // ==========================================

    /// 内容风险评估 (仅建议，永不失败)
    pub async fn assess_content(
        &self,
        subject: &str,
        body: &str,
        mode: SendMode,
    ) -> RiskAssessment {
        self.advisor.assess(subject, body, mode).await
    }

    // ==========================================
    // 看板聚合
    // ==========================================

    /// 用户维度的看板统计
    pub fn dashboard_stats(&self, user_id: &str) -> ApiResult<DashboardStats> {
        let entities = self.entities.list_by_user(user_id)?;

        let total = entities.len() as i64;
        let in_warmup = entities
            .iter()
            .filter(|e| e.warmup_status == WarmupStatus::Active)
            .count() as i64;
        let completed = entities
            .iter()
            .filter(|e| e.warmup_status == WarmupStatus::Completed)
            .count() as i64;
        let paused = entities.iter().filter(|e| e.is_paused).count() as i64;
        let sent_today: i64 = entities.iter().map(|e| e.sent_today).sum();
        let average_health = if total == 0 {
            100
        } else {
            entities.iter().map(|e| e.health_score).sum::<i64>() / total
        };

        Ok(DashboardStats {
            user_id: user_id.to_string(),
            total_entities: total,
            entities_in_warmup: in_warmup,
            completed_entities: completed,
            paused_entities: paused,
            emails_sent_today: sent_today,
            average_health_score: average_health,
        })
    }

    // ==========================================
    // 内部工具
    // ==========================================

    /// 注册/启动当日的起始额度
    ///
    /// 日界翻转由调度引擎负责，这里只决定被盖章为"今日已重算"
    /// 那一天的额度: 周末零额度日必须立即生效，起始额度次个工作日可用
    fn day_start_limit(policy: &WarmupPolicy, daily_ceiling: i64, today: NaiveDate) -> i64 {
        if !policy.weekend_sending && is_weekend(today) {
            0
        } else {
            policy.start_volume.min(daily_ceiling)
        }
    }

    fn build_view(&self, entity: &SendingEntity) -> ApiResult<EntityStatusView> {
        let policy = self.find_policy(entity.plan, entity.kind)?;
        let snapshot = self.reputation.snapshot(entity);
        Ok(EntityStatusView::build(entity, &snapshot, policy.warmup_length))
    }
}
