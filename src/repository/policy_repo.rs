// ==========================================
// 邮件预热引擎 - 预热策略仓储
// ==========================================
// 职责: warmup_policy 表的读取与默认值种子
// 归属: 策略由套餐/授权系统拥有，引擎只读
// 红线: 策略缺失必须显式报错 (NotFound -> PolicyNotFound)，
//       静默回退猜测的默认值会导致信誉保护失真
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::policy::WarmupPolicy;
use crate::domain::types::{EntityKind, PlanTier};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// WarmupPolicyRepository - 预热策略仓储
// ==========================================
pub struct WarmupPolicyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WarmupPolicyRepository {
    /// 创建新的仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查找 (plan, entity_kind) 的策略
    ///
    /// # 返回
    /// - Err(NotFound): 配置缺失 (API 层转换为 PolicyNotFound，响亮失败)
    pub fn find(&self, plan: PlanTier, kind: EntityKind) -> RepositoryResult<WarmupPolicy> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT start_volume, ramp_increment, warmup_length, weekend_sending,
                   auto_pause_bounce_rate_pct, auto_pause_spam_rate_pct,
                   auto_pause_spam_count, cooldown_resets_warmup
            FROM warmup_policy
            WHERE plan = ?1 AND entity_kind = ?2
            "#,
            params![plan.as_str(), kind.as_str()],
            |row| {
                Ok(WarmupPolicy {
                    plan,
                    entity_kind: kind,
                    start_volume: row.get("start_volume")?,
                    ramp_increment: row.get("ramp_increment")?,
                    warmup_length: row.get("warmup_length")?,
                    weekend_sending: row.get("weekend_sending")?,
                    auto_pause_bounce_rate_pct: row.get("auto_pause_bounce_rate_pct")?,
                    auto_pause_spam_rate_pct: row.get("auto_pause_spam_rate_pct")?,
                    auto_pause_spam_count: row.get("auto_pause_spam_count")?,
                    cooldown_resets_warmup: row.get("cooldown_resets_warmup")?,
                })
            },
        );

        match result {
            Ok(policy) => Ok(policy),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepositoryError::NotFound {
                entity: "WarmupPolicy".to_string(),
                id: format!("{}/{}", plan, kind),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入策略 (upsert, 套餐系统初始化用)
    pub fn upsert(&self, policy: &WarmupPolicy) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO warmup_policy (
                plan, entity_kind, start_volume, ramp_increment, warmup_length,
                weekend_sending, auto_pause_bounce_rate_pct, auto_pause_spam_rate_pct,
                auto_pause_spam_count, cooldown_resets_warmup
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                policy.plan.as_str(),
                policy.entity_kind.as_str(),
                policy.start_volume,
                policy.ramp_increment,
                policy.warmup_length,
                policy.weekend_sending,
                policy.auto_pause_bounce_rate_pct,
                policy.auto_pause_spam_rate_pct,
                policy.auto_pause_spam_count,
                policy.cooldown_resets_warmup,
            ],
        )?;
        Ok(())
    }

    /// 种子默认策略 (全部套餐 x 两类实体)
    ///
    /// 默认值与观测产品一致: 域名 15 天 / 0.2% 垃圾率，账号 30 天 / 3 次投诉
    pub fn seed_defaults(&self) -> RepositoryResult<()> {
        let plans = [
            PlanTier::Free,
            PlanTier::Premium,
            PlanTier::Pro,
            PlanTier::Enterprise,
            PlanTier::EnterpriseInternal,
        ];
        for plan in plans {
            self.upsert(&WarmupPolicy::default_for_domain(plan))?;
            self.upsert(&WarmupPolicy::default_for_account(plan))?;
        }
        Ok(())
    }
}
