// ==========================================
// 邮件预热引擎 - 发送实体仓储
// ==========================================
// 职责: 管理 sending_entity 表的 CRUD 操作
// 红线: 不含业务逻辑，只负责数据访问
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::SendingEntity;
use crate::domain::types::{EntityKind, PauseKind, PlanTier, Provider, SendMode, WarmupStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SendingEntityRepository - 发送实体仓储
// ==========================================
pub struct SendingEntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SendingEntityRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入新实体
    pub fn insert(&self, entity: &SendingEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sending_entity (
                entity_id, user_id, address, kind, mode, provider, plan,
                warmup_status, warmup_day, daily_limit, sent_today, last_computed_day,
                health_score, is_paused, pause_kind, pause_reason, is_verified,
                total_sent, total_delivered, total_bounced, total_spam_complaints,
                total_replies, total_opens, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
            )
            "#,
            params![
                entity.entity_id,
                entity.user_id,
                entity.address,
                entity.kind.as_str(),
                entity.mode.as_str(),
                entity.provider.map(|p| p.as_str()),
                entity.plan.as_str(),
                entity.warmup_status.as_str(),
                entity.warmup_day,
                entity.daily_limit,
                entity.sent_today,
                entity.last_computed_day,
                entity.health_score,
                entity.is_paused,
                entity.pause_kind.as_str(),
                entity.pause_reason,
                entity.is_verified,
                entity.total_sent,
                entity.total_delivered,
                entity.total_bounced,
                entity.total_spam_complaints,
                entity.total_replies,
                entity.total_opens,
                entity.created_at,
                entity.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查找实体
    pub fn find_by_id(&self, entity_id: &str) -> RepositoryResult<SendingEntity> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM sending_entity WHERE entity_id = ?1", COLUMNS),
            params![entity_id],
            Self::map_row,
        );

        match result {
            Ok(entity) => entity,
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepositoryError::NotFound {
                entity: "SendingEntity".to_string(),
                id: entity_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// 按用户列出所有实体
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<SendingEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sending_entity WHERE user_id = ?1 ORDER BY created_at",
            COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], Self::map_row)?;
        let mut entities = Vec::new();
        for row in rows {
            entities.push(row??);
        }
        Ok(entities)
    }

    /// 统计用户已注册的实体数 (套餐限额检查用)
    pub fn count_by_user(&self, user_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sending_entity WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 全量更新实体 (调用方持有实体互斥锁，整行写回)
    pub fn update(&self, entity: &SendingEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE sending_entity SET
                warmup_status = ?2, warmup_day = ?3,
                daily_limit = ?4, sent_today = ?5, last_computed_day = ?6,
                health_score = ?7, is_paused = ?8, pause_kind = ?9, pause_reason = ?10,
                is_verified = ?11,
                total_sent = ?12, total_delivered = ?13, total_bounced = ?14,
                total_spam_complaints = ?15, total_replies = ?16, total_opens = ?17,
                updated_at = ?18
            WHERE entity_id = ?1
            "#,
            params![
                entity.entity_id,
                entity.warmup_status.as_str(),
                entity.warmup_day,
                entity.daily_limit,
                entity.sent_today,
                entity.last_computed_day,
                entity.health_score,
                entity.is_paused,
                entity.pause_kind.as_str(),
                entity.pause_reason,
                entity.is_verified,
                entity.total_sent,
                entity.total_delivered,
                entity.total_bounced,
                entity.total_spam_complaints,
                entity.total_replies,
                entity.total_opens,
                entity.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SendingEntity".to_string(),
                id: entity.entity_id.clone(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<SendingEntity>> {
        let kind_raw: String = row.get("kind")?;
        let mode_raw: String = row.get("mode")?;
        let provider_raw: Option<String> = row.get("provider")?;
        let plan_raw: String = row.get("plan")?;
        let warmup_status_raw: String = row.get("warmup_status")?;
        let pause_kind_raw: String = row.get("pause_kind")?;
        let last_computed_day: Option<NaiveDate> = row.get("last_computed_day")?;
        let created_at: DateTime<Utc> = row.get("created_at")?;
        let updated_at: DateTime<Utc> = row.get("updated_at")?;

        let entity_id: String = row.get("entity_id")?;
        let user_id: String = row.get("user_id")?;
        let address: String = row.get("address")?;
        let warmup_day: i64 = row.get("warmup_day")?;
        let daily_limit: i64 = row.get("daily_limit")?;
        let sent_today: i64 = row.get("sent_today")?;
        let health_score: i64 = row.get("health_score")?;
        let is_paused: bool = row.get("is_paused")?;
        let pause_reason: Option<String> = row.get("pause_reason")?;
        let is_verified: bool = row.get("is_verified")?;
        let total_sent: i64 = row.get("total_sent")?;
        let total_delivered: i64 = row.get("total_delivered")?;
        let total_bounced: i64 = row.get("total_bounced")?;
        let total_spam_complaints: i64 = row.get("total_spam_complaints")?;
        let total_replies: i64 = row.get("total_replies")?;
        let total_opens: i64 = row.get("total_opens")?;

        Ok(Self::assemble(
            entity_id,
            user_id,
            address,
            kind_raw,
            mode_raw,
            provider_raw,
            plan_raw,
            warmup_status_raw,
            warmup_day,
            daily_limit,
            sent_today,
            last_computed_day,
            health_score,
            is_paused,
            pause_kind_raw,
            pause_reason,
            is_verified,
            total_sent,
            total_delivered,
            total_bounced,
            total_spam_complaints,
            total_replies,
            total_opens,
            created_at,
            updated_at,
        ))
    }

    /// 枚举字段解析失败即数据质量错误，不静默吞掉
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        entity_id: String,
        user_id: String,
        address: String,
        kind_raw: String,
        mode_raw: String,
        provider_raw: Option<String>,
        plan_raw: String,
        warmup_status_raw: String,
        warmup_day: i64,
        daily_limit: i64,
        sent_today: i64,
        last_computed_day: Option<NaiveDate>,
        health_score: i64,
        is_paused: bool,
        pause_kind_raw: String,
        pause_reason: Option<String>,
        is_verified: bool,
        total_sent: i64,
        total_delivered: i64,
        total_bounced: i64,
        total_spam_complaints: i64,
        total_replies: i64,
        total_opens: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<SendingEntity> {
        let kind = EntityKind::parse(&kind_raw).ok_or_else(|| field_error("kind", &kind_raw))?;
        let mode = SendMode::parse(&mode_raw).ok_or_else(|| field_error("mode", &mode_raw))?;
        let provider = match provider_raw {
            Some(raw) => Some(Provider::parse(&raw).ok_or_else(|| field_error("provider", &raw))?),
            None => None,
        };
        let plan = PlanTier::parse(&plan_raw).ok_or_else(|| field_error("plan", &plan_raw))?;
        let warmup_status = WarmupStatus::parse(&warmup_status_raw)
            .ok_or_else(|| field_error("warmup_status", &warmup_status_raw))?;
        let pause_kind = PauseKind::parse(&pause_kind_raw)
            .ok_or_else(|| field_error("pause_kind", &pause_kind_raw))?;

        Ok(SendingEntity {
            entity_id,
            user_id,
            address,
            kind,
            mode,
            provider,
            plan,
            warmup_status,
            warmup_day,
            daily_limit,
            sent_today,
            last_computed_day,
            health_score,
            is_paused,
            pause_kind,
            pause_reason,
            is_verified,
            total_sent,
            total_delivered,
            total_bounced,
            total_spam_complaints,
            total_replies,
            total_opens,
            created_at,
            updated_at,
        })
    }
}

/// SELECT 列清单 (与 map_row 一致)
const COLUMNS: &str = "entity_id, user_id, address, kind, mode, provider, plan, \
    warmup_status, warmup_day, daily_limit, sent_today, last_computed_day, \
    health_score, is_paused, pause_kind, pause_reason, is_verified, \
    total_sent, total_delivered, total_bounced, total_spam_complaints, \
    total_replies, total_opens, created_at, updated_at";

fn field_error(field: &str, value: &str) -> RepositoryError {
    RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("无法解析的枚举值: {}", value),
    }
}
