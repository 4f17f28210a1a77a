// ==========================================
// 邮件预热引擎 - 暂停记录仓储
// ==========================================
// 职责: 管理 pause_record 仅追加表
// 用途: 审计追踪 + 暂停/恢复历史查询
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::pause::PauseRecord;
use crate::domain::types::{PauseAction, PauseKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PauseRecordRepository - 暂停记录仓储
// ==========================================
pub struct PauseRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PauseRecordRepository {
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

    /// 追加转换记录
    pub fn insert(&self, record: &PauseRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO pause_record (
                record_id, entity_id, action, kind, reason,
                bounce_rate_pct, spam_rate_pct, spam_count, health_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.record_id,
                record.entity_id,
                record.action.as_str(),
                record.kind.as_str(),
                record.reason,
                record.bounce_rate_pct,
                record.spam_rate_pct,
                record.spam_count,
                record.health_score,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// 按实体列出转换历史 (时间序)
    pub fn list_by_entity(&self, entity_id: &str) -> RepositoryResult<Vec<PauseRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, entity_id, action, kind, reason,
                   bounce_rate_pct, spam_rate_pct, spam_count, health_score, created_at
            FROM pause_record
            WHERE entity_id = ?1
            ORDER BY created_at, rowid
            "#,
        )?;

        let rows = stmt.query_map(params![entity_id], |row| {
            let action_raw: String = row.get("action")?;
            let kind_raw: String = row.get("kind")?;
            let created_at: DateTime<Utc> = row.get("created_at")?;
            Ok((
                row.get::<_, String>("record_id")?,
                row.get::<_, String>("entity_id")?,
                action_raw,
                kind_raw,
                row.get::<_, String>("reason")?,
                row.get::<_, f64>("bounce_rate_pct")?,
                row.get::<_, f64>("spam_rate_pct")?,
                row.get::<_, i64>("spam_count")?,
                row.get::<_, i64>("health_score")?,
                created_at,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                record_id,
                entity_id,
                action_raw,
                kind_raw,
                reason,
                bounce_rate_pct,
                spam_rate_pct,
                spam_count,
                health_score,
                created_at,
            ) = row?;

            let action =
                PauseAction::parse(&action_raw).ok_or_else(|| RepositoryError::FieldValueError {
                    field: "action".to_string(),
                    message: format!("无法解析的枚举值: {}", action_raw),
                })?;
            let kind =
                PauseKind::parse(&kind_raw).ok_or_else(|| RepositoryError::FieldValueError {
                    field: "kind".to_string(),
                    message: format!("无法解析的枚举值: {}", kind_raw),
                })?;

            records.push(PauseRecord {
                record_id,
                entity_id,
                action,
                kind,
                reason,
                bounce_rate_pct,
                spam_rate_pct,
                spam_count,
                health_score,
                created_at,
            });
        }
        Ok(records)
    }
}
