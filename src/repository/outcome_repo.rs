// ==========================================
// 邮件预热引擎 - 投递结果事件仓储
// ==========================================
// 职责: 管理 outcome_event 仅追加表
// 幂等保障: event_id 主键 + INSERT OR IGNORE，
//           重复事件在这里被拦截，计数器不二次累加
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::outcome::OutcomeEvent;
use crate::domain::types::OutcomeKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// OutcomeEventRepository - 投递结果事件仓储
// ==========================================
pub struct OutcomeEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OutcomeEventRepository {
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

    /// 幂等插入事件
    ///
    /// # 返回
    /// - Ok(true): 首次插入，事件应被消费
    /// - Ok(false): event_id 已存在，重复上报，调用方跳过计数
    pub fn insert_if_absent(&self, event: &OutcomeEvent) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            INSERT OR IGNORE INTO outcome_event (
                event_id, entity_id, campaign_id, kind, occurred_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                event.event_id,
                event.entity_id,
                event.campaign_id,
                event.kind.as_str(),
                event.occurred_at,
            ],
        )?;
        Ok(affected > 0)
    }

    /// 按实体列出事件 (上报顺序)
    pub fn list_by_entity(&self, entity_id: &str) -> RepositoryResult<Vec<OutcomeEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, entity_id, campaign_id, kind, occurred_at
            FROM outcome_event
            WHERE entity_id = ?1
            ORDER BY occurred_at, event_id
            "#,
        )?;

        let rows = stmt.query_map(params![entity_id], |row| {
            let kind_raw: String = row.get("kind")?;
            let occurred_at: DateTime<Utc> = row.get("occurred_at")?;
            Ok((
                row.get::<_, String>("event_id")?,
                row.get::<_, String>("entity_id")?,
                row.get::<_, String>("campaign_id")?,
                kind_raw,
                occurred_at,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (event_id, entity_id, campaign_id, kind_raw, occurred_at) = row?;
            let kind = OutcomeKind::parse(&kind_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "kind".to_string(),
                    message: format!("无法解析的枚举值: {}", kind_raw),
                }
            })?;
            events.push(OutcomeEvent {
                event_id,
                entity_id,
                campaign_id,
                kind,
                occurred_at,
            });
        }
        Ok(events)
    }

    /// 按实体统计事件总数
    pub fn count_by_entity(&self, entity_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM outcome_event WHERE entity_id = ?1",
            params![entity_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
