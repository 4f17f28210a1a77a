// ==========================================
// 邮件预热引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一 schema 初始化入口 (sending_entity / outcome_event / pause_record / warmup_policy)
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema
///
/// 逻辑存储布局:
/// - sending_entity: 每个发送实体一行 (计数器反规范化在行上维护)
/// - outcome_event: 仅追加表，event_id 为幂等主键
/// - pause_record: 仅追加表，暂停/恢复转换审计日志
/// - warmup_policy: 按 (plan, entity_kind) 的预热策略，引擎只读
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sending_entity (
            entity_id           TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL,
            address             TEXT NOT NULL,
            kind                TEXT NOT NULL,
            mode                TEXT NOT NULL,
            provider            TEXT,
            plan                TEXT NOT NULL,
            warmup_status       TEXT NOT NULL DEFAULT 'INACTIVE',
            warmup_day          INTEGER NOT NULL DEFAULT 0,
            daily_limit         INTEGER NOT NULL DEFAULT 0,
            sent_today          INTEGER NOT NULL DEFAULT 0,
            last_computed_day   TEXT,
            health_score        INTEGER NOT NULL DEFAULT 100,
            is_paused           INTEGER NOT NULL DEFAULT 0,
            pause_kind          TEXT NOT NULL DEFAULT 'NONE',
            pause_reason        TEXT,
            is_verified         INTEGER NOT NULL DEFAULT 0,
            total_sent          INTEGER NOT NULL DEFAULT 0,
            total_delivered     INTEGER NOT NULL DEFAULT 0,
            total_bounced       INTEGER NOT NULL DEFAULT 0,
            total_spam_complaints INTEGER NOT NULL DEFAULT 0,
            total_replies       INTEGER NOT NULL DEFAULT 0,
            total_opens         INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            UNIQUE(user_id, address)
        );

        CREATE TABLE IF NOT EXISTS outcome_event (
            event_id    TEXT PRIMARY KEY,
            entity_id   TEXT NOT NULL REFERENCES sending_entity(entity_id),
            campaign_id TEXT NOT NULL,
            kind        TEXT NOT NULL,
            occurred_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_outcome_event_entity
            ON outcome_event(entity_id, occurred_at);

        CREATE TABLE IF NOT EXISTS pause_record (
            record_id       TEXT PRIMARY KEY,
            entity_id       TEXT NOT NULL REFERENCES sending_entity(entity_id),
            action          TEXT NOT NULL,
            kind            TEXT NOT NULL,
            reason          TEXT NOT NULL,
            bounce_rate_pct REAL NOT NULL,
            spam_rate_pct   REAL NOT NULL,
            spam_count      INTEGER NOT NULL,
            health_score    INTEGER NOT NULL,
            created_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pause_record_entity
            ON pause_record(entity_id, created_at);

        CREATE TABLE IF NOT EXISTS warmup_policy (
            plan                      TEXT NOT NULL,
            entity_kind               TEXT NOT NULL,
            start_volume              INTEGER NOT NULL,
            ramp_increment            INTEGER NOT NULL,
            warmup_length             INTEGER NOT NULL,
            weekend_sending           INTEGER NOT NULL DEFAULT 0,
            auto_pause_bounce_rate_pct REAL NOT NULL,
            auto_pause_spam_rate_pct  REAL,
            auto_pause_spam_count     INTEGER,
            cooldown_resets_warmup    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (plan, entity_kind)
        );
        "#,
    )?;
    Ok(())
}

/// 打开连接并初始化 schema (二进制入口与测试共用)
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}
