// ==========================================
// 集成测试共享工具
// ==========================================
// 每个测试一个临时 SQLite 数据库 + 固定时钟，
// 日界行为完全确定，不依赖墙钟
// ==========================================
#![allow(dead_code)] // 各测试文件只用到工具子集

use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use warmup_engine::engine::ContentRiskAdvisor;
use warmup_engine::repository::WarmupPolicyRepository;
use warmup_engine::{EntityKind, FixedClock, PlanTier, Provider, SendMode, WarmupApi};

/// 测试上下文: API + 可推进的固定时钟 + 临时库目录
pub struct TestContext {
    pub api: Arc<WarmupApi>,
    pub clock: Arc<FixedClock>,
    _dir: TempDir,
}

/// 默认测试起始日: 2026-03-02 (周一)
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("合法日期")
}

/// 创建测试上下文 (schema 初始化 + 默认策略种子)
pub fn setup() -> TestContext {
    setup_at(monday())
}

pub fn setup_at(date: NaiveDate) -> TestContext {
    warmup_engine::logging::init_test();

    let dir = TempDir::new().expect("创建临时目录失败");
    let db_path = dir.path().join("warmup-test.db");
    let conn = warmup_engine::db::open_and_init(&db_path.to_string_lossy())
        .expect("测试数据库初始化失败");
    let conn = Arc::new(Mutex::new(conn));

    WarmupPolicyRepository::from_connection(conn.clone())
        .seed_defaults()
        .expect("策略种子写入失败");

    let clock = Arc::new(FixedClock::at_date(date));
    let api = WarmupApi::from_connection(
        conn,
        ContentRiskAdvisor::with_default_classifier(),
        clock.clone(),
    );

    TestContext {
        api: Arc::new(api),
        clock,
        _dir: dir,
    }
}

/// 注册 + 验证 + 启动预热，返回 entity_id
pub fn register_active_domain(api: &WarmupApi, user_id: &str, address: &str) -> String {
    let view = api
        .register_entity(
            user_id,
            address,
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect("注册失败");
    api.verify_entity(&view.entity_id).expect("验证失败");
    api.start_warmup(&view.entity_id).expect("启动预热失败");
    view.entity_id
}

/// 注册 + 验证 + 启动一个账号类实体
pub fn register_active_account(api: &WarmupApi, user_id: &str, address: &str) -> String {
    let view = api
        .register_entity(
            user_id,
            address,
            EntityKind::Account,
            SendMode::ColdOutreach,
            Some(Provider::Gmail),
            PlanTier::Pro,
        )
        .expect("注册失败");
    api.verify_entity(&view.entity_id).expect("验证失败");
    api.start_warmup(&view.entity_id).expect("启动预热失败");
    view.entity_id
}

/// 批量上报同类投递结果 (event_id 以前缀区分)
pub fn report_outcomes(
    api: &WarmupApi,
    entity_id: &str,
    kind: warmup_engine::OutcomeKind,
    count: usize,
    id_prefix: &str,
) {
    for i in 0..count {
        let event = warmup_engine::OutcomeEvent::new(
            format!("{}-{}", id_prefix, i),
            entity_id.to_string(),
            "campaign-1".to_string(),
            kind,
            chrono::Utc::now(),
        );
        api.record_outcome(&event).expect("结果上报失败");
    }
}
