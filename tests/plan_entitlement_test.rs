// ==========================================
// 套餐授权与看板集成测试
// ==========================================
// 覆盖: 实体数上限 / 发送模式授权 / 策略缺失响亮失败 / 看板聚合
// ==========================================

mod test_helpers;

use test_helpers::{register_active_domain, report_outcomes, setup};
use warmup_engine::{ApiError, EntityKind, OutcomeKind, PlanTier, Provider, SendMode};

#[test]
fn test_free_plan_entity_limit() {
    let ctx = setup();

    ctx.api
        .register_entity(
            "u1",
            "first.example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Free,
        )
        .expect("第一个实体应注册成功");

    // FREE 套餐只允许 1 个实体
    let err = ctx
        .api
        .register_entity(
            "u1",
            "second.example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Free,
        )
        .expect_err("超出实体上限应被拒绝");
    assert!(matches!(
        err,
        ApiError::PlanLimitExceeded { max: 1, current: 1 }
    ));
}

#[test]
fn test_free_plan_mode_not_allowed() {
    let ctx = setup();

    let err = ctx
        .api
        .register_entity(
            "u1",
            "example.com",
            EntityKind::Domain,
            SendMode::Newsletter,
            None,
            PlanTier::Free,
        )
        .expect_err("FREE 套餐不允许订阅邮件模式");
    assert!(matches!(
        err,
        ApiError::ModeNotAllowed {
            mode: SendMode::Newsletter
        }
    ));
}

#[test]
fn test_concurrent_registration_respects_entity_cap() {
    let ctx = setup();

    // 8 个线程抢注同一用户的 FREE 实体: 恰好 1 个成功
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let api = std::sync::Arc::clone(&ctx.api);
            std::thread::spawn(move || {
                api.register_entity(
                    "u1",
                    &format!("d{}.example.com", i),
                    EntityKind::Domain,
                    SendMode::ColdOutreach,
                    None,
                    PlanTier::Free,
                )
                .is_ok()
            })
        })
        .collect();

    let succeeded = handles
        .into_iter()
        .map(|h| h.join().expect("线程异常"))
        .filter(|ok| *ok)
        .count();
    assert_eq!(succeeded, 1);
}

#[test]
fn test_duplicate_address_rejected() {
    let ctx = setup();

    ctx.api
        .register_entity(
            "u1",
            "example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect("注册失败");

    let err = ctx
        .api
        .register_entity(
            "u1",
            "example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect_err("同一用户重复地址应被拒绝");
    assert!(matches!(err, ApiError::AlreadyExists(_)));
}

#[test]
fn test_provider_validation() {
    let ctx = setup();

    // 账号类实体缺 provider
    let err = ctx
        .api
        .register_entity(
            "u1",
            "sales@example.com",
            EntityKind::Account,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect_err("账号类实体必须携带 provider");
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 域名类实体带 provider
    let err = ctx
        .api
        .register_entity(
            "u1",
            "example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            Some(Provider::Gmail),
            PlanTier::Pro,
        )
        .expect_err("域名类实体不携带 provider");
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_missing_policy_fails_loud() {
    // 不做策略种子: 注册必须响亮失败，不回退默认值
    let dir = tempfile::TempDir::new().expect("创建临时目录失败");
    let db_path = dir.path().join("warmup-test.db");
    let conn = warmup_engine::db::open_and_init(&db_path.to_string_lossy())
        .expect("测试数据库初始化失败");

    let api = warmup_engine::WarmupApi::from_connection(
        std::sync::Arc::new(std::sync::Mutex::new(conn)),
        warmup_engine::engine::ContentRiskAdvisor::with_default_classifier(),
        std::sync::Arc::new(warmup_engine::FixedClock::at_date(test_helpers::monday())),
    );

    let err = api
        .register_entity(
            "u1",
            "example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect_err("策略缺失应拒绝注册");
    assert!(matches!(
        err,
        ApiError::PolicyNotFound {
            plan: PlanTier::Pro,
            kind: EntityKind::Domain
        }
    ));
}

#[test]
fn test_dashboard_stats_aggregation() {
    let ctx = setup();

    let active_id = register_active_domain(&ctx.api, "u1", "a.example.com");
    let paused_id = register_active_domain(&ctx.api, "u1", "b.example.com");
    // 第三个实体保持 INACTIVE
    ctx.api
        .register_entity(
            "u1",
            "c.example.com",
            EntityKind::Domain,
            SendMode::ColdOutreach,
            None,
            PlanTier::Pro,
        )
        .expect("注册失败");

    // 消耗一些额度并触发一个自动暂停
    for _ in 0..3 {
        assert!(ctx.api.reserve_send(&active_id).expect("预留失败").granted);
    }
    report_outcomes(&ctx.api, &paused_id, OutcomeKind::Bounced, 5, "b");

    let stats = ctx.api.dashboard_stats("u1").expect("看板查询失败");
    assert_eq!(stats.total_entities, 3);
    assert_eq!(stats.entities_in_warmup, 1); // active_id
    assert_eq!(stats.paused_entities, 1); // paused_id
    assert_eq!(stats.emails_sent_today, 3);
    assert!(stats.average_health_score < 100); // paused_id 健康分拖低均值

    // 其他用户视角为空
    let stats = ctx.api.dashboard_stats("u2").expect("看板查询失败");
    assert_eq!(stats.total_entities, 0);
    assert_eq!(stats.average_health_score, 100);
}
