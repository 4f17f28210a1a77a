// ==========================================
// 配额并发控制集成测试
// ==========================================
// 覆盖: N 线程并发预留恰好放行 daily_limit 次; 日界翻转原子性
// ==========================================

mod test_helpers;

use std::sync::Arc;
use std::thread;
use test_helpers::{register_active_domain, setup};

#[test]
fn test_concurrent_reserve_never_oversells() {
    let ctx = setup();
    let entity_id = register_active_domain(&ctx.api, "u1", "example.com");

    // 第 0 天额度 10, 25 个线程抢
    let threads = 25;
    let mut handles = Vec::new();
    for _ in 0..threads {
        let api = Arc::clone(&ctx.api);
        let entity_id = entity_id.clone();
        handles.push(thread::spawn(move || {
            api.reserve_send(&entity_id).expect("预留调用失败").granted
        }));
    }

    let granted = handles
        .into_iter()
        .map(|h| h.join().expect("线程 panic"))
        .filter(|g| *g)
        .count();

    // 恰好 daily_limit 次放行，不多不少
    assert_eq!(granted, 10);

    let view = ctx.api.get_status(&entity_id).expect("查询失败");
    assert_eq!(view.sent_today, 10);
    assert_eq!(view.remaining_today, 0);
}

#[test]
fn test_concurrent_reserve_single_rollover() {
    let ctx = setup();
    let entity_id = register_active_domain(&ctx.api, "u1", "example.com");

    // 耗尽第 0 天额度
    for _ in 0..10 {
        assert!(ctx.api.reserve_send(&entity_id).expect("预留失败").granted);
    }

    // 推进到第 1 天后并发触达: 日界翻转只发生一次，额度 15
    ctx.clock.advance_days(1);
    let threads = 30;
    let mut handles = Vec::new();
    for _ in 0..threads {
        let api = Arc::clone(&ctx.api);
        let entity_id = entity_id.clone();
        handles.push(thread::spawn(move || {
            api.reserve_send(&entity_id).expect("预留调用失败").granted
        }));
    }
    let granted = handles
        .into_iter()
        .map(|h| h.join().expect("线程 panic"))
        .filter(|g| *g)
        .count();

    assert_eq!(granted, 15);

    let view = ctx.api.get_status(&entity_id).expect("查询失败");
    assert_eq!(view.warmup_day, 1); // 并发下仍只推进一天
    assert_eq!(view.sent_today, 15);
}

#[test]
fn test_reserve_rejection_codes() {
    let ctx = setup();
    let entity_id = register_active_domain(&ctx.api, "u1", "example.com");

    for _ in 0..10 {
        assert!(ctx.api.reserve_send(&entity_id).expect("预留失败").granted);
    }

    let outcome = ctx.api.reserve_send(&entity_id).expect("预留调用失败");
    assert!(!outcome.granted);
    assert_eq!(outcome.reject_code.as_deref(), Some("quota_exhausted"));
    assert_eq!(outcome.remaining_today, 0);

    // 周末: 区分于普通耗尽的拒绝码
    ctx.clock.advance_days(5); // 周一 -> 周六
    let outcome = ctx.api.reserve_send(&entity_id).expect("预留调用失败");
    assert!(!outcome.granted);
    assert_eq!(
        outcome.reject_code.as_deref(),
        Some("warmup_day_zero_weekend")
    );
}

#[test]
fn test_reserve_rejects_inactive_warmup() {
    let ctx = setup();
    let view = ctx
        .api
        .register_entity(
            "u1",
            "example.com",
            warmup_engine::EntityKind::Domain,
            warmup_engine::SendMode::ColdOutreach,
            None,
            warmup_engine::PlanTier::Pro,
        )
        .expect("注册失败");

    // 未启动预热: 拒绝且拒绝码可区分
    let outcome = ctx.api.reserve_send(&view.entity_id).expect("预留调用失败");
    assert!(!outcome.granted);
    assert_eq!(outcome.reject_code.as_deref(), Some("warmup_inactive"));
}
