// ==========================================
// 邮件预热与送达准入控制引擎 - 二进制入口
// ==========================================
// 启动流程: 日志 -> 数据库 schema -> 策略种子 -> 演示场景
// ==========================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use warmup_engine::engine::ContentRiskAdvisor;
use warmup_engine::repository::WarmupPolicyRepository;
use warmup_engine::{
    EntityKind, OutcomeEvent, OutcomeKind, PlanTier, SendMode, SystemClock, WarmupApi,
};

/// 默认数据库路径: <data_dir>/warmup-engine/warmup.db
fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("无法定位系统数据目录")?;
    let dir = base.join("warmup-engine");
    std::fs::create_dir_all(&dir).with_context(|| format!("创建数据目录失败: {:?}", dir))?;
    Ok(dir.join("warmup.db"))
}

#[tokio::main]
async fn main() -> Result<()> {
    warmup_engine::logging::init();

    let db_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => default_db_path()?,
    };
    let db_path_str = db_path.to_string_lossy().to_string();
    tracing::info!(version = warmup_engine::VERSION, db = %db_path_str, "预热引擎启动");

    let conn = warmup_engine::db::open_and_init(&db_path_str)
        .with_context(|| format!("数据库初始化失败: {}", db_path_str))?;
    let conn = Arc::new(Mutex::new(conn));

    // 策略种子 (幂等 upsert)
    WarmupPolicyRepository::from_connection(conn.clone())
        .seed_defaults()
        .context("策略种子写入失败")?;

    let api = WarmupApi::from_connection(
        conn,
        ContentRiskAdvisor::with_default_classifier(),
        Arc::new(SystemClock),
    );

    run_demo(&api).await
}

/// 演示场景: 注册 -> 验证 -> 启动预热 -> 预留 -> 结果反馈 -> 看板
async fn run_demo(api: &WarmupApi) -> Result<()> {
    // 每次运行注册新的用户与域名，避免撞唯一约束与套餐实体上限
    let suffix = &uuid::Uuid::new_v4().to_string()[..8];
    let user_id = &format!("demo-user-{}", suffix);
    let address = format!("demo-{}.example.com", suffix);
    let view = api.register_entity(
        user_id,
        &address,
        EntityKind::Domain,
        SendMode::ColdOutreach,
        None,
        PlanTier::Pro,
    )?;
    tracing::info!(entity_id = %view.entity_id, daily_limit = view.daily_limit, "实体已注册");

    api.verify_entity(&view.entity_id)?;
    let view = api.start_warmup(&view.entity_id)?;
    tracing::info!(
        warmup_status = %view.warmup_status,
        warmup_length = view.warmup_length,
        "预热已启动"
    );

    // 耗尽当日额度
    let mut granted = 0;
    loop {
        let outcome = api.reserve_send(&view.entity_id)?;
        if !outcome.granted {
            tracing::info!(
                granted,
                reject_code = outcome.reject_code.as_deref().unwrap_or("-"),
                "当日额度耗尽"
            );
            break;
        }
        granted += 1;
    }

    // 投递结果反馈
    for i in 0..granted {
        let event = OutcomeEvent::new(
            format!("evt-{}-{}", suffix, i),
            view.entity_id.clone(),
            "demo-campaign".to_string(),
            if i % 25 == 24 {
                OutcomeKind::Bounced
            } else {
                OutcomeKind::Delivered
            },
            chrono::Utc::now(),
        );
        let applied = api.record_outcome(&event)?;
        if applied.auto_paused {
            tracing::warn!(entity_id = %view.entity_id, "阈值触发，实体被自动暂停");
        }
    }

    // 内容风险评估
    let assessment = api
        .assess_content(
            "Quick question about your team",
            "Hi {{first_name}}, saw your recent launch and had one question about \
             how you handle onboarding. Mind if I share a short idea?",
            SendMode::ColdOutreach,
        )
        .await;
    tracing::info!(
        score = assessment.score,
        risk_level = %assessment.risk_level,
        inbox_rate = assessment.predicted_inbox_rate,
        "内容风险评估完成"
    );

    let stats = api.dashboard_stats(user_id)?;
    tracing::info!(
        total = stats.total_entities,
        in_warmup = stats.entities_in_warmup,
        sent_today = stats.emails_sent_today,
        avg_health = stats.average_health_score,
        "看板统计"
    );

    Ok(())
}
