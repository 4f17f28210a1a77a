// ==========================================
// 邮件预热引擎 - 信誉统计引擎
// ==========================================
// 职责: 消费投递结果事件，维护累计计数器与健康分
// 口径约定 (阈值比较必须与此一致):
// - 投递尝试 = DELIVERED / BOUNCED / SPAM_COMPLAINT，计入 total_sent
// - REPLY / OPEN 是互动信号，不计入分母
// - 比率 = 分子 / total_sent * 100，分母为 0 时一律取 0.0
// 健康分: 100 - 2.5*退信率% - 50*垃圾率%，截断到 [0,100]
//   (垃圾投诉权重 20 倍: 4% 退信与 0.2% 垃圾率同等扣 10 分，
//    与两者的自动暂停阈值标定一致)
// ==========================================

use crate::domain::entity::SendingEntity;
use crate::domain::outcome::ReputationSnapshot;
use crate::domain::types::{HealthStatus, OutcomeKind};

/// 每 1% 退信率扣分
const BOUNCE_PENALTY_PER_PCT: f64 = 2.5;
/// 每 1% 垃圾投诉率扣分
const SPAM_PENALTY_PER_PCT: f64 = 50.0;

/// 健康状态派生阈值 (观测口径)
const CRITICAL_BOUNCE_PCT: f64 = 4.0;
const CRITICAL_SPAM_PCT: f64 = 0.5;
const RISKY_BOUNCE_PCT: f64 = 2.0;
const RISKY_SPAM_PCT: f64 = 0.2;
const RISKY_HEALTH_SCORE: i64 = 70;

// ==========================================
// ReputationTracker - 信誉统计引擎
// ==========================================
pub struct ReputationTracker {
    // 无状态引擎，计数器存储在实体上
}

impl ReputationTracker {
    pub fn new() -> Self {
        Self {}
    }

    /// 消费一条投递结果事件 (幂等性由事件仓储把关，这里只做累加)
    ///
    /// 计数器累加后同步重算 health_score，
    /// 自动暂停评估在同一锁内读到的永远是新鲜值
    pub fn apply_outcome(&self, entity: &mut SendingEntity, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Delivered => {
                entity.total_sent += 1;
                entity.total_delivered += 1;
            }
            OutcomeKind::Bounced => {
                entity.total_sent += 1;
                entity.total_bounced += 1;
            }
            OutcomeKind::SpamComplaint => {
                entity.total_sent += 1;
                entity.total_spam_complaints += 1;
            }
            OutcomeKind::Reply => {
                entity.total_replies += 1;
            }
            OutcomeKind::Open => {
                entity.total_opens += 1;
            }
        }

        entity.health_score = compute_health_score(
            rate_pct(entity.total_bounced, entity.total_sent),
            rate_pct(entity.total_spam_complaints, entity.total_sent),
        );
    }

    /// 生成当前信誉快照 (自动暂停评估与状态查询共用)
    pub fn snapshot(&self, entity: &SendingEntity) -> ReputationSnapshot {
        let bounce_rate_pct = rate_pct(entity.total_bounced, entity.total_sent);
        let spam_rate_pct = rate_pct(entity.total_spam_complaints, entity.total_sent);

        ReputationSnapshot {
            entity_id: entity.entity_id.clone(),
            total_sent: entity.total_sent,
            bounce_rate_pct,
            spam_rate_pct,
            delivery_rate_pct: rate_pct(entity.total_delivered, entity.total_sent),
            reply_rate_pct: rate_pct(entity.total_replies, entity.total_sent),
            open_rate_pct: rate_pct(entity.total_opens, entity.total_sent),
            spam_count: entity.total_spam_complaints,
            health_score: entity.health_score,
            health_status: derive_health_status(
                bounce_rate_pct,
                spam_rate_pct,
                entity.health_score,
            ),
        }
    }
}

impl Default for ReputationTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// 百分比计算: 分母为 0 时取 0.0 (新实体不报告假信号)
fn rate_pct(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// 健康分公式，截断到 [0, 100]
pub fn compute_health_score(bounce_rate_pct: f64, spam_rate_pct: f64) -> i64 {
    let score =
        100.0 - BOUNCE_PENALTY_PER_PCT * bounce_rate_pct - SPAM_PENALTY_PER_PCT * spam_rate_pct;
    (score.round() as i64).clamp(0, 100)
}

/// 健康状态派生: 最差命中者生效
pub fn derive_health_status(
    bounce_rate_pct: f64,
    spam_rate_pct: f64,
    health_score: i64,
) -> HealthStatus {
    if bounce_rate_pct >= CRITICAL_BOUNCE_PCT || spam_rate_pct >= CRITICAL_SPAM_PCT {
        HealthStatus::Critical
    } else if bounce_rate_pct >= RISKY_BOUNCE_PCT
        || spam_rate_pct >= RISKY_SPAM_PCT
        || health_score < RISKY_HEALTH_SCORE
    {
        HealthStatus::Risky
    } else {
        HealthStatus::Healthy
    }
}
