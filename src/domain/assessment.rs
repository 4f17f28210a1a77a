// ==========================================
// 邮件预热引擎 - 内容风险评估结果
// ==========================================
// 外部内容分类器的契约结果 (engine::advisor 网关产出)
// 仅建议性: 评分不阻断发送
// ==========================================

use crate::domain::types::ContentRiskLevel;
use serde::{Deserialize, Serialize};

// ==========================================
// RiskAssessment - 内容风险评估
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, 分数越高风险越大
    pub score: i32,
    pub risk_level: ContentRiskLevel,
    /// 预测进箱率 0-100%
    pub predicted_inbox_rate: i32,
    /// 可执行的改进建议
    pub recommendations: Vec<String>,
    /// 命中的风险因素
    pub risk_factors: Vec<String>,
    /// 外部分类器不可用时为 true (降级结果)
    pub degraded: bool,
}

impl RiskAssessment {
    /// 分类器超时/失败时的降级结果
    ///
    /// 不阻断活动创建: risk_level=UNKNOWN, 不抛错给调用方
    pub fn unavailable() -> Self {
        Self {
            score: 0,
            risk_level: ContentRiskLevel::Unknown,
            predicted_inbox_rate: 0,
            recommendations: vec!["内容风险评估暂不可用，稍后可重试".to_string()],
            risk_factors: Vec::new(),
            degraded: true,
        }
    }
}
