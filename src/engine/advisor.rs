// ==========================================
// 邮件预热引擎 - 内容风险顾问网关
// ==========================================
// 职责: 封装外部内容分类器调用
// 规则:
// - 超时/失败一律降级为 UNKNOWN (degraded=true)，绝不阻断活动创建
// - 同一 (主题, 正文, 模式) 指纹在进程生命周期内缓存，避免重复调用
// - 降级结果不缓存，后续调用可重试
// - 内置启发式分类器: 触发词/全大写主题/链接数/正文长度/个性化占位符
// ==========================================

use crate::domain::assessment::RiskAssessment;
use crate::domain::types::{ContentRiskLevel, SendMode};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 外部分类器默认超时
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

// ==========================================
// RiskClassifier - 内容分类器契约
// ==========================================
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    async fn classify(
        &self,
        subject: &str,
        body: &str,
        mode: SendMode,
    ) -> anyhow::Result<RiskAssessment>;
}

// ==========================================
// HeuristicClassifier - 内置启发式分类器
// ==========================================
// 垃圾触发词表 (英文营销邮件口径)
const SPAM_TRIGGER_WORDS: &[&str] = &[
    "free",
    "guarantee",
    "act now",
    "limited time",
    "click here",
    "buy now",
    "cash",
    "winner",
    "congratulations",
    "no obligation",
    "risk-free",
    "urgent",
    "100%",
];

pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self {}
    }

    fn assess(subject: &str, body: &str, mode: SendMode) -> RiskAssessment {
        let mut score: i32 = 0;
        let mut risk_factors = Vec::new();
        let mut recommendations = Vec::new();

        let subject_lower = subject.to_lowercase();
        let body_lower = body.to_lowercase();

        // 主题过长
        if subject.chars().count() > 60 {
            score += 10;
            risk_factors.push("主题超过 60 字符".to_string());
            recommendations.push("缩短主题到 60 字符以内".to_string());
        }

        // 主题命中触发词
        if SPAM_TRIGGER_WORDS.iter().any(|w| subject_lower.contains(w)) {
            score += 15;
            risk_factors.push("主题包含垃圾邮件触发词".to_string());
            recommendations.push("移除主题中的促销类措辞".to_string());
        }

        // 全大写主题
        let has_alpha = subject.chars().any(|c| c.is_alphabetic());
        if has_alpha && subject == subject.to_uppercase() {
            score += 20;
            risk_factors.push("主题全部大写".to_string());
            recommendations.push("主题改用正常大小写".to_string());
        }

        // 链接过多
        let link_count = body_lower.matches("http://").count() + body_lower.matches("https://").count();
        if link_count > 3 {
            score += 15;
            risk_factors.push(format!("正文包含 {} 个链接", link_count));
            recommendations.push("链接数控制在 3 个以内".to_string());
        }

        // 正文命中触发词
        if SPAM_TRIGGER_WORDS.iter().any(|w| body_lower.contains(w)) {
            score += 10;
            risk_factors.push("正文包含垃圾邮件触发词".to_string());
        }

        // 正文过短
        if body.chars().count() < 50 {
            score += 10;
            risk_factors.push("正文过短".to_string());
            recommendations.push("补充有实质内容的正文".to_string());
        }

        // 个性化占位符减分
        if body.contains("{{") || body.contains("{%") {
            score -= 10;
        }

        // 冷外联且克制用链接: 轻微减分
        if mode == SendMode::ColdOutreach && link_count <= 1 {
            score -= 5;
        }

        let score = score.clamp(0, 100);
        let predicted_inbox_rate = (100 - score).max(30);

        if recommendations.is_empty() {
            recommendations.push("内容未命中已知风险模式".to_string());
        }

        RiskAssessment {
            score,
            risk_level: ContentRiskLevel::from_score(score),
            predicted_inbox_rate,
            recommendations,
            risk_factors,
            degraded: false,
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskClassifier for HeuristicClassifier {
    async fn classify(
        &self,
        subject: &str,
        body: &str,
        mode: SendMode,
    ) -> anyhow::Result<RiskAssessment> {
        Ok(Self::assess(subject, body, mode))
    }
}

// ==========================================
// ContentRiskAdvisor - 风险顾问网关
// ==========================================
pub struct ContentRiskAdvisor {
    classifier: Arc<dyn RiskClassifier>,
    timeout: Duration,
    /// (主题, 正文, 模式) 指纹 -> 评估结果
    cache: Mutex<HashMap<u64, RiskAssessment>>,
}

impl ContentRiskAdvisor {
    pub fn new(classifier: Arc<dyn RiskClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 使用内置启发式分类器与默认超时
    pub fn with_default_classifier() -> Self {
        Self::new(Arc::new(HeuristicClassifier::new()), DEFAULT_CLASSIFIER_TIMEOUT)
    }

    fn fingerprint(subject: &str, body: &str, mode: SendMode) -> u64 {
        let mut hasher = DefaultHasher::new();
        subject.hash(&mut hasher);
        body.hash(&mut hasher);
        mode.as_str().hash(&mut hasher);
        hasher.finish()
    }

    fn cache_get(&self, key: u64) -> Option<RiskAssessment> {
        match self.cache.lock() {
            Ok(cache) => cache.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        }
    }

    fn cache_put(&self, key: u64, assessment: &RiskAssessment) {
        match self.cache.lock() {
            Ok(mut cache) => {
                cache.insert(key, assessment.clone());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, assessment.clone());
            }
        }
    }

    /// 评估内容风险 (永不失败)
    ///
    /// 超时或分类器错误一律返回降级结果，调用方无需特判
    pub async fn assess(&self, subject: &str, body: &str, mode: SendMode) -> RiskAssessment {
        let key = Self::fingerprint(subject, body, mode);

        if let Some(cached) = self.cache_get(key) {
            tracing::debug!(fingerprint = key, "内容评估命中缓存");
            return cached;
        }

        match tokio::time::timeout(self.timeout, self.classifier.classify(subject, body, mode))
            .await
        {
            Ok(Ok(assessment)) => {
                self.cache_put(key, &assessment);
                assessment
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "内容分类器调用失败，返回降级结果");
                RiskAssessment::unavailable()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "内容分类器超时，返回降级结果"
                );
                RiskAssessment::unavailable()
            }
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_content_low_risk() {
        let advisor = ContentRiskAdvisor::with_default_classifier();
        let assessment = advisor
            .assess(
                "Quick question about your hiring plans",
                "Hi {{first_name}}, I noticed your team is growing and wanted to ask \
                 how you are handling onboarding at scale. Happy to share what worked for us.",
                SendMode::ColdOutreach,
            )
            .await;

        assert_eq!(assessment.risk_level, ContentRiskLevel::Low);
        assert!(!assessment.degraded);
        assert!(assessment.predicted_inbox_rate >= 70);
    }

    #[tokio::test]
    async fn test_spammy_content_high_risk() {
        let advisor = ContentRiskAdvisor::with_default_classifier();
        let assessment = advisor
            .assess(
                "FREE CASH WINNER - ACT NOW LIMITED TIME GUARANTEE CLICK HERE TODAY!!!",
                "click here http://a.io http://b.io http://c.io http://d.io buy now",
                SendMode::Newsletter,
            )
            .await;

        assert!(assessment.score >= 50);
        assert!(matches!(
            assessment.risk_level,
            ContentRiskLevel::High | ContentRiskLevel::Critical
        ));
        assert!(!assessment.risk_factors.is_empty());
        // 进箱率预测有 30% 下限
        assert!(assessment.predicted_inbox_rate >= 30);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_unknown() {
        struct SlowClassifier;

        #[async_trait]
        impl RiskClassifier for SlowClassifier {
            async fn classify(
                &self,
                _subject: &str,
                _body: &str,
                _mode: SendMode,
            ) -> anyhow::Result<RiskAssessment> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("超时应先触发")
            }
        }

        let advisor =
            ContentRiskAdvisor::new(Arc::new(SlowClassifier), Duration::from_millis(50));

        let started = std::time::Instant::now();
        let assessment = advisor.assess("subject", "body", SendMode::ColdOutreach).await;

        // 降级在超时窗口附近返回，不阻塞调用方
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(assessment.risk_level, ContentRiskLevel::Unknown);
        assert!(assessment.degraded);
    }

    #[tokio::test]
    async fn test_classifier_error_degrades_to_unknown() {
        struct FailingClassifier;

        #[async_trait]
        impl RiskClassifier for FailingClassifier {
            async fn classify(
                &self,
                _subject: &str,
                _body: &str,
                _mode: SendMode,
            ) -> anyhow::Result<RiskAssessment> {
                anyhow::bail!("上游 503")
            }
        }

        let advisor =
            ContentRiskAdvisor::new(Arc::new(FailingClassifier), Duration::from_secs(1));
        let assessment = advisor.assess("subject", "body", SendMode::ColdOutreach).await;
        assert!(assessment.degraded);
        assert_eq!(assessment.risk_level, ContentRiskLevel::Unknown);
    }

    #[tokio::test]
    async fn test_fingerprint_cache_avoids_recall() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingClassifier {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl RiskClassifier for CountingClassifier {
            async fn classify(
                &self,
                subject: &str,
                body: &str,
                mode: SendMode,
            ) -> anyhow::Result<RiskAssessment> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(HeuristicClassifier::assess(subject, body, mode))
            }
        }

        let classifier = Arc::new(CountingClassifier {
            calls: AtomicUsize::new(0),
        });
        let advisor = ContentRiskAdvisor::new(classifier.clone(), Duration::from_secs(1));

        let first = advisor.assess("s", "b", SendMode::ColdOutreach).await;
        let second = advisor.assess("s", "b", SendMode::ColdOutreach).await;
        assert_eq!(first, second);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);

        // 模式不同: 指纹不同，重新调用
        advisor.assess("s", "b", SendMode::Newsletter).await;
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }
}
