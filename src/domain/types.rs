// ==========================================
// 邮件预热引擎 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 发送实体类型 (Entity Kind)
// ==========================================
// 预热的单位: 域名 或 发送账号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Domain,  // 发送域名
    Account, // 发送账号
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Domain => "DOMAIN",
            EntityKind::Account => "ACCOUNT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DOMAIN" => Some(EntityKind::Domain),
            "ACCOUNT" => Some(EntityKind::Account),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 发送模式 (Send Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendMode {
    ColdOutreach,    // 冷启动外联
    FounderOutbound, // 创始人外发
    Newsletter,      // 订阅邮件
}

impl SendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendMode::ColdOutreach => "COLD_OUTREACH",
            SendMode::FounderOutbound => "FOUNDER_OUTBOUND",
            SendMode::Newsletter => "NEWSLETTER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COLD_OUTREACH" => Some(SendMode::ColdOutreach),
            "FOUNDER_OUTBOUND" => Some(SendMode::FounderOutbound),
            "NEWSLETTER" => Some(SendMode::Newsletter),
            _ => None,
        }
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 投递通道 (Provider)
// ==========================================
// 仅账号类实体携带
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    Gmail,
    Outlook,
    Smtp,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gmail => "GMAIL",
            Provider::Outlook => "OUTLOOK",
            Provider::Smtp => "SMTP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GMAIL" => Some(Provider::Gmail),
            "OUTLOOK" => Some(Provider::Outlook),
            "SMTP" => Some(Provider::Smtp),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 预热状态 (Warmup Status)
// ==========================================
// 状态机: INACTIVE -> ACTIVE -> COMPLETED
// PAUSED 与暂停机制联动，可从任意预热状态进入
// COMPLETED 不可回退到更早的预热状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarmupStatus {
    Inactive,  // 未启动
    Active,    // 爬坡中
    Paused,    // 已暂停
    Completed, // 预热完成 (配额视同 active)
}

impl WarmupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarmupStatus::Inactive => "INACTIVE",
            WarmupStatus::Active => "ACTIVE",
            WarmupStatus::Paused => "PAUSED",
            WarmupStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INACTIVE" => Some(WarmupStatus::Inactive),
            "ACTIVE" => Some(WarmupStatus::Active),
            "PAUSED" => Some(WarmupStatus::Paused),
            "COMPLETED" => Some(WarmupStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for WarmupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 暂停类别 (Pause Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseKind {
    None,   // 未暂停
    Manual, // 人工暂停
    Auto,   // 引擎自动暂停 (阈值触发)
}

impl PauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseKind::None => "NONE",
            PauseKind::Manual => "MANUAL",
            PauseKind::Auto => "AUTO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(PauseKind::None),
            "MANUAL" => Some(PauseKind::Manual),
            "AUTO" => Some(PauseKind::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for PauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 暂停转换动作 (Pause Action)
// ==========================================
// pause_record 仅追加日志的动作字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseAction {
    Pause,
    Resume,
}

impl PauseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseAction::Pause => "PAUSE",
            PauseAction::Resume => "RESUME",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PAUSE" => Some(PauseAction::Pause),
            "RESUME" => Some(PauseAction::Resume),
            _ => None,
        }
    }
}

impl fmt::Display for PauseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 投递结果类别 (Outcome Kind)
// ==========================================
// 由传输协作方在每次投递尝试后上报
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Delivered,     // 成功投递
    Bounced,       // 退信
    SpamComplaint, // 垃圾邮件投诉
    Reply,         // 收到回复
    Open,          // 邮件打开
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Delivered => "DELIVERED",
            OutcomeKind::Bounced => "BOUNCED",
            OutcomeKind::SpamComplaint => "SPAM_COMPLAINT",
            OutcomeKind::Reply => "REPLY",
            OutcomeKind::Open => "OPEN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DELIVERED" => Some(OutcomeKind::Delivered),
            "BOUNCED" => Some(OutcomeKind::Bounced),
            "SPAM_COMPLAINT" => Some(OutcomeKind::SpamComplaint),
            "REPLY" => Some(OutcomeKind::Reply),
            "OPEN" => Some(OutcomeKind::Open),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 内容风险等级 (Content Risk Level)
// ==========================================
// 仅建议性: CRITICAL 也不阻断发送，发送由配额/暂停机制把关
// UNKNOWN: 外部分类器超时/失败时的降级结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentRiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl ContentRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRiskLevel::Low => "LOW",
            ContentRiskLevel::Medium => "MEDIUM",
            ContentRiskLevel::High => "HIGH",
            ContentRiskLevel::Critical => "CRITICAL",
            ContentRiskLevel::Unknown => "UNKNOWN",
        }
    }

    /// 按评分映射风险等级 (0-100, 分数越高风险越大)
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 20 => ContentRiskLevel::Low,
            s if s < 50 => ContentRiskLevel::Medium,
            s if s < 75 => ContentRiskLevel::High,
            _ => ContentRiskLevel::Critical,
        }
    }
}

impl fmt::Display for ContentRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 健康状态 (Health Status)
// ==========================================
// 由信誉快照派生，只读展示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Risky,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Risky => "RISKY",
            HealthStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 套餐层级 (Plan Tier)
// ==========================================
// 套餐功能矩阵见 engine::entitlement (纯映射表，不散落条件判断)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    Free,
    Premium,
    Pro,
    Enterprise,
    EnterpriseInternal, // 内部/创始人账号
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Premium => "PREMIUM",
            PlanTier::Pro => "PRO",
            PlanTier::Enterprise => "ENTERPRISE",
            PlanTier::EnterpriseInternal => "ENTERPRISE_INTERNAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FREE" => Some(PlanTier::Free),
            "PREMIUM" => Some(PlanTier::Premium),
            "PRO" => Some(PlanTier::Pro),
            "ENTERPRISE" => Some(PlanTier::Enterprise),
            "ENTERPRISE_INTERNAL" => Some(PlanTier::EnterpriseInternal),
            _ => None,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
