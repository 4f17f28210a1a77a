// ==========================================
// 邮件预热引擎 - 时钟注入
// ==========================================
// 目标: 日界翻转以显式 UTC 日期为准，而不是引擎内部隐式读取墙钟
// 测试无需 mock 墙钟，注入 FixedClock 即可
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};

/// 时钟接口
///
/// 引擎所有"今天"的概念都来自这里，日界按 UTC 日历日判定
/// (跨客户时区的确定性是显式设计选择)
pub trait Clock: Send + Sync {
    /// 当前 UTC 时刻
    fn now(&self) -> DateTime<Utc>;

    /// 当前 UTC 日历日
    fn today_utc(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

// ==========================================
// SystemClock - 生产时钟
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ==========================================
// FixedClock - 测试时钟
// ==========================================
/// 固定时刻时钟，可手动推进日期
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// 以指定 UTC 日期 00:00:00 创建
    pub fn at_date(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// 推进指定天数
    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
