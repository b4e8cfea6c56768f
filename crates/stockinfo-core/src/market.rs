//! 시장 타임존 기준 날짜 계산.

use crate::config::MarketConfig;
use crate::error::CoreResult;
use chrono::{DateTime, Duration, LocalResult, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// 시장 타임존 기준의 "오늘"과 하루 경계를 계산합니다.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    tz: Tz,
}

impl MarketClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// 설정에서 생성합니다.
    pub fn from_config(config: &MarketConfig) -> CoreResult<Self> {
        Ok(Self::new(config.tz()?))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// 현재 시장 날짜.
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// 주어진 시각의 시장 날짜.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.today()
    }

    /// 시장 날짜의 `[00:00, 다음날 00:00)` 구간을 UTC로 반환합니다.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(date);
        (self.start_of(date), self.start_of(next))
    }

    /// 기본 조회 기간: `end`로부터 한 달 전까지.
    pub fn default_history_range(&self, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = end
            .checked_sub_months(Months::new(1))
            .unwrap_or(end - Duration::days(30));
        (start, end)
    }

    fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        match self.tz.from_local_datetime(&midnight) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // 자정이 DST 공백에 걸리면 UTC 자정으로 대체
            LocalResult::None => Utc.from_utc_datetime(&midnight),
        }
    }
}

impl Default for MarketClock {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Moscow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds_moscow() {
        let clock = MarketClock::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = clock.day_bounds(date);

        // 모스크바는 UTC+3
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 21, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_date_of_crosses_midnight() {
        let clock = MarketClock::default();
        let late_utc = Utc.with_ymd_and_hms(2024, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(
            clock.date_of(late_utc),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_default_history_range() {
        let clock = MarketClock::default();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let (start, end) = clock.default_history_range(end);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(start < end);
    }
}
