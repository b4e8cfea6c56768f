//! 주식 시세 도메인 모델.
//!
//! - `Stock` - 티커별 현재 시세 (티커당 하나)
//! - `StockQuote` - 티커+거래일별 상세 시세
//! - `RankBy` - 상위 종목 산출 기준

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 티커별 현재 시세.
///
/// 저장소는 신선도를 강제하지 않으며 `updated_at`만이 기준입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Stock {
    /// 티커 (대문자, 고유 키)
    pub ticker: String,
    /// 표시 이름
    pub name: String,
    /// 최근 체결가
    pub price: Decimal,
    /// 전일 대비 절대 변동
    pub change: Decimal,
    /// 전일 대비 변동률 (%)
    pub change_perc: Decimal,
    /// 거래량
    pub volume: i64,
    /// 마지막 갱신 시각
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// 값이 비어 있는 시세를 생성합니다.
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            price: Decimal::ZERO,
            change: Decimal::ZERO,
            change_perc: Decimal::ZERO,
            volume: 0,
            updated_at: Utc::now(),
        }
    }

    /// 검색어가 티커 또는 이름에 포함되는지 확인합니다 (대소문자 무시).
    pub fn matches_query(&self, query: &str) -> bool {
        contains_ignore_case(&self.ticker, query) || contains_ignore_case(&self.name, query)
    }
}

/// 티커+거래일별 상세 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct StockQuote {
    /// 티커
    pub ticker: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
    /// 시가총액 (십억 단위)
    pub market_cap_bln: Decimal,
    /// PER
    pub pe: Decimal,
    /// 배당수익률 (%)
    pub dividend_yield: Decimal,
    /// 섹터
    pub sector: String,
    /// 거래 세션
    pub trading_session: String,
}

impl StockQuote {
    /// OHLC 값이 비어 있는 상세 시세를 생성합니다.
    pub fn new(ticker: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            open: Decimal::ZERO,
            high: Decimal::ZERO,
            low: Decimal::ZERO,
            close: Decimal::ZERO,
            volume: 0,
            market_cap_bln: Decimal::ZERO,
            pe: Decimal::ZERO,
            dividend_yield: Decimal::ZERO,
            sector: String::new(),
            trading_session: String::new(),
        }
    }
}

/// 상위 종목 산출 기준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// 변동률 내림차순
    Gainers,
    /// 변동률 오름차순
    Losers,
    /// 거래량 내림차순
    Volume,
}

impl RankBy {
    /// 두 종목의 순위를 비교합니다.
    ///
    /// 주 기준이 같으면 티커 오름차순으로 정렬합니다.
    pub fn compare(&self, a: &Stock, b: &Stock) -> Ordering {
        let primary = match self {
            RankBy::Gainers => b.change_perc.cmp(&a.change_perc),
            RankBy::Losers => a.change_perc.cmp(&b.change_perc),
            RankBy::Volume => b.volume.cmp(&a.volume),
        };
        primary.then_with(|| a.ticker.cmp(&b.ticker))
    }
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankBy::Gainers => write!(f, "gainers"),
            RankBy::Losers => write!(f, "losers"),
            RankBy::Volume => write!(f, "volume"),
        }
    }
}

/// 상위 N개 요청의 기본 개수.
pub const DEFAULT_RANK_LIMIT: usize = 10;

/// 요청된 개수를 정규화합니다. 0 이하이면 기본값을 사용합니다.
pub fn normalize_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_RANK_LIMIT
    } else {
        limit as usize
    }
}

/// 종목을 기준에 따라 정렬하고 상위 `limit`개만 남깁니다.
///
/// `limit`이 0 이하이면 10개, 종목 수보다 크면 전체를 반환합니다.
pub fn rank_stocks(mut stocks: Vec<Stock>, by: RankBy, limit: i64) -> Vec<Stock> {
    stocks.sort_by(|a, b| by.compare(a, b));
    stocks.truncate(normalize_limit(limit));
    stocks
}

/// 티커 입력을 정규화합니다 (공백 제거, 대문자).
pub fn normalize_ticker(raw: &str) -> CoreResult<String> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(CoreError::InvalidInput("티커는 비어 있을 수 없습니다".to_string()));
    }
    Ok(ticker.to_uppercase())
}

/// 대소문자를 무시한 부분 문자열 검사.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stock(ticker: &str, change_perc: Decimal, volume: i64) -> Stock {
        Stock {
            change_perc,
            volume,
            ..Stock::new(ticker, ticker)
        }
    }

    fn universe() -> Vec<Stock> {
        vec![
            stock("SBER", dec!(1.5), 1_000),
            stock("GAZP", dec!(-2.0), 500_000),
            stock("LKOH", dec!(3.2), 20_000),
            stock("VTBR", dec!(-0.4), 9_000_000),
            stock("MGNT", dec!(0.0), 3_000),
        ]
    }

    fn tickers(stocks: &[Stock]) -> Vec<&str> {
        stocks.iter().map(|s| s.ticker.as_str()).collect()
    }

    #[test]
    fn test_rank_gainers_and_losers_mirror() {
        let gainers = rank_stocks(universe(), RankBy::Gainers, 3);
        assert_eq!(tickers(&gainers), vec!["LKOH", "SBER", "MGNT"]);

        let losers = rank_stocks(universe(), RankBy::Losers, 3);
        assert_eq!(tickers(&losers), vec!["GAZP", "VTBR", "MGNT"]);

        let all_gainers = rank_stocks(universe(), RankBy::Gainers, 5);
        let mut all_losers = rank_stocks(universe(), RankBy::Losers, 5);
        all_losers.reverse();
        assert_eq!(tickers(&all_gainers), tickers(&all_losers));
    }

    #[test]
    fn test_rank_volume() {
        let top = rank_stocks(universe(), RankBy::Volume, 2);
        assert_eq!(tickers(&top), vec!["VTBR", "GAZP"]);
    }

    #[test]
    fn test_rank_limit_defaults_and_clamps() {
        let many: Vec<Stock> = (0..15)
            .map(|i| stock(&format!("T{:02}", i), Decimal::from(i), i))
            .collect();

        assert_eq!(rank_stocks(many.clone(), RankBy::Gainers, 0).len(), 10);
        assert_eq!(rank_stocks(many.clone(), RankBy::Gainers, -5).len(), 10);
        assert_eq!(rank_stocks(many, RankBy::Gainers, 100).len(), 15);
        assert_eq!(rank_stocks(universe(), RankBy::Losers, 50).len(), 5);
    }

    #[test]
    fn test_rank_ties_broken_by_ticker() {
        let tied = vec![
            stock("YNDX", dec!(1.0), 10),
            stock("AFLT", dec!(1.0), 10),
            stock("MTSS", dec!(1.0), 10),
        ];
        assert_eq!(
            tickers(&rank_stocks(tied.clone(), RankBy::Gainers, 10)),
            vec!["AFLT", "MTSS", "YNDX"]
        );
        assert_eq!(
            tickers(&rank_stocks(tied.clone(), RankBy::Losers, 10)),
            vec!["AFLT", "MTSS", "YNDX"]
        );
        assert_eq!(
            tickers(&rank_stocks(tied, RankBy::Volume, 10)),
            vec!["AFLT", "MTSS", "YNDX"]
        );
    }

    #[test]
    fn test_matches_query() {
        let sber = Stock::new("SBER", "Сбербанк");
        let sberbank = Stock::new("SBERP", "Sberbank pref");
        let gazp = Stock::new("GAZP", "Газпром");

        assert!(sber.matches_query("sber"));
        assert!(sberbank.matches_query("SBERBANK"));
        assert!(gazp.matches_query("газ"));
        assert!(!gazp.matches_query("sber"));
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  sber ").unwrap(), "SBER");
        assert!(normalize_ticker("   ").unwrap_err().is_invalid_input());
        assert!(normalize_ticker("").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_stock() -> impl Strategy<Value = Stock> {
        ("[A-Z]{4}", -1000i64..1000, 0i64..1_000_000).prop_map(|(ticker, perc, volume)| Stock {
            change_perc: Decimal::new(perc, 2),
            volume,
            ..Stock::new(ticker.clone(), ticker)
        })
    }

    proptest! {
        #[test]
        fn gainers_are_sorted_descending(stocks in prop::collection::vec(arb_stock(), 0..40), limit in -3i64..50) {
            let ranked = rank_stocks(stocks.clone(), RankBy::Gainers, limit);
            prop_assert_eq!(ranked.len(), normalize_limit(limit).min(stocks.len()));
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].change_perc >= pair[1].change_perc);
            }
        }

        #[test]
        fn volume_is_sorted_descending(stocks in prop::collection::vec(arb_stock(), 0..40)) {
            let ranked = rank_stocks(stocks, RankBy::Volume, 40);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].volume >= pair[1].volume);
            }
        }
    }
}
