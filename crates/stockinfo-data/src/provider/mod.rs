//! 외부 데이터 Provider 모듈.
//!
//! ## MOEX ISS
//! - `MoexClient`: 모스크바 거래소 ISS API 클라이언트 (현재 시세, 일별 이력)
//!
//! ## NewsAPI
//! - `NewsApiClient`: NewsAPI `/everything` 클라이언트 (금융 뉴스)
//!
//! Provider는 캐시나 저장소에 접근하지 않고 도메인 객체만 반환합니다.

pub mod moex;
pub mod newsapi;

pub use moex::MoexClient;
pub use newsapi::NewsApiClient;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use stockinfo_core::{News, Stock, StockQuote};

/// 시세 Provider.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider 이름 (로그용).
    fn name(&self) -> &str;

    /// 단일 종목 현재 시세. 거래소에 없는 종목이면 `None`.
    async fn fetch_stock(&self, ticker: &str) -> Result<Option<Stock>>;

    /// 여러 종목 현재 시세 (한 번의 요청).
    async fn fetch_stocks(&self, tickers: &[String]) -> Result<Vec<Stock>>;

    /// `[from, till]` 구간 일별 상세 시세.
    async fn fetch_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<Vec<StockQuote>>;
}

/// 뉴스 Provider.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Provider 이름 (로그용).
    fn name(&self) -> &str;

    /// 검색어와 일치하는 뉴스. 기간을 생략하면 Provider 기본 범위를 사용합니다.
    async fn fetch_news(
        &self,
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<News>>;

    /// 기본 금융 검색어로 오늘의 뉴스를 가져옵니다.
    async fn fetch_today(&self, today: NaiveDate) -> Result<Vec<News>>;
}
