//! 영구 저장소.
//!
//! - `StockStore` / `NewsStore`: 저장소 trait
//! - `postgres`: PostgreSQL 구현 (sqlx)
//! - `memory`: 프로세스 내 구현 (데이터베이스 미설정 시, 테스트)

pub mod database;
pub mod memory;
pub mod postgres;

pub use database::Database;
pub use memory::{MemoryNewsStore, MemoryStockStore};
pub use postgres::{PgNewsStore, PgStockStore};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use stockinfo_core::{News, Stock, StockQuote};

/// 시세 저장소.
///
/// upsert는 멱등이며 읽기 실패는 "없음"이 아니라 `Persistence` 에러입니다.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn find_stock(&self, ticker: &str) -> Result<Option<Stock>>;

    /// 전체 종목 (티커 오름차순).
    async fn all_stocks(&self) -> Result<Vec<Stock>>;

    /// 티커 기준으로 교체하거나 삽입합니다.
    async fn upsert_stock(&self, stock: &Stock) -> Result<()>;

    async fn find_quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<StockQuote>>;

    /// `[start, end]` 구간의 상세 시세 (날짜 오름차순).
    async fn find_quotes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StockQuote>>;

    /// 티커+거래일 기준으로 교체하거나 삽입합니다.
    async fn upsert_quote(&self, quote: &StockQuote) -> Result<()>;
}

/// 뉴스 저장소.
///
/// 목록 조회 결과는 발행 시각 내림차순, 같으면 ID 오름차순입니다.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn find_news(&self, id: &str) -> Result<Option<News>>;

    /// `[start, end)` 구간에 발행된 뉴스.
    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<News>>;

    /// 제목/요약/본문 부분 문자열(대소문자 무시) 또는 태그/관련 티커 정확 일치.
    async fn search_news(&self, keyword: &str) -> Result<Vec<News>>;

    /// 관련 티커에 포함되거나 본문 텍스트에 티커가 등장하는 뉴스.
    async fn find_related(&self, ticker: &str) -> Result<Vec<News>>;

    /// ID 기준으로 교체하거나 삽입합니다.
    async fn upsert_news(&self, news: &News) -> Result<()>;
}

/// `LIKE`/`ILIKE` 패턴의 특수 문자를 이스케이프하고 `%...%`로 감쌉니다.
pub fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("sber"), "%sber%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
