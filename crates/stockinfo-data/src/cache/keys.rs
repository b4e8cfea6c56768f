//! 캐시 키.

use chrono::NaiveDate;

/// 전체 종목 목록.
pub const ALL_STOCKS: &str = "stocks:all";

/// 시세 관련 키 접두사 (`stock:`, `stocks:`, `stock_quote:`, `stock_history:`).
pub const STOCK_PREFIX: &str = "stock";

/// 뉴스 관련 키 접두사.
pub const NEWS_PREFIX: &str = "news:";

pub fn stock(ticker: &str) -> String {
    format!("stock:{}", ticker)
}

pub fn stock_quote(ticker: &str, date: NaiveDate) -> String {
    format!("stock_quote:{}:{}", ticker, date.format("%Y-%m-%d"))
}

pub fn stock_history(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "stock_history:{}:{}:{}",
        ticker,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn news(id: &str) -> String {
    format!("news:{}", id)
}

pub fn news_by_date(date: NaiveDate) -> String {
    format!("news:date:{}", date.format("%Y-%m-%d"))
}

pub fn news_by_keyword(keyword: &str) -> String {
    format!("news:keyword:{}", keyword)
}

pub fn news_by_ticker(ticker: &str) -> String {
    format!("news:ticker:{}", ticker)
}
