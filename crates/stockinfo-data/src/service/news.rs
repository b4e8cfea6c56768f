//! 뉴스 서비스.

use super::normalize_tickers;
use crate::error::{DataError, Result};
use crate::repository::NewsRepository;
use chrono::NaiveDate;
use stockinfo_core::{normalize_limit, normalize_ticker, sort_news_recent_first, News};

/// 뉴스 조회 서비스.
#[derive(Clone)]
pub struct NewsService {
    repository: NewsRepository,
}

impl NewsService {
    pub fn new(repository: NewsRepository) -> Self {
        Self { repository }
    }

    pub async fn get_news_by_id(&self, id: &str) -> Result<News> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DataError::Validation("뉴스 ID가 비어 있습니다".to_string()));
        }
        self.repository.get_news(id).await
    }

    /// 날짜별 뉴스. 날짜를 생략하면 시장 기준 오늘.
    pub async fn get_news_by_date(&self, date: Option<NaiveDate>) -> Result<Vec<News>> {
        let date = date.unwrap_or_else(|| self.repository.clock().today());
        self.repository.get_news_by_date(date).await
    }

    pub async fn get_today_news(&self) -> Result<Vec<News>> {
        self.repository.get_news_for_today().await
    }

    /// 오늘의 뉴스 중 최신순 상위 `limit`개 (0 이하이면 10개).
    pub async fn get_recent_news(&self, limit: i64) -> Result<Vec<News>> {
        let mut news = self.repository.get_news_for_today().await?;
        sort_news_recent_first(&mut news);
        news.truncate(normalize_limit(limit));
        Ok(news)
    }

    pub async fn search_news_by_keyword(&self, keyword: &str) -> Result<Vec<News>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(DataError::Validation("키워드가 비어 있습니다".to_string()));
        }
        self.repository.get_news_by_keyword(keyword).await
    }

    pub async fn get_news_for_ticker(&self, ticker: &str) -> Result<Vec<News>> {
        let ticker = normalize_ticker(ticker)?;
        self.repository.get_news_by_ticker(&ticker).await
    }

    /// 여러 티커 중 하나라도 관련된 오늘의 뉴스 (중복 제거).
    pub async fn get_news_for_multiple_tickers(&self, tickers: &[String]) -> Result<Vec<News>> {
        let tickers = normalize_tickers(tickers)?;
        if tickers.is_empty() {
            return Err(DataError::Validation("티커 목록이 비어 있습니다".to_string()));
        }
        self.repository.get_news_for_tickers(&tickers).await
    }

    pub async fn refresh_news(&self) -> Result<usize> {
        self.repository.refresh().await
    }
}
