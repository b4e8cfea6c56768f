//! 프로세스 내 저장소 구현.
//!
//! PostgreSQL 구현과 같은 조회 조건과 정렬을 도메인 헬퍼로 구현합니다.

use super::{NewsStore, StockStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use stockinfo_core::{sort_news_recent_first, News, Stock, StockQuote};
use tokio::sync::RwLock;

/// 메모리 시세 저장소.
#[derive(Debug, Clone, Default)]
pub struct MemoryStockStore {
    stocks: Arc<RwLock<BTreeMap<String, Stock>>>,
    quotes: Arc<RwLock<BTreeMap<(String, NaiveDate), StockQuote>>>,
}

impl MemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn find_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        Ok(self.stocks.read().await.get(ticker).cloned())
    }

    async fn all_stocks(&self) -> Result<Vec<Stock>> {
        Ok(self.stocks.read().await.values().cloned().collect())
    }

    async fn upsert_stock(&self, stock: &Stock) -> Result<()> {
        self.stocks
            .write()
            .await
            .insert(stock.ticker.clone(), stock.clone());
        Ok(())
    }

    async fn find_quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<StockQuote>> {
        Ok(self
            .quotes
            .read()
            .await
            .get(&(ticker.to_string(), date))
            .cloned())
    }

    async fn find_quotes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        if start > end {
            return Ok(Vec::new());
        }
        let range = (ticker.to_string(), start)..=(ticker.to_string(), end);
        Ok(self
            .quotes
            .read()
            .await
            .range(range)
            .map(|(_, quote)| quote.clone())
            .collect())
    }

    async fn upsert_quote(&self, quote: &StockQuote) -> Result<()> {
        self.quotes
            .write()
            .await
            .insert((quote.ticker.clone(), quote.date), quote.clone());
        Ok(())
    }
}

/// 메모리 뉴스 저장소.
#[derive(Debug, Clone, Default)]
pub struct MemoryNewsStore {
    news: Arc<RwLock<HashMap<String, News>>>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect(&self, predicate: impl Fn(&News) -> bool) -> Vec<News> {
        let mut items: Vec<News> = self
            .news
            .read()
            .await
            .values()
            .filter(|n| predicate(*n))
            .cloned()
            .collect();
        sort_news_recent_first(&mut items);
        items
    }
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn find_news(&self, id: &str) -> Result<Option<News>> {
        Ok(self.news.read().await.get(id).cloned())
    }

    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<News>> {
        Ok(self
            .collect(|n| n.published_at >= start && n.published_at < end)
            .await)
    }

    async fn search_news(&self, keyword: &str) -> Result<Vec<News>> {
        Ok(self.collect(|n| n.matches_keyword(keyword)).await)
    }

    async fn find_related(&self, ticker: &str) -> Result<Vec<News>> {
        Ok(self.collect(|n| n.is_related_to(ticker)).await)
    }

    /// 같은 ID가 있으면 최초 `created_at`을 유지하고 나머지 필드를 덮어씁니다.
    async fn upsert_news(&self, news: &News) -> Result<()> {
        let mut entries = self.news.write().await;
        let mut item = news.clone();
        if let Some(existing) = entries.get(&news.id) {
            item.created_at = existing.created_at;
        }
        entries.insert(item.id.clone(), item);
        Ok(())
    }
}
