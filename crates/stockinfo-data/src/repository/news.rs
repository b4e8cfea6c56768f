//! 뉴스 리포지토리.

use super::{CacheTier, CacheTtls};
use crate::cache::{keys, Cache};
use crate::error::{DataError, Result};
use crate::provider::NewsProvider;
use crate::storage::NewsStore;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use stockinfo_core::{MarketClock, News};
use tracing::{debug, info, instrument};

/// 캐시, 저장소, 뉴스 Provider를 조정하는 뉴스 리포지토리.
#[derive(Clone)]
pub struct NewsRepository {
    cache: CacheTier,
    store: Arc<dyn NewsStore>,
    provider: Arc<dyn NewsProvider>,
    ttls: CacheTtls,
    clock: MarketClock,
}

impl NewsRepository {
    pub fn new(
        store: Arc<dyn NewsStore>,
        provider: Arc<dyn NewsProvider>,
        cache: Option<Cache>,
        ttls: CacheTtls,
        clock: MarketClock,
    ) -> Self {
        Self {
            cache: CacheTier::new(cache),
            store,
            provider,
            ttls,
            clock,
        }
    }

    pub fn clock(&self) -> &MarketClock {
        &self.clock
    }

    /// ID로 뉴스를 조회합니다. Provider는 ID 조회를 지원하지 않습니다.
    #[instrument(skip(self))]
    pub async fn get_news(&self, id: &str) -> Result<News> {
        let key = keys::news(id);
        if let Some(news) = self.cache.get::<News>(&key).await {
            return Ok(news);
        }

        let news = self
            .store
            .find_news(id)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("news {}", id)))?;
        self.cache.put(&key, &news, self.ttls.news).await;
        Ok(news)
    }

    /// 시장 날짜 하루 동안 발행된 뉴스.
    ///
    /// 저장소가 비어 있고 오늘이면 Provider에서 가져오며, 과거 날짜는 빈 목록입니다.
    #[instrument(skip(self))]
    pub async fn get_news_by_date(&self, date: NaiveDate) -> Result<Vec<News>> {
        let key = keys::news_by_date(date);
        if let Some(news) = self.cache.get::<Vec<News>>(&key).await {
            return Ok(news);
        }

        let (start, end) = self.clock.day_bounds(date);
        let stored = self.store.find_published_between(start, end).await?;
        if !stored.is_empty() {
            self.cache.put(&key, &stored, self.ttls.news).await;
            return Ok(stored);
        }

        if !self.clock.is_today(date) {
            debug!("no stored news for past date");
            return Ok(Vec::new());
        }

        let fetched = self.provider.fetch_today(date).await?;
        self.persist(&fetched).await?;
        if !fetched.is_empty() {
            self.cache.put(&key, &fetched, self.ttls.news).await;
        }
        info!(count = fetched.len(), provider = self.provider.name(), "Fetched today's news");
        Ok(fetched)
    }

    pub async fn get_news_for_today(&self) -> Result<Vec<News>> {
        self.get_news_by_date(self.clock.today()).await
    }

    /// 키워드와 일치하는 뉴스.
    #[instrument(skip(self))]
    pub async fn get_news_by_keyword(&self, keyword: &str) -> Result<Vec<News>> {
        let key = keys::news_by_keyword(keyword);
        if let Some(news) = self.cache.get::<Vec<News>>(&key).await {
            return Ok(news);
        }

        let stored = self.store.search_news(keyword).await?;
        if !stored.is_empty() {
            self.cache.put(&key, &stored, self.ttls.news).await;
            return Ok(stored);
        }

        let fetched = self.provider.fetch_news(keyword, None, None).await?;
        self.persist(&fetched).await?;
        if !fetched.is_empty() {
            self.cache.put(&key, &fetched, self.ttls.news).await;
        }
        Ok(fetched)
    }

    /// 티커와 관련된 뉴스.
    ///
    /// Provider 결과는 검색어 일치 결과 그대로 반환합니다.
    #[instrument(skip(self))]
    pub async fn get_news_by_ticker(&self, ticker: &str) -> Result<Vec<News>> {
        let key = keys::news_by_ticker(ticker);
        if let Some(news) = self.cache.get::<Vec<News>>(&key).await {
            return Ok(news);
        }

        let stored = self.store.find_related(ticker).await?;
        if !stored.is_empty() {
            self.cache.put(&key, &stored, self.ttls.news).await;
            return Ok(stored);
        }

        let fetched = self.provider.fetch_news(ticker, None, None).await?;
        self.persist(&fetched).await?;
        if !fetched.is_empty() {
            self.cache.put(&key, &fetched, self.ttls.news).await;
        }
        Ok(fetched)
    }

    /// 오늘의 뉴스 중 주어진 티커 중 하나라도 관련된 뉴스.
    ///
    /// ID 기준으로 중복을 제거하며 처음 나타난 순서를 유지합니다.
    pub async fn get_news_for_tickers(&self, tickers: &[String]) -> Result<Vec<News>> {
        let today = self.get_news_for_today().await?;
        Ok(filter_related(today, tickers))
    }

    /// 뉴스를 저장하고 ID 캐시를 갱신합니다.
    pub async fn save_news(&self, news: &News) -> Result<()> {
        self.store.upsert_news(news).await?;
        self.cache
            .put(&keys::news(&news.id), news, self.ttls.news)
            .await;
        Ok(())
    }

    pub async fn save_news_collection(&self, news: &[News]) -> Result<()> {
        for item in news {
            self.save_news(item).await?;
        }
        Ok(())
    }

    /// Provider에서 오늘의 뉴스를 다시 가져오고 뉴스 캐시를 무효화합니다.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        let today = self.clock.today();
        let fetched = self.provider.fetch_today(today).await?;
        self.store_all(&fetched).await?;
        let invalidated = self.cache.invalidate(keys::NEWS_PREFIX).await;
        info!(refreshed = fetched.len(), invalidated, "News refreshed");
        Ok(fetched.len())
    }

    async fn persist(&self, news: &[News]) -> Result<()> {
        self.save_news_collection(news).await
    }

    async fn store_all(&self, news: &[News]) -> Result<()> {
        for item in news {
            self.store.upsert_news(item).await?;
        }
        Ok(())
    }
}

/// 티커 중 하나라도 관련된 뉴스만 남기고 ID 중복을 제거합니다.
pub fn filter_related(news: Vec<News>, tickers: &[String]) -> Vec<News> {
    let mut seen = HashSet::new();
    news.into_iter()
        .filter(|n| tickers.iter().any(|t| n.is_related_to(t)))
        .filter(|n| seen.insert(n.id.clone()))
        .collect()
}
