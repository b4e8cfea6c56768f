//! 시세 리포지토리.

use super::{CacheTier, CacheTtls};
use crate::cache::{keys, Cache};
use crate::error::{DataError, Result};
use crate::provider::QuoteProvider;
use crate::storage::StockStore;
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use stockinfo_core::{rank_stocks, RankBy, Stock, StockQuote};
use tracing::{debug, info, instrument};

/// 캐시, 저장소, 시세 Provider를 조정하는 시세 리포지토리.
#[derive(Clone)]
pub struct StockRepository {
    cache: CacheTier,
    store: Arc<dyn StockStore>,
    provider: Arc<dyn QuoteProvider>,
    ttls: CacheTtls,
    /// 전체 종목 조회 시 Provider에 요청할 티커 목록
    roster: Vec<String>,
}

impl StockRepository {
    pub fn new(
        store: Arc<dyn StockStore>,
        provider: Arc<dyn QuoteProvider>,
        cache: Option<Cache>,
        ttls: CacheTtls,
        roster: Vec<String>,
    ) -> Self {
        Self {
            cache: CacheTier::new(cache),
            store,
            provider,
            ttls,
            roster,
        }
    }

    /// 티커로 현재 시세를 조회합니다.
    #[instrument(skip(self))]
    pub async fn get_stock(&self, ticker: &str) -> Result<Stock> {
        let key = keys::stock(ticker);
        if let Some(stock) = self.cache.get::<Stock>(&key).await {
            return Ok(stock);
        }

        if let Some(stock) = self.store.find_stock(ticker).await? {
            debug!("store hit");
            self.cache.put(&key, &stock, self.ttls.stocks).await;
            return Ok(stock);
        }

        let stock = self
            .provider
            .fetch_stock(ticker)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("stock {}", ticker)))?;

        self.store.upsert_stock(&stock).await?;
        self.cache.put(&key, &stock, self.ttls.stocks).await;
        info!(provider = self.provider.name(), "Fetched stock from provider");
        Ok(stock)
    }

    /// 여러 종목을 조회합니다.
    ///
    /// 빈 목록이면 전체 종목을 반환합니다. 그 외에는 종목별 조회를 동시에
    /// 실행하고 입력 순서대로 반환하며, 처음 발생한 에러가 전체 결과가 됩니다.
    #[instrument(skip(self), fields(count = tickers.len()))]
    pub async fn get_stocks(&self, tickers: &[String]) -> Result<Vec<Stock>> {
        if tickers.is_empty() {
            return self.universe().await;
        }
        try_join_all(tickers.iter().map(|t| self.get_stock(t))).await
    }

    async fn universe(&self) -> Result<Vec<Stock>> {
        if let Some(stocks) = self.cache.get::<Vec<Stock>>(keys::ALL_STOCKS).await {
            return Ok(stocks);
        }

        let stored = self.store.all_stocks().await?;
        if !stored.is_empty() {
            self.cache
                .put(keys::ALL_STOCKS, &stored, self.ttls.stocks)
                .await;
            return Ok(stored);
        }

        let mut fetched = self.fetch_roster().await?;
        fetched.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        if !fetched.is_empty() {
            self.cache
                .put(keys::ALL_STOCKS, &fetched, self.ttls.stocks)
                .await;
        }
        Ok(fetched)
    }

    /// Provider에서 기본 종목 목록을 가져와 저장하고 종목별 캐시를 채웁니다.
    async fn fetch_roster(&self) -> Result<Vec<Stock>> {
        let stocks = self.fetch_roster_into_store().await?;
        self.cache_each(&stocks).await;
        Ok(stocks)
    }

    async fn fetch_roster_into_store(&self) -> Result<Vec<Stock>> {
        let stocks = self.provider.fetch_stocks(&self.roster).await?;
        for stock in &stocks {
            self.store.upsert_stock(stock).await?;
        }
        Ok(stocks)
    }

    async fn cache_each(&self, stocks: &[Stock]) {
        for stock in stocks {
            self.cache
                .put(&keys::stock(&stock.ticker), stock, self.ttls.stocks)
                .await;
        }
    }

    /// 특정 거래일의 상세 시세를 조회합니다.
    #[instrument(skip(self))]
    pub async fn get_stock_quote(&self, ticker: &str, date: NaiveDate) -> Result<StockQuote> {
        let key = keys::stock_quote(ticker, date);
        if let Some(quote) = self.cache.get::<StockQuote>(&key).await {
            return Ok(quote);
        }

        if let Some(quote) = self.store.find_quote(ticker, date).await? {
            self.cache.put(&key, &quote, self.ttls.quotes).await;
            return Ok(quote);
        }

        let quotes = self.provider.fetch_history(ticker, date, date).await?;
        for quote in &quotes {
            self.store.upsert_quote(quote).await?;
        }
        let quote = quotes
            .into_iter()
            .find(|q| q.date == date)
            .ok_or_else(|| DataError::NotFound(format!("quote {} on {}", ticker, date)))?;

        self.cache.put(&key, &quote, self.ttls.quotes).await;
        Ok(quote)
    }

    /// `[start, end]` 구간의 일별 시세를 조회합니다.
    #[instrument(skip(self))]
    pub async fn get_stock_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        let key = keys::stock_history(ticker, start, end);
        if let Some(quotes) = self.cache.get::<Vec<StockQuote>>(&key).await {
            return Ok(quotes);
        }

        let stored = self.store.find_quotes(ticker, start, end).await?;
        if !stored.is_empty() {
            self.cache.put(&key, &stored, self.ttls.quotes).await;
            return Ok(stored);
        }

        let quotes = self.provider.fetch_history(ticker, start, end).await?;
        for quote in &quotes {
            self.store.upsert_quote(quote).await?;
        }
        if !quotes.is_empty() {
            self.cache.put(&key, &quotes, self.ttls.quotes).await;
        }
        Ok(quotes)
    }

    /// 현재 시세를 저장합니다. `updated_at`은 저장 시각으로 갱신됩니다.
    pub async fn save_stock(&self, stock: &Stock) -> Result<Stock> {
        let mut stock = stock.clone();
        stock.updated_at = Utc::now();
        self.store.upsert_stock(&stock).await?;
        self.cache
            .put(&keys::stock(&stock.ticker), &stock, self.ttls.stocks)
            .await;
        self.cache.remove(keys::ALL_STOCKS).await;
        Ok(stock)
    }

    pub async fn save_stock_quote(&self, quote: &StockQuote) -> Result<()> {
        self.store.upsert_quote(quote).await?;
        self.cache
            .put(
                &keys::stock_quote(&quote.ticker, quote.date),
                quote,
                self.ttls.quotes,
            )
            .await;
        Ok(())
    }

    pub async fn save_stock_quotes(&self, quotes: &[StockQuote]) -> Result<()> {
        for quote in quotes {
            self.save_stock_quote(quote).await?;
        }
        Ok(())
    }

    /// 전체 종목을 기준에 따라 정렬해 상위 `limit`개를 반환합니다.
    pub async fn rank(&self, by: RankBy, limit: i64) -> Result<Vec<Stock>> {
        let universe = self.get_stocks(&[]).await?;
        Ok(rank_stocks(universe, by, limit))
    }

    pub async fn top_gainers(&self, limit: i64) -> Result<Vec<Stock>> {
        self.rank(RankBy::Gainers, limit).await
    }

    pub async fn top_losers(&self, limit: i64) -> Result<Vec<Stock>> {
        self.rank(RankBy::Losers, limit).await
    }

    pub async fn top_volume(&self, limit: i64) -> Result<Vec<Stock>> {
        self.rank(RankBy::Volume, limit).await
    }

    /// 티커 또는 이름에 검색어가 포함된 종목 (대소문자 무시).
    pub async fn search_stocks(&self, query: &str) -> Result<Vec<Stock>> {
        let universe = self.get_stocks(&[]).await?;
        Ok(universe
            .into_iter()
            .filter(|s| s.matches_query(query))
            .collect())
    }

    /// Provider에서 기본 종목 목록을 다시 가져옵니다.
    ///
    /// 시세 캐시 전체를 무효화한 뒤 새로 가져온 종목만 다시 캐시합니다.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        let stocks = self.fetch_roster_into_store().await?;
        let invalidated = self.cache.invalidate(keys::STOCK_PREFIX).await;
        self.cache_each(&stocks).await;
        info!(
            refreshed = stocks.len(),
            invalidated, "Stock data refreshed"
        );
        Ok(stocks.len())
    }
}
