//! 계층형 조회 통합 테스트
//!
//! 캐시 → 저장소 → Provider 순서와 장애 시 동작을 메모리 구현과
//! 스텁 Provider로 검증합니다.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stockinfo_core::{news_id, MarketClock, MatchingVocabulary, News, Stock, StockQuote};
use stockinfo_data::{
    Cache, CacheBackend, CacheTtls, DataError, MemoryNewsStore, MemoryStockStore, NewsProvider,
    NewsRepository, NewsService, NewsStore, QuoteProvider, Result, StockRepository, StockService,
    StockStore,
};

// =============================================================================
// 테스트 더블
// =============================================================================

/// 호출 횟수를 세고, 비활성화되면 실패하는 시세 Provider.
#[derive(Default)]
struct StubQuotes {
    stocks: Vec<Stock>,
    calls: AtomicUsize,
    disabled: AtomicBool,
}

impl StubQuotes {
    fn with(stocks: Vec<Stock>) -> Arc<Self> {
        Arc::new(Self {
            stocks,
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }

    fn hit(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.disabled.load(Ordering::SeqCst) {
            return Err(DataError::upstream("stub", "provider disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for StubQuotes {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        self.hit()?;
        Ok(self.stocks.iter().find(|s| s.ticker == ticker).cloned())
    }

    async fn fetch_stocks(&self, tickers: &[String]) -> Result<Vec<Stock>> {
        self.hit()?;
        Ok(self
            .stocks
            .iter()
            .filter(|s| tickers.contains(&s.ticker))
            .cloned()
            .collect())
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        _till: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        self.hit()?;
        Ok(vec![StockQuote {
            close: dec!(170),
            ..StockQuote::new(ticker, from)
        }])
    }
}

/// 응답 전에 오래 대기하는 시세 Provider.
struct SlowQuotes {
    delay: Duration,
}

#[async_trait]
impl QuoteProvider for SlowQuotes {
    fn name(&self) -> &str {
        "slow"
    }

    async fn fetch_stock(&self, _ticker: &str) -> Result<Option<Stock>> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(gazp()))
    }

    async fn fetch_stocks(&self, _tickers: &[String]) -> Result<Vec<Stock>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![gazp()])
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        _till: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![StockQuote::new(ticker, from)])
    }
}

/// 항상 실패하는 캐시 백엔드.
struct BrokenCache;

#[async_trait]
impl CacheBackend for BrokenCache {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<String>> {
        Err(DataError::Cache("connection reset".to_string()))
    }

    async fn set_raw(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        Err(DataError::Cache("connection reset".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(DataError::Cache("connection reset".to_string()))
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Err(DataError::Cache("connection reset".to_string()))
    }

    async fn invalidate(&self, _pattern: &str) -> Result<usize> {
        Err(DataError::Cache("connection reset".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }
}

/// 항상 실패하는 뉴스 Provider.
struct DownNews;

#[async_trait]
impl NewsProvider for DownNews {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_news(
        &self,
        _query: &str,
        _from: Option<NaiveDate>,
        _to: Option<NaiveDate>,
    ) -> Result<Vec<News>> {
        Err(DataError::upstream("down", "HTTP 503"))
    }

    async fn fetch_today(&self, _today: NaiveDate) -> Result<Vec<News>> {
        Err(DataError::upstream("down", "HTTP 503"))
    }
}

fn gazp() -> Stock {
    Stock {
        price: dec!(162.4),
        change: dec!(-1.1),
        change_perc: dec!(-0.67),
        volume: 12_500_000,
        ..Stock::new("GAZP", "Газпром")
    }
}

fn stock_repo(
    provider: Arc<StubQuotes>,
    store: MemoryStockStore,
    cache: Option<Cache>,
) -> StockRepository {
    StockRepository::new(
        Arc::new(store),
        provider,
        cache,
        CacheTtls::default(),
        MatchingVocabulary::default().known_tickers,
    )
}

// =============================================================================
// 시세
// =============================================================================

#[tokio::test]
async fn test_seeded_store_cold_cache_skips_provider() {
    let provider = StubQuotes::with(vec![gazp()]);
    let store = MemoryStockStore::new();
    let mut seeded = gazp();
    seeded.price = dec!(150);
    store.upsert_stock(&seeded).await.unwrap();

    let cache = Cache::memory();
    let repo = stock_repo(provider.clone(), store, Some(cache.clone()));

    let stock = repo.get_stock("GAZP").await.unwrap();
    assert_eq!(stock.price, dec!(150));
    assert_eq!(provider.calls(), 0);
    assert!(cache.exists("stock:GAZP").await.unwrap());
}

#[tokio::test]
async fn test_cold_system_populates_store_and_cache() {
    let provider = StubQuotes::with(vec![gazp()]);
    let store = MemoryStockStore::new();
    let cache = Cache::memory();
    let repo = stock_repo(provider.clone(), store.clone(), Some(cache.clone()));

    let first = repo.get_stock("GAZP").await.unwrap();
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.find_stock("GAZP").await.unwrap(), Some(first.clone()));
    assert!(cache.exists("stock:GAZP").await.unwrap());

    let second = repo.get_stock("GAZP").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_gazp_served_after_provider_goes_down() {
    let provider = StubQuotes::with(vec![gazp()]);
    let store = MemoryStockStore::new();
    let cache = Cache::memory();
    let repo = stock_repo(provider.clone(), store.clone(), Some(cache.clone()));
    let service = StockService::new(repo.clone(), MarketClock::default());

    service.get_stock_info("gazp").await.unwrap();
    provider.disable();

    // 캐시에서
    assert_eq!(
        service.get_stock_info("GAZP").await.unwrap().volume,
        12_500_000
    );

    // 캐시를 비워도 저장소에서
    cache.invalidate("stock:").await.unwrap();
    assert_eq!(service.get_stock_info("GAZP").await.unwrap().price, dec!(162.4));
    assert_eq!(provider.calls(), 1);

    // 처음 보는 티커는 Provider 에러가 그대로 전파됨
    let err = service.get_stock_info("SBER").await.unwrap_err();
    assert!(matches!(err, DataError::Upstream { .. }));
    assert!(store.find_stock("SBER").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_failure_degrades_to_miss() {
    let provider = StubQuotes::with(vec![gazp()]);
    let store = MemoryStockStore::new();
    let broken = Cache::new(Arc::new(BrokenCache));
    let repo = stock_repo(provider.clone(), store.clone(), Some(broken));

    let stock = repo.get_stock("GAZP").await.unwrap();
    assert_eq!(stock.ticker, "GAZP");
    assert!(store.find_stock("GAZP").await.unwrap().is_some());

    // 캐시는 계속 실패하지만 저장소가 응답하므로 Provider는 한 번만 호출됨
    repo.get_stock("GAZP").await.unwrap();
    assert_eq!(provider.calls(), 1);

    assert_eq!(repo.refresh().await.unwrap(), 1);
}

#[tokio::test]
async fn test_provider_failure_writes_nothing() {
    let provider = StubQuotes::with(vec![gazp()]);
    provider.disable();
    let store = MemoryStockStore::new();
    let cache = Cache::memory();
    let repo = stock_repo(provider.clone(), store.clone(), Some(cache.clone()));

    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert!(repo.get_stock("GAZP").await.is_err());
    assert!(repo.get_stock_quote("GAZP", date).await.is_err());
    assert!(repo.top_gainers(5).await.is_err());

    assert!(store.all_stocks().await.unwrap().is_empty());
    assert!(store.find_quote("GAZP", date).await.unwrap().is_none());
    assert!(!cache.exists("stock:GAZP").await.unwrap());
    assert!(!cache.exists("stocks:all").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_fetch_writes_nothing() {
    let store = MemoryStockStore::new();
    let cache = Cache::memory();
    let repo = StockRepository::new(
        Arc::new(store.clone()),
        Arc::new(SlowQuotes {
            delay: Duration::from_secs(5),
        }),
        Some(cache.clone()),
        CacheTtls::default(),
        vec!["GAZP".to_string()],
    );

    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let limit = Duration::from_secs(1);
    assert!(tokio::time::timeout(limit, repo.get_stock("GAZP")).await.is_err());
    assert!(tokio::time::timeout(limit, repo.get_stock_quote("GAZP", date))
        .await
        .is_err());
    assert!(tokio::time::timeout(limit, repo.top_gainers(5)).await.is_err());

    // Provider가 응답했을 시점 이후에도 아무것도 기록되지 않음
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(store.find_stock("GAZP").await.unwrap().is_none());
    assert!(store.all_stocks().await.unwrap().is_empty());
    assert!(store.find_quote("GAZP", date).await.unwrap().is_none());
    assert!(!cache.exists("stock:GAZP").await.unwrap());
    assert!(!cache.exists("stocks:all").await.unwrap());
    assert_eq!(cache.invalidate("*").await.unwrap(), 0);
}

#[tokio::test]
async fn test_ranking_over_roster() {
    let provider = StubQuotes::with(vec![
        Stock {
            change_perc: dec!(2.0),
            ..Stock::new("SBER", "Сбербанк")
        },
        gazp(),
        Stock {
            change_perc: dec!(0.5),
            volume: 90_000_000,
            ..Stock::new("VTBR", "ВТБ")
        },
    ]);
    let repo = stock_repo(provider.clone(), MemoryStockStore::new(), Some(Cache::memory()));

    let gainers = repo.top_gainers(2).await.unwrap();
    assert_eq!(gainers[0].ticker, "SBER");
    assert_eq!(gainers[1].ticker, "VTBR");

    let losers = repo.top_losers(10).await.unwrap();
    assert_eq!(losers.len(), 3);
    assert_eq!(losers[0].ticker, "GAZP");
    assert!(losers.windows(2).all(|w| w[0].change_perc <= w[1].change_perc));

    assert_eq!(repo.top_volume(1).await.unwrap()[0].ticker, "VTBR");
    assert_eq!(provider.calls(), 1);
    assert_eq!(repo.top_gainers(0).await.unwrap().len(), 3);
}

// =============================================================================
// 뉴스
// =============================================================================

fn news_item(url: &str, title: &str) -> News {
    let vocabulary = MatchingVocabulary::default();
    let now = Utc::now();
    News {
        id: news_id(url),
        title: title.to_string(),
        description: String::new(),
        content: String::new(),
        url: url.to_string(),
        source: "Коммерсантъ".to_string(),
        published_at: now,
        created_at: now,
        tags: vocabulary.extract_tags(title),
        related_to: vocabulary.extract_tickers(title),
    }
}

#[tokio::test]
async fn test_news_provider_failure_propagates_without_writes() {
    let store = MemoryNewsStore::new();
    let cache = Cache::memory();
    let repo = NewsRepository::new(
        Arc::new(store.clone()),
        Arc::new(DownNews),
        Some(cache.clone()),
        CacheTtls::default(),
        MarketClock::default(),
    );
    let service = NewsService::new(repo);

    assert!(matches!(
        service.get_today_news().await,
        Err(DataError::Upstream { .. })
    ));
    assert!(service.search_news_by_keyword("нефть").await.is_err());
    assert_eq!(cache.invalidate("news:").await.unwrap(), 0);
    assert!(store.search_news("нефть").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_news_served_without_provider() {
    let store = MemoryNewsStore::new();
    let item = news_item(
        "https://www.kommersant.ru/doc/123456",
        "SBER и GAZP: акции растут",
    );
    store.upsert_news(&item).await.unwrap();
    // 같은 URL을 다시 저장해도 레코드는 하나
    store
        .upsert_news(&news_item(&item.url, "SBER и GAZP: акции растут"))
        .await
        .unwrap();

    let repo = NewsRepository::new(
        Arc::new(store),
        Arc::new(DownNews),
        Some(Cache::memory()),
        CacheTtls::default(),
        MarketClock::default(),
    );
    let service = NewsService::new(repo);

    assert_eq!(service.get_today_news().await.unwrap().len(), 1);
    assert_eq!(service.get_news_by_id(&item.id).await.unwrap().url, item.url);
    assert_eq!(service.get_news_for_ticker("gazp").await.unwrap().len(), 1);

    let tickers = vec!["SBER".to_string(), "GAZP".to_string()];
    let related = service
        .get_news_for_multiple_tickers(&tickers)
        .await
        .unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, item.id);
}
