//! 시세 서비스.

use super::normalize_tickers;
use crate::error::{DataError, Result};
use crate::repository::StockRepository;
use chrono::NaiveDate;
use stockinfo_core::{normalize_ticker, MarketClock, Stock, StockQuote};

/// 시세 조회 서비스.
#[derive(Clone)]
pub struct StockService {
    repository: StockRepository,
    clock: MarketClock,
}

impl StockService {
    pub fn new(repository: StockRepository, clock: MarketClock) -> Self {
        Self { repository, clock }
    }

    /// 단일 종목 현재 시세.
    pub async fn get_stock_info(&self, ticker: &str) -> Result<Stock> {
        let ticker = normalize_ticker(ticker)?;
        self.repository.get_stock(&ticker).await
    }

    /// 여러 종목 현재 시세 (입력 순서 유지).
    pub async fn get_multiple_stocks(&self, tickers: &[String]) -> Result<Vec<Stock>> {
        let tickers = normalize_tickers(tickers)?;
        if tickers.is_empty() {
            return Err(DataError::Validation("티커 목록이 비어 있습니다".to_string()));
        }
        self.repository.get_stocks(&tickers).await
    }

    /// 상세 시세. 날짜를 생략하면 시장 기준 오늘.
    pub async fn get_stock_quote(&self, ticker: &str, date: Option<NaiveDate>) -> Result<StockQuote> {
        let ticker = normalize_ticker(ticker)?;
        let date = date.unwrap_or_else(|| self.clock.today());
        self.repository.get_stock_quote(&ticker, date).await
    }

    /// 일별 시세 이력.
    ///
    /// 종료일 기본값은 오늘, 시작일 기본값은 종료일 한 달 전입니다.
    pub async fn get_stock_historical_data(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<StockQuote>> {
        let ticker = normalize_ticker(ticker)?;
        let end = end.unwrap_or_else(|| self.clock.today());
        let start = start.unwrap_or_else(|| self.clock.default_history_range(end).0);
        if start > end {
            return Err(DataError::Validation(format!(
                "시작일({})이 종료일({})보다 늦습니다",
                start, end
            )));
        }
        self.repository.get_stock_history(&ticker, start, end).await
    }

    pub async fn get_top_gainers(&self, limit: i64) -> Result<Vec<Stock>> {
        self.repository.top_gainers(limit).await
    }

    pub async fn get_top_losers(&self, limit: i64) -> Result<Vec<Stock>> {
        self.repository.top_losers(limit).await
    }

    pub async fn get_top_volume(&self, limit: i64) -> Result<Vec<Stock>> {
        self.repository.top_volume(limit).await
    }

    /// 티커/이름 검색.
    pub async fn search_stocks(&self, query: &str) -> Result<Vec<Stock>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DataError::Validation("검색어가 비어 있습니다".to_string()));
        }
        self.repository.search_stocks(query).await
    }

    /// 기본 종목 시세를 다시 가져옵니다.
    pub async fn refresh_stock_data(&self) -> Result<usize> {
        self.repository.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::QuoteProvider;
    use crate::repository::CacheTtls;
    use crate::storage::{MemoryStockStore, StockStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 호출되면 안 되는 Provider. 호출 횟수만 기록합니다.
    #[derive(Default)]
    struct Untouched {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for Untouched {
        fn name(&self) -> &str {
            "untouched"
        }

        async fn fetch_stock(&self, _ticker: &str) -> Result<Option<Stock>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn fetch_stocks(&self, _tickers: &[String]) -> Result<Vec<Stock>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_history(
            &self,
            _ticker: &str,
            _from: NaiveDate,
            _till: NaiveDate,
        ) -> Result<Vec<StockQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn service() -> (StockService, Arc<Untouched>, MemoryStockStore) {
        let provider = Arc::new(Untouched::default());
        let store = MemoryStockStore::new();
        let repository = StockRepository::new(
            Arc::new(store.clone()),
            provider.clone(),
            None,
            CacheTtls::default(),
            Vec::new(),
        );
        (
            StockService::new(repository, MarketClock::default()),
            provider,
            store,
        )
    }

    #[tokio::test]
    async fn test_validation_before_io() {
        let (service, provider, _) = service();

        assert!(service.get_stock_info("  ").await.unwrap_err().is_validation());
        assert!(service.get_multiple_stocks(&[]).await.unwrap_err().is_validation());
        assert!(service
            .get_multiple_stocks(&[" ".to_string()])
            .await
            .unwrap_err()
            .is_validation());
        assert!(service.search_stocks("").await.unwrap_err().is_validation());

        let later = NaiveDate::from_ymd_opt(2024, 3, 10);
        let earlier = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(service
            .get_stock_historical_data("SBER", later, earlier)
            .await
            .unwrap_err()
            .is_validation());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ticker_normalized() {
        let (service, provider, store) = service();
        store
            .upsert_stock(&Stock::new("SBER", "Сбербанк"))
            .await
            .unwrap();

        let stock = service.get_stock_info(" sber ").await.unwrap();
        assert_eq!(stock.ticker, "SBER");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_default_range() {
        let (service, _, store) = service();
        let today = MarketClock::default().today();
        let mut quote = StockQuote::new("GAZP", today);
        quote.volume = 10;
        store.upsert_quote(&quote).await.unwrap();

        let history = service
            .get_stock_historical_data("gazp", None, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, today);
    }
}
