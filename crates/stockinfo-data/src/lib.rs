//! 시세/뉴스 데이터 접근 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 캐시 포트 (Redis, 메모리)와 JSON 파사드
//! - 영구 저장소 포트 (PostgreSQL, 메모리)
//! - 외부 Provider (MOEX ISS 시세, NewsAPI 뉴스)
//! - 캐시 → 저장소 → Provider 순서의 계층형 리포지토리
//! - 입력 검증과 기본값을 담당하는 도메인 서비스

pub mod cache;
pub mod error;
pub mod provider;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::{DataError, Result};

// 캐시 재내보내기
pub use cache::{Cache, CacheBackend, CacheStats, MemoryCache, RedisCache};

// 저장소 재내보내기
pub use storage::{
    Database, MemoryNewsStore, MemoryStockStore, NewsStore, PgNewsStore, PgStockStore, StockStore,
};

// Provider 재내보내기
pub use provider::{MoexClient, NewsApiClient, NewsProvider, QuoteProvider};

// 리포지토리 및 서비스 재내보내기
pub use repository::{CacheTtls, NewsRepository, StockRepository};
pub use service::{NewsService, StockService};
