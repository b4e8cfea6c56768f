//! 계층형 리포지토리.
//!
//! 조회 순서는 캐시 → 저장소 → Provider이며, 놓친 계층은 돌아오면서 채웁니다.
//! 캐시 장애는 경고 로그를 남기고 미스로 취급합니다. 저장소와 Provider
//! 에러는 그대로 전파됩니다.

pub mod news;
pub mod stock;

pub use news::NewsRepository;
pub use stock::StockRepository;

use crate::cache::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use stockinfo_core::CacheConfig;
use tracing::{debug, warn};

/// 엔티티 종류별 캐시 TTL.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// 현재 시세, 전체 종목 목록
    pub stocks: Duration,
    /// 상세 시세, 시세 이력
    pub quotes: Duration,
    /// 뉴스
    pub news: Duration,
}

impl CacheTtls {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            stocks: config.stocks_ttl(),
            quotes: config.default_ttl(),
            news: config.news_ttl(),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// 장애를 미스로 흡수하는 캐시 계층.
#[derive(Debug, Clone, Default)]
pub(crate) struct CacheTier {
    cache: Option<Cache>,
}

impl CacheTier {
    pub(crate) fn new(cache: Option<Cache>) -> Self {
        Self { cache }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache.as_ref()?;
        match cache.get_json(key).await {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    pub(crate) async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_json(key, value, ttl).await {
                warn!(key, error = %e, "Cache write failed");
            }
        }
    }

    pub(crate) async fn remove(&self, key: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(key).await {
                warn!(key, error = %e, "Cache delete failed");
            }
        }
    }

    /// 패턴에 맞는 키를 무효화하고 삭제한 개수를 반환합니다.
    pub(crate) async fn invalidate(&self, pattern: &str) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        match cache.invalidate(pattern).await {
            Ok(count) => count,
            Err(e) => {
                warn!(pattern, error = %e, "Cache invalidation failed");
                0
            }
        }
    }
}
