//! 프로세스 내 메모리 캐시.
//!
//! 만료된 항목은 읽을 때 없는 것으로 취급되며(수동 만료),
//! `purge_expired` 또는 janitor 태스크가 주기적으로 정리합니다.

use super::{glob_match, normalize_pattern, CacheBackend};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

const MIN_JANITOR_INTERVAL: Duration = Duration::from_secs(1);

/// `RwLock<HashMap>` 기반 메모리 캐시.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료된 항목을 삭제하고 삭제한 개수를 반환합니다.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// 저장된 항목 수 (만료되었지만 아직 정리되지 않은 항목 포함).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 주기적으로 만료 항목을 정리하는 백그라운드 태스크를 시작합니다.
    ///
    /// 반환된 핸들을 abort하면 정리가 중단됩니다. 주기는 최소 1초입니다.
    pub fn spawn_janitor(&self, interval: Duration) -> JoinHandle<()> {
        let interval = interval.max(MIN_JANITOR_INTERVAL);
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 첫 tick은 즉시 발생
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Purged expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn invalidate(&self, pattern: &str) -> Result<usize> {
        let pattern = normalize_pattern(pattern);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !glob_match(&pattern, key));
        Ok(before - entries.len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
