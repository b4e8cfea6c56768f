//! 캐싱 레이어.
//!
//! - `CacheBackend`: 원시 JSON 문자열을 다루는 백엔드 trait (Redis, 메모리)
//! - `Cache`: serde_json 기반 타입 파사드 + 적중률 통계
//! - `keys`: 엔티티 종류별 캐시 키

pub mod keys;
pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 캐시 백엔드.
///
/// 캐시 미스는 `Ok(None)`이며 에러는 백엔드 장애에만 사용합니다.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 백엔드 이름 (로그용).
    fn name(&self) -> &'static str;

    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// 값을 덮어씁니다.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// 패턴에 맞는 키를 모두 삭제하고 삭제한 개수를 반환합니다.
    ///
    /// `*`, `?` 글롭을 지원하며 와일드카드가 없으면 접두사로 취급합니다.
    async fn invalidate(&self, pattern: &str) -> Result<usize>;

    async fn health_check(&self) -> Result<bool>;
}

/// 와일드카드가 없는 패턴을 접두사 글롭으로 바꿉니다.
pub fn normalize_pattern(pattern: &str) -> String {
    if pattern.contains('*') || pattern.contains('?') {
        pattern.to_string()
    } else {
        format!("{}*", pattern)
    }
}

/// `*`(0개 이상), `?`(정확히 1개) 글롭 매칭.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

// =============================================================================
// 타입 파사드
// =============================================================================

/// 캐시 통계.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// JSON 직렬화를 담당하는 캐시 파사드.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 메모리 백엔드 캐시를 생성합니다.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// 캐시에서 값을 가져와 역직렬화합니다.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.backend.get_raw(key).await?;
        match raw {
            Some(json) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// 값을 직렬화하여 TTL과 함께 저장합니다.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set_raw(key, json, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.backend.exists(key).await
    }

    pub async fn invalidate(&self, pattern: &str) -> Result<usize> {
        self.backend.invalidate(pattern).await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// 캐시 통계를 가져옵니다.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .finish()
    }
}
