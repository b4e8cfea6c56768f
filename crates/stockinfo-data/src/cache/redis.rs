//! Redis 캐시 구현.
//!
//! 여러 프로세스가 같은 캐시를 공유해야 할 때 사용합니다.

use super::{normalize_pattern, CacheBackend};
use crate::error::{DataError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;
use tracing::{info, instrument};

/// Redis 연결 래퍼.
///
/// `MultiplexedConnection`은 복제해도 같은 연결을 공유하므로 명령마다
/// 복제본을 사용하며 요청 간 잠금이 없습니다.
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl RedisCache {
    /// 새로운 Redis 캐시 연결을 생성합니다.
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| DataError::Cache(e.to_string()))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::Cache(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self { connection })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Redis `SET EX`는 0초를 허용하지 않으므로 최소 1초로 올립니다.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn();
        let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn();
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn invalidate(&self, pattern: &str) -> Result<usize> {
        let pattern = normalize_pattern(pattern);
        let mut conn = self.conn();
        let keys: Vec<String> = conn.keys(&pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: i64 = conn.del(&keys).await?;
        Ok(deleted as usize)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.conn();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }
}
