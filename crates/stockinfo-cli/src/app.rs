//! 설정에서 캐시, 저장소, Provider, 서비스를 조립합니다.

use crate::stats::{CacheHealth, HealthReport, RefreshStats};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use stockinfo_core::{AppConfig, CacheBackendKind, CacheConfig, MarketClock};
use stockinfo_data::{
    Cache, CacheTtls, Database, MemoryCache, MemoryNewsStore, MemoryStockStore, MoexClient,
    NewsApiClient, NewsProvider, NewsRepository, NewsService, NewsStore, PgNewsStore,
    PgStockStore, QuoteProvider, RedisCache, StockRepository, StockService, StockStore,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 조립된 애플리케이션.
pub struct App {
    pub stocks: StockService,
    pub news: NewsService,
    cache: Option<Cache>,
    database: Option<Database>,
    janitor: Option<JoinHandle<()>>,
}

impl App {
    /// 설정에 따라 백엔드를 선택하고 서비스를 생성합니다.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let (cache, janitor) = build_cache(&config.cache).await;

        let database = match config.database.url {
            Some(_) => {
                let db = Database::connect(&config.database)
                    .await
                    .context("데이터베이스 연결 실패")?;
                if config.database.run_migrations {
                    db.migrate().await.context("마이그레이션 실패")?;
                }
                Some(db)
            }
            None => {
                warn!("database.url 이 없어 메모리 저장소를 사용합니다 (재시작 시 데이터 소실)");
                None
            }
        };

        let (stock_store, news_store): (Arc<dyn StockStore>, Arc<dyn NewsStore>) = match &database
        {
            Some(db) => (
                Arc::new(PgStockStore::new(db.clone())),
                Arc::new(PgNewsStore::new(db.clone())),
            ),
            None => (
                Arc::new(MemoryStockStore::new()),
                Arc::new(MemoryNewsStore::new()),
            ),
        };

        let quotes: Arc<dyn QuoteProvider> =
            Arc::new(MoexClient::new(&config.moex).context("MOEX 클라이언트 생성 실패")?);
        let articles: Arc<dyn NewsProvider> = Arc::new(
            NewsApiClient::new(&config.news_api, config.matching.clone())
                .context("NewsAPI 클라이언트 생성 실패")?,
        );

        let clock = MarketClock::from_config(&config.market)?;
        let ttls = CacheTtls::from_config(&config.cache);

        let mut app = Self::from_parts(
            stock_store,
            news_store,
            quotes,
            articles,
            cache,
            ttls,
            clock,
            config.matching.known_tickers.clone(),
        );
        app.database = database;
        app.janitor = janitor;
        Ok(app)
    }

    /// 이미 만든 구성 요소로 서비스를 조립합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        stock_store: Arc<dyn StockStore>,
        news_store: Arc<dyn NewsStore>,
        quotes: Arc<dyn QuoteProvider>,
        articles: Arc<dyn NewsProvider>,
        cache: Option<Cache>,
        ttls: CacheTtls,
        clock: MarketClock,
        roster: Vec<String>,
    ) -> Self {
        let stock_repo = StockRepository::new(stock_store, quotes, cache.clone(), ttls, roster);
        let news_repo = NewsRepository::new(news_store, articles, cache.clone(), ttls, clock);

        Self {
            stocks: StockService::new(stock_repo, clock),
            news: NewsService::new(news_repo),
            cache,
            database: None,
            janitor: None,
        }
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// 종목과 뉴스를 모두 갱신합니다. 한 단계가 실패해도 다른 단계는 진행합니다.
    pub async fn refresh(&self) -> RefreshStats {
        let started = Instant::now();
        let mut stats = RefreshStats::new();

        match self.stocks.refresh_stock_data().await {
            Ok(count) => stats.stocks = count,
            Err(e) => {
                tracing::error!(error = %e, "종목 갱신 실패");
                stats.failed.push("stocks".to_string());
            }
        }

        match self.news.refresh_news().await {
            Ok(count) => stats.news = count,
            Err(e) => {
                tracing::error!(error = %e, "뉴스 갱신 실패");
                stats.failed.push("news".to_string());
            }
        }

        stats.elapsed = started.elapsed();
        if let Some(cache) = &self.cache {
            let cache_stats = cache.stats();
            debug!(
                hits = cache_stats.hits,
                misses = cache_stats.misses,
                hit_rate = format!("{:.2}", cache_stats.hit_rate),
                "캐시 통계"
            );
        }
        stats
    }

    /// 캐시와 데이터베이스 연결 상태를 점검합니다.
    pub async fn health(&self) -> HealthReport {
        let cache = match &self.cache {
            Some(cache) => {
                let healthy = match cache.health_check().await {
                    Ok(ok) => ok,
                    Err(e) => {
                        warn!(backend = cache.backend_name(), error = %e, "캐시 상태 점검 실패");
                        false
                    }
                };
                Some(CacheHealth {
                    backend: cache.backend_name(),
                    healthy,
                    stats: cache.stats(),
                })
            }
            None => None,
        };

        let database = match &self.database {
            Some(db) => Some(match db.health_check().await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!(error = %e, "데이터베이스 상태 점검 실패");
                    false
                }
            }),
            None => None,
        };

        HealthReport { cache, database }
    }

    /// 백그라운드 태스크를 정리하고 연결을 닫습니다.
    pub async fn shutdown(self) {
        if let Some(janitor) = self.janitor {
            janitor.abort();
        }
        if let Some(db) = self.database {
            db.pool().close().await;
        }
        info!("StockInfo 종료");
    }
}

/// 캐시 백엔드를 선택합니다.
///
/// Redis 연결에 실패하면 경고 후 메모리 캐시로 대체합니다.
async fn build_cache(config: &CacheConfig) -> (Option<Cache>, Option<JoinHandle<()>>) {
    if !config.enabled {
        info!("캐시 비활성화");
        return (None, None);
    }

    if config.backend == CacheBackendKind::Redis {
        if let Some(url) = config.redis_url.as_deref() {
            match RedisCache::connect(url).await {
                Ok(redis) => {
                    info!("Redis 캐시 사용");
                    return (Some(Cache::new(Arc::new(redis))), None);
                }
                Err(e) => warn!(error = %e, "Redis 연결 실패, 메모리 캐시로 대체합니다"),
            }
        }
    }

    let memory = MemoryCache::new();
    let janitor = memory.spawn_janitor(config.janitor_interval());
    info!(
        interval_secs = config.janitor_interval_secs,
        "메모리 캐시 사용"
    );
    (Some(Cache::new(Arc::new(memory))), Some(janitor))
}
