//! 갱신 작업 통계와 상태 점검 결과.

use serde::Serialize;
use std::time::Duration;
use stockinfo_data::CacheStats;

/// `refresh` 한 회차의 결과.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStats {
    /// 다시 가져온 종목 수
    pub stocks: usize,
    /// 다시 가져온 뉴스 수
    pub news: usize,
    /// 실패한 단계 (stocks, news)
    pub failed: Vec<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RefreshStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        if self.is_success() {
            tracing::info!(
                operation = operation,
                stocks = self.stocks,
                news = self.news,
                elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
                "갱신 완료"
            );
        } else {
            tracing::warn!(
                operation = operation,
                stocks = self.stocks,
                news = self.news,
                failed = ?self.failed,
                elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
                "갱신 일부 실패"
            );
        }
    }
}

/// 캐시 백엔드 상태.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    pub backend: &'static str,
    pub healthy: bool,
    pub stats: CacheStats,
}

/// `health` 명령 결과. 구성되지 않은 구성 요소는 `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub cache: Option<CacheHealth>,
    pub database: Option<bool>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.cache.as_ref().map_or(true, |c| c.healthy) && self.database.unwrap_or(true)
    }
}
