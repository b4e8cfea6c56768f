//! 도메인 서비스.
//!
//! 입력 검증과 기본값 정책(개수, 조회 기간)을 리포지토리 앞에서 처리합니다.
//! 검증은 I/O보다 먼저 수행됩니다.

pub mod news;
pub mod stock;

pub use news::NewsService;
pub use stock::StockService;

use crate::error::Result;
use stockinfo_core::normalize_ticker;

/// 티커 목록을 정규화합니다. 빈 항목은 건너뜁니다.
pub(crate) fn normalize_tickers(tickers: &[String]) -> Result<Vec<String>> {
    let normalized: Vec<String> = tickers
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| normalize_ticker(t))
        .collect::<std::result::Result<_, _>>()?;
    Ok(normalized)
}
