//! StockInfo 명령줄 도구.
//!
//! 설정을 읽어 캐시, 저장소, Provider를 조립하고 시세/뉴스 조회를
//! 하위 명령으로 제공합니다. 결과는 JSON으로 출력합니다.

pub mod app;
pub mod cli;
pub mod stats;

pub use app::App;
pub use cli::{execute, run_daemon, Cli, Command};
pub use stats::{CacheHealth, HealthReport, RefreshStats};
