//! # StockInfo Core
//!
//! 주식 시세/뉴스 조회 시스템의 핵심 도메인 모델과 공통 인프라를 제공합니다:
//! - 시세(`Stock`, `StockQuote`) 및 뉴스(`News`) 모델
//! - 순위 산출과 검색 헬퍼
//! - 뉴스 태그/티커 추출 및 기사 ID 생성
//! - 시장 타임존 기준 날짜 계산
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod market;
pub mod matching;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use market::MarketClock;
pub use matching::{news_id, MatchingVocabulary};
