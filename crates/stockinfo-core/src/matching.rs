//! 뉴스 텍스트 매칭.
//!
//! 기사 제목/요약에서 금융 용어 태그와 관련 티커를 추출하고,
//! URL에서 안정적인 기사 ID를 만듭니다. 모든 함수는 순수 함수입니다.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// ID 뒤에 붙는 URL 다이제스트 길이 (hex 문자 수).
const ID_DIGEST_LEN: usize = 12;

/// 태그/티커 추출에 사용하는 어휘.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingVocabulary {
    /// 관련 티커로 인식할 종목 코드 (전체 종목 조회 시 기본 목록이기도 함)
    #[serde(default = "default_known_tickers")]
    pub known_tickers: Vec<String>,
    /// 태그로 인식할 금융 용어
    #[serde(default = "default_financial_terms")]
    pub financial_terms: Vec<String>,
}

fn default_known_tickers() -> Vec<String> {
    [
        "SBER", "GAZP", "LKOH", "GMKN", "ROSN", "NVTK", "TATN", "MTSS", "MGNT", "YNDX", "FIVE",
        "POLY", "ALRS", "VTBR",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_financial_terms() -> Vec<String> {
    [
        "акции",
        "облигации",
        "биржа",
        "MOEX",
        "инвестиции",
        "дивиденды",
        "экономика",
        "финансы",
        "рынок",
        "котировки",
        "банк",
        "валюта",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for MatchingVocabulary {
    fn default() -> Self {
        Self {
            known_tickers: default_known_tickers(),
            financial_terms: default_financial_terms(),
        }
    }
}

impl MatchingVocabulary {
    /// 텍스트에 (대소문자 무시) 포함된 금융 용어를 어휘 순서대로 반환합니다.
    pub fn extract_tags(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.financial_terms
            .iter()
            .filter(|term| lower.contains(&term.to_lowercase()))
            .cloned()
            .collect()
    }

    /// 대문자로 변환한 텍스트에 포함된 알려진 티커를 반환합니다.
    pub fn extract_tickers(&self, text: &str) -> Vec<String> {
        let upper = text.to_uppercase();
        self.known_tickers
            .iter()
            .filter(|ticker| upper.contains(ticker.to_uppercase().as_str()))
            .cloned()
            .collect()
    }
}

/// URL에서 기사 ID를 만듭니다.
///
/// 마지막 경로 조각에서 쿼리, 프래그먼트, 확장자를 떼고 슬러그로 만든 뒤
/// URL 전체의 SHA-256 앞 12자를 붙입니다 (`{slug}-{hash}`).
/// 경로 조각이 없으면 `news-{hash}`, 빈 URL이면 `news_{unix_ts}`입니다.
pub fn news_id(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return format!("news_{}", Utc::now().timestamp());
    }

    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let hash = &digest[..ID_DIGEST_LEN];

    match slug(last_segment(url)) {
        Some(slug) => format!("{}-{}", slug, hash),
        None => format!("news-{}", hash),
    }
}

fn last_segment(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let path = match without_query.find("://") {
        Some(idx) => {
            let rest = &without_query[idx + 3..];
            // 호스트 부분은 경로 조각이 아님
            rest.find('/').map(|i| &rest[i..]).unwrap_or_default()
        }
        None => without_query,
    };
    let segment = path
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_default();
    segment.split('.').next().unwrap_or_default()
}

fn slug(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    for ch in segment.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
