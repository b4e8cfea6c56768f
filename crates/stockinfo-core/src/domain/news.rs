//! 금융 뉴스 도메인 모델.

use crate::domain::stock::contains_ignore_case;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 금융 뉴스 기사.
///
/// `id`는 `url`에서 결정적으로 파생되므로 같은 기사를 다시 수집해도
/// 중복 레코드가 생기지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct News {
    /// 기사 ID (URL 기반)
    pub id: String,
    /// 제목
    pub title: String,
    /// 요약
    pub description: String,
    /// 본문
    pub content: String,
    /// 원문 URL
    pub url: String,
    /// 발행처 이름
    pub source: String,
    /// 발행 시각
    pub published_at: DateTime<Utc>,
    /// 수집 시각
    pub created_at: DateTime<Utc>,
    /// 금융 용어 태그
    #[serde(default)]
    pub tags: Vec<String>,
    /// 관련 티커
    #[serde(default)]
    pub related_to: Vec<String>,
}

impl News {
    /// 기사가 해당 티커와 관련되어 있는지 확인합니다.
    ///
    /// `related_to`에 포함되어 있거나(대소문자 무시) 제목, 요약, 본문 중
    /// 하나에 티커가 등장하면 관련된 것으로 봅니다.
    pub fn is_related_to(&self, ticker: &str) -> bool {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return false;
        }
        self.related_to
            .iter()
            .any(|t| t.eq_ignore_ascii_case(ticker))
            || self.text_contains(ticker)
    }

    /// 키워드 검색 조건.
    ///
    /// 제목, 요약, 본문의 부분 문자열(대소문자 무시)이거나 태그 또는
    /// 관련 티커와 정확히 일치하면 참입니다.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        if keyword.is_empty() {
            return false;
        }
        self.text_contains(keyword)
            || self.tags.iter().any(|t| t == keyword)
            || self.related_to.iter().any(|t| t == keyword)
    }

    fn text_contains(&self, needle: &str) -> bool {
        contains_ignore_case(&self.title, needle)
            || contains_ignore_case(&self.description, needle)
            || contains_ignore_case(&self.content, needle)
    }
}

/// 뉴스를 발행 시각 내림차순으로 정렬합니다. 같은 시각이면 ID 오름차순.
pub fn sort_news_recent_first(news: &mut [News]) {
    news.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
