//! NewsAPI 클라이언트.
//!
//! `/everything` 엔드포인트로 러시아어 금융 뉴스를 수집하고,
//! 제목과 요약에서 태그/관련 티커를 추출해 `News`로 변환합니다.

use super::NewsProvider;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use stockinfo_core::{news_id, MatchingVocabulary, News, NewsApiConfig};
use tracing::{debug, info, instrument, warn};

const PROVIDER: &str = "newsapi";

/// NewsAPI 클라이언트.
#[derive(Clone)]
pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    language: String,
    sources: Vec<String>,
    default_query: String,
    vocabulary: MatchingVocabulary,
}

impl NewsApiClient {
    /// 설정과 매칭 어휘로 클라이언트를 생성합니다.
    pub fn new(config: &NewsApiConfig, vocabulary: MatchingVocabulary) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        if config.api_key.is_none() {
            warn!("news_api.api_key is not set; NewsAPI requests will be rejected upstream");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().map(SecretString::from),
            language: config.language.clone(),
            sources: config.sources.clone(),
            default_query: config.default_query.clone(),
            vocabulary,
        })
    }

    fn query_params(
        &self,
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", query.to_string())];
        if let Some(from) = from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = to {
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        params.push(("language", self.language.clone()));
        params.push(("sortBy", "publishedAt".to_string()));
        if !self.sources.is_empty() {
            params.push(("sources", self.sources.join(",")));
        }
        params
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn fetch_news(
        &self,
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<News>> {
        let url = format!("{}/everything", self.base_url);
        debug!(url = %url, "NewsAPI 요청");

        let mut request = self.client.get(&url).query(&self.query_params(query, from, to));
        if let Some(key) = &self.api_key {
            request = request.query(&[("apiKey", key.expose_secret())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DataError::from_http(PROVIDER, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::upstream(
                PROVIDER,
                format!("HTTP {} - {}", status, body),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::from_http(PROVIDER, e))?;
        let news = parse_articles(&body, &self.vocabulary, Utc::now())?;

        info!(count = news.len(), "NewsAPI 뉴스 조회 완료");
        Ok(news)
    }

    async fn fetch_today(&self, today: NaiveDate) -> Result<Vec<News>> {
        self.fetch_news(&self.default_query, Some(today), Some(today))
            .await
    }
}

// =============================================================================
// 응답 파싱
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// NewsAPI 응답 본문을 `News` 목록으로 변환합니다.
///
/// `publishedAt`이 없거나 해석할 수 없으면 수집 시각을 사용합니다.
pub fn parse_articles(
    body: &str,
    vocabulary: &MatchingVocabulary,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<News>> {
    let raw: RawResponse = serde_json::from_str(body)
        .map_err(|e| DataError::upstream(PROVIDER, format!("응답 해석 실패: {}", e)))?;

    if raw.status == "error" {
        return Err(DataError::upstream(
            PROVIDER,
            raw.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let news = raw
        .articles
        .into_iter()
        .map(|article| {
            let title = article.title.unwrap_or_default();
            let description = article.description.unwrap_or_default();
            let url = article.url.unwrap_or_default();
            let text = format!("{} {}", title, description);
            let published_at = article
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(fetched_at);

            News {
                id: news_id(&url),
                tags: vocabulary.extract_tags(&text),
                related_to: vocabulary.extract_tickers(&text),
                title,
                description,
                content: article.content.unwrap_or_default(),
                url,
                source: article.source.and_then(|s| s.name).unwrap_or_default(),
                published_at,
                created_at: fetched_at,
            }
        })
        .collect();

    Ok(news)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BODY: &str = r#"{
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": {"id": null, "name": "РБК"},
                "author": null,
                "title": "Акции SBER выросли на 3%",
                "description": "Сбербанк объявил дивиденды, биржа отреагировала",
                "url": "https://www.rbc.ru/finances/01/03/2024/sber-dividends.html",
                "urlToImage": null,
                "publishedAt": "2024-03-01T09:30:00Z",
                "content": "Полный текст"
            },
            {
                "source": {"id": "interfax", "name": null},
                "title": null,
                "description": null,
                "url": "https://www.interfax.ru/",
                "publishedAt": "not-a-date",
                "content": null
            }
        ]
    }"#;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_articles() {
        let news = parse_articles(BODY, &MatchingVocabulary::default(), fetched_at()).unwrap();
        assert_eq!(news.len(), 2);

        let first = &news[0];
        assert!(first.id.starts_with("sber-dividends-"));
        assert_eq!(first.source, "РБК");
        assert_eq!(
            first.published_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(first.created_at, fetched_at());
        assert_eq!(first.related_to, vec!["SBER"]);
        assert_eq!(first.tags, vec!["акции", "биржа", "дивиденды", "банк"]);

        let second = &news[1];
        assert!(second.id.starts_with("news-"));
        assert_eq!(second.title, "");
        assert_eq!(second.source, "");
        assert_eq!(second.published_at, fetched_at());
        assert!(second.tags.is_empty());
    }

    #[test]
    fn test_error_status_is_upstream_error() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let err = parse_articles(body, &MatchingVocabulary::default(), fetched_at()).unwrap_err();
        match err {
            DataError::Upstream { provider, message, .. } => {
                assert_eq!(provider, "newsapi");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_articles("<html>", &MatchingVocabulary::default(), fetched_at());
        assert!(matches!(err, Err(DataError::Upstream { .. })));
    }

    #[test]
    fn test_query_params() {
        let config = NewsApiConfig {
            sources: vec!["rbc".to_string(), "interfax".to_string()],
            ..NewsApiConfig::default()
        };
        let client = NewsApiClient::new(&config, MatchingVocabulary::default()).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let params = client.query_params("нефть", Some(day), Some(day));

        assert!(params.contains(&("q", "нефть".to_string())));
        assert!(params.contains(&("from", "2024-03-01".to_string())));
        assert!(params.contains(&("language", "ru".to_string())));
        assert!(params.contains(&("sortBy", "publishedAt".to_string())));
        assert!(params.contains(&("sources", "rbc,interfax".to_string())));

        let open_range = client.query_params("нефть", None, None);
        assert!(!open_range.iter().any(|(k, _)| *k == "from" || *k == "to"));
    }
}
