//! MOEX ISS API 클라이언트.
//!
//! ISS 응답은 이름 있는 표 블록(`securities`, `marketdata`, `history`)으로
//! 구성되며 각 블록은 `{columns: [..], data: [[..], ..]}` 형태입니다.
//! 열 이름으로 인덱스를 만들어 행을 도메인 객체로 변환하고,
//! `securities`와 `marketdata`는 `SECID`로 조인합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use stockinfo_data::provider::{MoexClient, QuoteProvider};
//!
//! let client = MoexClient::new(&config.moex)?;
//! let sber = client.fetch_stock("SBER").await?;
//! ```

use super::QuoteProvider;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use stockinfo_core::{MoexConfig, Stock, StockQuote};
use tracing::{debug, info, instrument};

const PROVIDER: &str = "moex";

/// 시가총액을 십억 단위로 바꾸는 나눗수.
const BILLION: i64 = 1_000_000_000;

/// MOEX ISS 클라이언트.
#[derive(Clone)]
pub struct MoexClient {
    client: reqwest::Client,
    base_url: String,
    board: String,
    api_key: Option<SecretString>,
}

impl MoexClient {
    /// 설정으로 클라이언트를 생성합니다.
    pub fn new(config: &MoexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            board: config.board.clone(),
            api_key: config.api_key.clone().map(SecretString::from),
        })
    }

    fn securities_url(&self) -> String {
        format!(
            "{}/engines/stock/markets/shares/boards/{}/securities",
            self.base_url, self.board
        )
    }

    /// ISS 요청을 실행하고 블록 페이로드를 반환합니다.
    async fn request(&self, url: &str, params: &[(&str, String)]) -> Result<IssPayload> {
        debug!(url = %url, "MOEX ISS 요청");

        let mut request = self
            .client
            .get(url)
            .query(&[("iss.meta", "off")])
            .query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.expose_secret())]);
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
        serde_json::from_str(&body)
            .map_err(|e| DataError::upstream(PROVIDER, format!("응답 해석 실패: {}", e)))
    }
}

#[async_trait]
impl QuoteProvider for MoexClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn fetch_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        let url = format!("{}/{}.json", self.securities_url(), ticker);
        let payload = self.request(&url, &[]).await?;
        let stock = parse_stocks(&payload)
            .into_iter()
            .find(|s| s.ticker.eq_ignore_ascii_case(ticker));
        Ok(stock)
    }

    #[instrument(skip(self), fields(count = tickers.len()))]
    async fn fetch_stocks(&self, tickers: &[String]) -> Result<Vec<Stock>> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}.json", self.securities_url());
        let payload = self
            .request(&url, &[("securities", tickers.join(","))])
            .await?;
        let stocks = parse_stocks(&payload);
        info!(count = stocks.len(), "MOEX 시세 조회 완료");
        Ok(stocks)
    }

    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        till: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        let url = format!(
            "{}/history/engines/stock/markets/shares/boards/{}/securities/{}.json",
            self.base_url, self.board, ticker
        );
        let params = [
            ("from", from.format("%Y-%m-%d").to_string()),
            ("till", till.format("%Y-%m-%d").to_string()),
        ];
        let payload = self.request(&url, &params).await?;
        let quotes = parse_history(&payload);
        debug!(ticker = ticker, count = quotes.len(), "MOEX 일별 시세 조회 완료");
        Ok(quotes)
    }
}

// =============================================================================
// ISS 표 파싱
// =============================================================================

/// ISS 응답 페이로드.
#[derive(Debug, Default, Deserialize)]
pub struct IssPayload {
    #[serde(default)]
    pub securities: Option<IssTable>,
    #[serde(default)]
    pub marketdata: Option<IssTable>,
    #[serde(default)]
    pub history: Option<IssTable>,
}

/// ISS 표 블록.
#[derive(Debug, Default, Deserialize)]
pub struct IssTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl IssTable {
    fn rows(&self) -> impl Iterator<Item = IssRow<'_>> + '_ {
        let index: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let index = std::sync::Arc::new(index);
        self.data.iter().map(move |cells| IssRow {
            index: index.clone(),
            cells,
        })
    }
}

/// 열 이름으로 접근하는 ISS 행.
struct IssRow<'a> {
    index: std::sync::Arc<HashMap<&'a str, usize>>,
    cells: &'a [Value],
}

impl<'a> IssRow<'a> {
    fn cell(&self, column: &str) -> Option<&'a Value> {
        self.index
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .filter(|v| !v.is_null())
    }

    fn text(&self, column: &str) -> String {
        match self.cell(column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    fn decimal(&self, column: &str) -> Decimal {
        match self.cell(column) {
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s),
            _ => Decimal::ZERO,
        }
    }

    fn int(&self, column: &str) -> i64 {
        match self.cell(column) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0),
            _ => 0,
        }
    }

    fn date(&self, column: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.text(column).trim(), "%Y-%m-%d").ok()
    }
}

/// 숫자 문자열을 Decimal로 변환합니다. 해석할 수 없으면 0.
fn parse_decimal(raw: &str) -> Decimal {
    let s = raw.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

/// `securities`와 `marketdata` 블록을 `SECID`로 조인해 현재 시세를 만듭니다.
pub fn parse_stocks(payload: &IssPayload) -> Vec<Stock> {
    let Some(securities) = &payload.securities else {
        return Vec::new();
    };

    let market: HashMap<String, IssRow<'_>> = payload
        .marketdata
        .as_ref()
        .map(|table| table.rows().map(|row| (row.text("SECID"), row)).collect())
        .unwrap_or_default();

    let now = Utc::now();
    securities
        .rows()
        .filter_map(|sec| {
            let ticker = sec.text("SECID");
            if ticker.is_empty() {
                return None;
            }

            let mut name = sec.text("SHORTNAME");
            if name.is_empty() {
                name = sec.text("SECNAME");
            }

            let md = market.get(&ticker);
            let mut price = md.map(|m| m.decimal("LAST")).unwrap_or_default();
            if price.is_zero() {
                price = sec.decimal("PREVPRICE");
            }

            Some(Stock {
                name,
                price,
                change: md.map(|m| m.decimal("CHANGE")).unwrap_or_default(),
                change_perc: md.map(|m| m.decimal("LASTTOPREVPRICE")).unwrap_or_default(),
                volume: md.map(|m| m.int("VOLTODAY")).unwrap_or_default(),
                updated_at: now,
                ticker: ticker.to_uppercase(),
            })
        })
        .collect()
}

/// `history` 블록을 일별 상세 시세로 변환합니다 (거래일 오름차순).
pub fn parse_history(payload: &IssPayload) -> Vec<StockQuote> {
    let Some(history) = &payload.history else {
        return Vec::new();
    };

    let mut quotes: Vec<StockQuote> = history
        .rows()
        .filter_map(|row| {
            let ticker = row.text("SECID").to_uppercase();
            let Some(date) = row.date("TRADEDATE") else {
                debug!(ticker = %ticker, "거래일이 없는 행 건너뜀");
                return None;
            };
            Some(StockQuote {
                open: row.decimal("OPEN"),
                high: row.decimal("HIGH"),
                low: row.decimal("LOW"),
                close: row.decimal("CLOSE"),
                volume: row.int("VOLUME"),
                market_cap_bln: row.decimal("ISSUECAPITALIZATION") / Decimal::from(BILLION),
                trading_session: row.text("TRADINGSESSION"),
                ..StockQuote::new(ticker, date)
            })
        })
        .collect();
    quotes.sort_by(|a, b| a.date.cmp(&b.date));
    quotes
}
