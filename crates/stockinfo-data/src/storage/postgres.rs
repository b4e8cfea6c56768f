//! PostgreSQL 저장소 구현.
//!
//! 모든 쓰기는 `ON CONFLICT ... DO UPDATE` upsert이므로 행 단위로 원자적이고
//! 멱등입니다.

use super::{like_pattern, Database, NewsStore, StockStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use stockinfo_core::{News, Stock, StockQuote};
use tracing::{debug, instrument};

// =============================================================================
// Stock Store
// =============================================================================

/// 시세 테이블(`stocks`, `stock_quotes`) 저장소.
#[derive(Clone)]
pub struct PgStockStore {
    db: Database,
}

impl PgStockStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StockStore for PgStockStore {
    async fn find_stock(&self, ticker: &str) -> Result<Option<Stock>> {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            SELECT ticker, name, price, change, change_perc, volume, updated_at
            FROM stocks
            WHERE ticker = $1
            "#,
        )
        .bind(ticker)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(stock)
    }

    async fn all_stocks(&self) -> Result<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(
            r#"
            SELECT ticker, name, price, change, change_perc, volume, updated_at
            FROM stocks
            ORDER BY ticker ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(stocks)
    }

    #[instrument(skip(self, stock), fields(ticker = %stock.ticker))]
    async fn upsert_stock(&self, stock: &Stock) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stocks (ticker, name, price, change, change_perc, volume, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (ticker) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                change = EXCLUDED.change,
                change_perc = EXCLUDED.change_perc,
                volume = EXCLUDED.volume,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&stock.ticker)
        .bind(&stock.name)
        .bind(stock.price)
        .bind(stock.change)
        .bind(stock.change_perc)
        .bind(stock.volume)
        .bind(stock.updated_at)
        .execute(self.db.pool())
        .await?;

        debug!("Upserted stock");
        Ok(())
    }

    async fn find_quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<StockQuote>> {
        let quote = sqlx::query_as::<_, StockQuote>(
            r#"
            SELECT ticker, date, open, high, low, close, volume,
                   market_cap_bln, pe, dividend_yield, sector, trading_session
            FROM stock_quotes
            WHERE ticker = $1 AND date = $2
            "#,
        )
        .bind(ticker)
        .bind(date)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(quote)
    }

    async fn find_quotes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StockQuote>> {
        let quotes = sqlx::query_as::<_, StockQuote>(
            r#"
            SELECT ticker, date, open, high, low, close, volume,
                   market_cap_bln, pe, dividend_yield, sector, trading_session
            FROM stock_quotes
            WHERE ticker = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(ticker)
        .bind(start)
        .bind(end)
        .fetch_all(self.db.pool())
        .await?;

        Ok(quotes)
    }

    #[instrument(skip(self, quote), fields(ticker = %quote.ticker, date = %quote.date))]
    async fn upsert_quote(&self, quote: &StockQuote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_quotes
                (ticker, date, open, high, low, close, volume,
                 market_cap_bln, pe, dividend_yield, sector, trading_session)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (ticker, date) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume,
                market_cap_bln = EXCLUDED.market_cap_bln,
                pe = EXCLUDED.pe,
                dividend_yield = EXCLUDED.dividend_yield,
                sector = EXCLUDED.sector,
                trading_session = EXCLUDED.trading_session
            "#,
        )
        .bind(&quote.ticker)
        .bind(quote.date)
        .bind(quote.open)
        .bind(quote.high)
        .bind(quote.low)
        .bind(quote.close)
        .bind(quote.volume)
        .bind(quote.market_cap_bln)
        .bind(quote.pe)
        .bind(quote.dividend_yield)
        .bind(&quote.sector)
        .bind(&quote.trading_session)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

// =============================================================================
// News Store
// =============================================================================

const NEWS_COLUMNS: &str = "id, title, description, content, url, source, \
                            published_at, created_at, tags, related_to";

/// 뉴스 테이블 저장소.
#[derive(Clone)]
pub struct PgNewsStore {
    db: Database,
}

impl PgNewsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn find_news(&self, id: &str) -> Result<Option<News>> {
        let sql = format!("SELECT {} FROM news WHERE id = $1", NEWS_COLUMNS);
        let news = sqlx::query_as::<_, News>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(news)
    }

    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<News>> {
        let sql = format!(
            "SELECT {} FROM news \
             WHERE published_at >= $1 AND published_at < $2 \
             ORDER BY published_at DESC, id ASC",
            NEWS_COLUMNS
        );
        let news = sqlx::query_as::<_, News>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(self.db.pool())
            .await?;

        Ok(news)
    }

    async fn search_news(&self, keyword: &str) -> Result<Vec<News>> {
        let sql = format!(
            "SELECT {} FROM news \
             WHERE title ILIKE $1 OR description ILIKE $1 OR content ILIKE $1 \
                OR $2 = ANY(tags) OR $2 = ANY(related_to) \
             ORDER BY published_at DESC, id ASC",
            NEWS_COLUMNS
        );
        let news = sqlx::query_as::<_, News>(&sql)
            .bind(like_pattern(keyword))
            .bind(keyword)
            .fetch_all(self.db.pool())
            .await?;

        Ok(news)
    }

    async fn find_related(&self, ticker: &str) -> Result<Vec<News>> {
        let sql = format!(
            "SELECT {} FROM news \
             WHERE EXISTS (SELECT 1 FROM unnest(related_to) AS r WHERE upper(r) = upper($2)) \
                OR title ILIKE $1 OR description ILIKE $1 OR content ILIKE $1 \
             ORDER BY published_at DESC, id ASC",
            NEWS_COLUMNS
        );
        let news = sqlx::query_as::<_, News>(&sql)
            .bind(like_pattern(ticker))
            .bind(ticker)
            .fetch_all(self.db.pool())
            .await?;

        Ok(news)
    }

    #[instrument(skip(self, news), fields(id = %news.id))]
    async fn upsert_news(&self, news: &News) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news
                (id, title, description, content, url, source,
                 published_at, created_at, tags, related_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                content = EXCLUDED.content,
                url = EXCLUDED.url,
                source = EXCLUDED.source,
                published_at = EXCLUDED.published_at,
                tags = EXCLUDED.tags,
                related_to = EXCLUDED.related_to
            "#,
        )
        .bind(&news.id)
        .bind(&news.title)
        .bind(&news.description)
        .bind(&news.content)
        .bind(&news.url)
        .bind(&news.source)
        .bind(news.published_at)
        .bind(news.created_at)
        .bind(&news.tags)
        .bind(&news.related_to)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
