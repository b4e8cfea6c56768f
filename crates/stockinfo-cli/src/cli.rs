//! 명령줄 인터페이스 정의와 실행.

use crate::app::App;
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "stockinfo")]
#[command(about = "MOEX stock quotes and market news", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 설정 파일 경로
    #[arg(long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 생략하면 설정 파일 값
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 단일 종목 현재 시세
    Stock { ticker: String },

    /// 여러 종목 현재 시세
    Stocks {
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// 상세 시세 (기본: 오늘)
    Quote {
        ticker: String,
        /// 거래일 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 일별 시세 이력 (기본: 최근 한 달)
    History {
        ticker: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// 상승률 상위 종목
    Gainers {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// 하락률 상위 종목
    Losers {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// 거래량 상위 종목
    Volume {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// 티커 또는 이름으로 종목 검색
    SearchStocks { query: String },

    /// ID로 뉴스 조회
    News { id: String },

    /// 오늘의 뉴스
    NewsToday,

    /// 특정 날짜의 뉴스
    NewsDate { date: NaiveDate },

    /// 오늘의 최신 뉴스
    NewsRecent {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// 키워드로 뉴스 검색
    SearchNews { keyword: String },

    /// 종목 관련 뉴스
    NewsTicker { ticker: String },

    /// 여러 종목 중 하나라도 관련된 오늘의 뉴스
    NewsTickers {
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// 종목과 뉴스를 Provider에서 다시 가져옴
    Refresh,

    /// 데이터베이스 마이그레이션 실행
    Migrate,

    /// 캐시와 데이터베이스 연결 상태 점검
    Health,

    /// 데몬 모드: 주기적으로 refresh 실행
    Daemon {
        /// 실행 주기 (분)
        #[arg(long, default_value_t = 15)]
        interval_minutes: u64,
    },
}

/// 단발성 명령을 실행하고 결과를 JSON으로 반환합니다.
///
/// `Daemon`은 종료 신호까지 반복하므로 [`run_daemon`]을 사용해야 합니다.
pub async fn execute(app: &App, command: Command) -> anyhow::Result<Value> {
    let value = match command {
        Command::Stock { ticker } => json!(app.stocks.get_stock_info(&ticker).await?),
        Command::Stocks { tickers } => json!(app.stocks.get_multiple_stocks(&tickers).await?),
        Command::Quote { ticker, date } => json!(app.stocks.get_stock_quote(&ticker, date).await?),
        Command::History { ticker, from, to } => json!(
            app.stocks
                .get_stock_historical_data(&ticker, from, to)
                .await?
        ),
        Command::Gainers { limit } => json!(app.stocks.get_top_gainers(limit).await?),
        Command::Losers { limit } => json!(app.stocks.get_top_losers(limit).await?),
        Command::Volume { limit } => json!(app.stocks.get_top_volume(limit).await?),
        Command::SearchStocks { query } => json!(app.stocks.search_stocks(&query).await?),
        Command::News { id } => json!(app.news.get_news_by_id(&id).await?),
        Command::NewsToday => json!(app.news.get_today_news().await?),
        Command::NewsDate { date } => json!(app.news.get_news_by_date(Some(date)).await?),
        Command::NewsRecent { limit } => json!(app.news.get_recent_news(limit).await?),
        Command::SearchNews { keyword } => json!(app.news.search_news_by_keyword(&keyword).await?),
        Command::NewsTicker { ticker } => json!(app.news.get_news_for_ticker(&ticker).await?),
        Command::NewsTickers { tickers } => {
            json!(app.news.get_news_for_multiple_tickers(&tickers).await?)
        }
        Command::Refresh => {
            let stats = app.refresh().await;
            stats.log_summary("refresh");
            if !stats.is_success() {
                anyhow::bail!("갱신 실패: {}", stats.failed.join(", "));
            }
            json!(stats)
        }
        Command::Migrate => {
            let db = app
                .database()
                .context("database.url 이 설정되지 않아 마이그레이션할 수 없습니다")?;
            db.migrate().await?;
            json!({ "migrated": true })
        }
        Command::Health => {
            let report = app.health().await;
            if !report.is_healthy() {
                anyhow::bail!("상태 점검 실패: {}", serde_json::to_string(&report)?);
            }
            json!(report)
        }
        Command::Daemon { .. } => anyhow::bail!("daemon 명령은 run_daemon으로 실행해야 합니다"),
    };
    Ok(value)
}

/// 종료 신호를 받을 때까지 주기적으로 갱신합니다.
pub async fn run_daemon(app: &App, interval: Duration) {
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        interval.as_secs() / 60
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = ticker.tick() => {
                app.refresh().await.log_summary("refresh");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockinfo",
            "quote",
            "SBER",
            "--date",
            "2024-03-01",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        match cli.command {
            Command::Quote { ticker, date } => {
                assert_eq!(ticker, "SBER");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_defaults_and_lists() {
        let cli = Cli::try_parse_from(["stockinfo", "gainers"]).unwrap();
        assert!(matches!(cli.command, Command::Gainers { limit: 10 }));

        let cli = Cli::try_parse_from(["stockinfo", "news-tickers", "SBER", "GAZP"]).unwrap();
        match cli.command {
            Command::NewsTickers { tickers } => assert_eq!(tickers, vec!["SBER", "GAZP"]),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(matches!(
            Cli::try_parse_from(["stockinfo", "health"]).unwrap().command,
            Command::Health
        ));
        assert!(Cli::try_parse_from(["stockinfo", "stocks"]).is_err());
        assert!(Cli::try_parse_from(["stockinfo", "news-date", "yesterday"]).is_err());
    }
}
