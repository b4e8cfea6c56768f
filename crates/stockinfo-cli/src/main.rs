//! StockInfo CLI.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use stockinfo_cli::{execute, run_daemon, App, Cli, Command};
use stockinfo_core::{init_logging, AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 설정 로드
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;

    // 로깅 초기화
    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level.as_deref() {
        log_config = log_config.with_level(level);
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("StockInfo 시작");

    let app = App::build(&config).await?;

    let outcome = match cli.command {
        Command::Daemon { interval_minutes } => {
            let minutes = interval_minutes.max(1);
            run_daemon(&app, Duration::from_secs(minutes * 60)).await;
            Ok(())
        }
        command => match execute(&app, command).await {
            Ok(value) => {
                println!("{}", serde_json::to_string_pretty(&value)?);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    app.shutdown().await;
    outcome
}
