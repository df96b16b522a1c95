mod collect;
mod models;
mod run;

use std::sync::Arc;

use tickerbrief_core::{BriefConfig, HttpClient, ReqwestHttpClient, Ticker};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    match cli.selected_command() {
        Command::Run(args) => run::run(&args, http_client).await,
        Command::Collect(args) => collect::run(&args, http_client).await,
        Command::Models => models::run(http_client).await,
    }
}

/// Environment configuration with an optional `--tickers` override.
fn load_config(tickers: Option<&str>) -> Result<BriefConfig, CliError> {
    let config = BriefConfig::from_env()?;
    let config = match tickers {
        Some(raw) => config.with_tickers(Ticker::parse_list(raw)?)?,
        None => config,
    };
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
