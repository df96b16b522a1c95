use std::io::Write;
use std::sync::Arc;

use tickerbrief_core::pipeline::aggregator_from_config;
use tickerbrief_core::HttpClient;

use crate::cli::CollectArgs;
use crate::error::CliError;

use super::load_config;

/// Aggregation only. Needs no generation or messaging credentials.
pub async fn run(args: &CollectArgs, http_client: Arc<dyn HttpClient>) -> Result<(), CliError> {
    let config = load_config(args.tickers.as_deref())?;
    let block = aggregator_from_config(&config, http_client)
        .collect(&config.tickers)
        .await;

    if block.is_empty() {
        return Err(CliError::NoData);
    }

    let rendered = if args.json {
        serde_json::to_string_pretty(&block)?
    } else {
        block.render()
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
