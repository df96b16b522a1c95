use std::io::Write;
use std::sync::Arc;

use tickerbrief_core::{GeminiClient, GenerationClient, HttpClient, SelectionStrategy};

use crate::error::CliError;

use super::load_config;

pub async fn run(http_client: Arc<dyn HttpClient>) -> Result<(), CliError> {
    let config = load_config(None)?;
    let client = GeminiClient::new(http_client, config.require_google_api_key()?);

    let descriptors = client.list_models().await?;
    let selected = match config.selection_strategy() {
        SelectionStrategy::Catalog(selector) => selector.select_from(&descriptors),
        strategy @ SelectionStrategy::Probe(_) => strategy.select(&client).await,
    };

    let mut stdout = std::io::stdout().lock();
    for descriptor in &descriptors {
        let generation = match descriptor.supports_generation {
            Some(true) => "generate",
            Some(false) => "-",
            None => "?",
        };
        writeln!(stdout, "{:<48} {generation}", descriptor.id)?;
    }
    writeln!(stdout, "selected: {selected}")?;
    Ok(())
}
