use std::sync::Arc;

use tickerbrief_core::pipeline::notifier_from_config;
use tickerbrief_core::{HttpClient, Pipeline, PipelineOutcome};

use crate::cli::RunArgs;
use crate::error::CliError;

use super::load_config;

pub async fn run(args: &RunArgs, http_client: Arc<dyn HttpClient>) -> Result<(), CliError> {
    let config = load_config(args.tickers.as_deref())?;
    let notifier = notifier_from_config(&config, Arc::clone(&http_client), args.dry_run);
    let pipeline = Pipeline::from_config(&config, http_client, notifier)?;

    match pipeline.run_guarded(&config.tickers).await? {
        PipelineOutcome::Delivered(report) => {
            tracing::info!(model = %report.model(), generated = report.is_generated(), "run finished");
            Ok(())
        }
        PipelineOutcome::NoData => Err(CliError::NoData),
    }
}
