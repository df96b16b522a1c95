//! One brief run: collect, select a model, generate, deliver.
//!
//! ```text
//! tickers ──▶ DataAggregator ──▶ block empty? ──yes──▶ NO_DATA_NOTICE
//!                                     │ no
//!                                     ▼
//!                 SelectionStrategy ──▶ ReportGenerator ──▶ Notifier
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::aggregator::DataAggregator;
use crate::config::{BriefConfig, ConfigError};
use crate::generation::{GeminiClient, GenerationClient, ReportGenerator, SelectionStrategy};
use crate::http_client::HttpClient;
use crate::notify::{ConsoleNotifier, NotifyError, Notifier, TelegramNotifier};
use crate::routing::{NewsRouter, QuoteRouter};
use crate::{AggregatedBlock, Report, Ticker};

/// Sent instead of a report when no ticker produced usable data.
pub const NO_DATA_NOTICE: &str = "❌ لم أستطع جلب بيانات السوق لأي سهم.";

/// Sent when a run fails after the notifier is available.
pub const CRASH_NOTICE: &str = "⚠️ حدث خطأ غير متوقع أثناء إعداد التقرير.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] NotifyError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A report was delivered. A [`Report::Failed`] still counts: the error
    /// detail is what the recipient receives.
    Delivered(Report),
    /// Nothing usable was collected; the no-data notice was delivered.
    NoData,
}

pub struct Pipeline {
    aggregator: DataAggregator,
    generation: Arc<dyn GenerationClient>,
    selection: SelectionStrategy,
    reporter: ReportGenerator,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        aggregator: DataAggregator,
        generation: Arc<dyn GenerationClient>,
        selection: SelectionStrategy,
        reporter: ReportGenerator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            aggregator,
            generation,
            selection,
            reporter,
            notifier,
        }
    }

    /// Wire the standard providers from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the generation credential is absent.
    pub fn from_config(
        config: &BriefConfig,
        http_client: Arc<dyn HttpClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let api_key = config.require_google_api_key()?;
        Ok(Self::new(
            aggregator_from_config(config, Arc::clone(&http_client)),
            Arc::new(GeminiClient::new(http_client, api_key)),
            config.selection_strategy(),
            ReportGenerator::new(config.language.clone()),
            notifier,
        ))
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub async fn collect(&self, tickers: &[Ticker]) -> AggregatedBlock {
        self.aggregator.collect(tickers).await
    }

    pub async fn run(&self, tickers: &[Ticker]) -> Result<PipelineOutcome, PipelineError> {
        tracing::info!(tickers = tickers.len(), "collecting market data");
        let block = self.collect(tickers).await;

        if block.is_empty() {
            tracing::warn!("no data collected, sending notice instead of a report");
            self.notifier.send(NO_DATA_NOTICE).await?;
            return Ok(PipelineOutcome::NoData);
        }

        let model = self.selection.select(self.generation.as_ref()).await;
        tracing::info!(%model, entries = block.len(), "generating report");
        let report = self.reporter.generate(self.generation.as_ref(), &model, &block).await;

        self.notifier.send(&report.message()).await?;
        tracing::info!(channel = self.notifier.channel(), generated = report.is_generated(), "report delivered");
        Ok(PipelineOutcome::Delivered(report))
    }

    /// [`Pipeline::run`], forwarding [`CRASH_NOTICE`] on any failure. The
    /// original error is returned either way.
    pub async fn run_guarded(&self, tickers: &[Ticker]) -> Result<PipelineOutcome, PipelineError> {
        let result = self.run(tickers).await;
        if let Err(error) = &result {
            tracing::error!(%error, "run failed, sending crash notice");
            if let Err(notice_error) = self.notifier.send(CRASH_NOTICE).await {
                tracing::error!(error = %notice_error, "crash notice could not be delivered");
            }
        }
        result
    }
}

/// Standard quote and news chains with the configured pacing.
pub fn aggregator_from_config(config: &BriefConfig, http_client: Arc<dyn HttpClient>) -> DataAggregator {
    DataAggregator::new(
        QuoteRouter::standard(Arc::clone(&http_client), config.alphavantage_api_key.as_deref()),
        NewsRouter::standard(http_client, config.news_limit),
    )
    .with_pause(config.pause)
}

/// Telegram when credentials are present and this is not a dry run,
/// otherwise stdout.
pub fn notifier_from_config(
    config: &BriefConfig,
    http_client: Arc<dyn HttpClient>,
    dry_run: bool,
) -> Arc<dyn Notifier> {
    match (&config.telegram, dry_run) {
        (Some(telegram), false) => Arc::new(TelegramNotifier::new(
            http_client,
            telegram.token.clone(),
            telegram.chat_id.clone(),
        )),
        (None, false) => {
            tracing::info!("telegram not configured, printing the message locally");
            Arc::new(ConsoleNotifier)
        }
        (_, true) => Arc::new(ConsoleNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::ScriptedHttpClient;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn missing_generation_key_stops_before_any_work() {
        let config = BriefConfig::from_lookup(lookup(&[])).expect("valid config");
        let client = Arc::new(ScriptedHttpClient::new());

        let result = Pipeline::from_config(&config, client.clone(), Arc::new(ConsoleNotifier));

        assert!(matches!(result, Err(ConfigError::Missing { name: "GOOGLE_API_KEY" })));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn dry_run_always_prints() {
        let config = BriefConfig::from_lookup(lookup(&[("TELEGRAM_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "1")]))
            .expect("valid config");
        let client: Arc<dyn HttpClient> = Arc::new(ScriptedHttpClient::new());

        assert_eq!(notifier_from_config(&config, Arc::clone(&client), true).channel(), "console");
        assert_eq!(notifier_from_config(&config, client, false).channel(), "telegram");
    }
}
