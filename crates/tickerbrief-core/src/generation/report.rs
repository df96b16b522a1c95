use std::time::Duration;

use super::{GenerationClient, GenerationError};
use crate::retry::RetryPolicy;
use crate::{AggregatedBlock, ModelId, Report};

/// Turns the aggregated block into a short recipient-facing summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportGenerator {
    language: String,
    retry: RetryPolicy,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new("Arabic")
    }
}

impl ReportGenerator {
    /// One retry after a fixed 10 s wait, and only for rate limiting.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            retry: RetryPolicy::fixed(Duration::from_secs(10), 1),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn prompt(&self, block: &AggregatedBlock) -> String {
        format!(
            "Summarize how these stocks are doing today in a very short Telegram message written in {language}.\n\
             Write one line per stock: start with an emoji for the price move or news sentiment, \
             then the ticker, then a one-line reason.\n\
             Use emojis. Do not give financial advice; only summarize the news and the price.\n\
             If a price is {price}, just report the news.\n\
             \n\
             Data:\n\
             {data}",
            language = self.language,
            price = crate::PRICE_SENTINEL,
            data = block.render(),
        )
    }

    /// Never fails: provider errors become a [`Report::Failed`] carrying the
    /// raw detail.
    pub async fn generate(
        &self,
        client: &dyn GenerationClient,
        model: &ModelId,
        block: &AggregatedBlock,
    ) -> Report {
        let prompt = self.prompt(block);

        let result = self
            .retry
            .run(
                |attempt| {
                    tracing::debug!(%model, attempt = attempt + 1, "requesting report");
                    client.generate(model, &prompt)
                },
                GenerationError::is_rate_limited,
            )
            .await;

        match result {
            Ok(text) => {
                tracing::info!(%model, chars = text.chars().count(), "report generated");
                Report::Generated {
                    model: model.clone(),
                    text,
                }
            }
            Err(error) => {
                tracing::warn!(%model, %error, "report generation failed");
                Report::Failed {
                    model: model.clone(),
                    error: error.to_string(),
                }
            }
        }
    }
}
