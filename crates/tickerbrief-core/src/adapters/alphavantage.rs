use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{QuoteSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{ProviderId, Quote, Ticker};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage `GLOBAL_QUOTE` adapter, used as the secondary quote provider
/// when an API key is configured.
#[derive(Clone)]
pub struct AlphaVantageQuoteAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

impl AlphaVantageQuoteAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Result<Quote, SourceError> {
        let endpoint = format!(
            "{}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url,
            urlencoding::encode(ticker.as_str()),
            urlencoding::encode(&self.api_key)
        );
        let request = HttpRequest::get(endpoint).with_timeout_ms(self.timeout_ms);
        tracing::debug!(provider = %ProviderId::Alphavantage, url = request.redacted_url(), "requesting");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::transport(ProviderId::Alphavantage, &error))?;

        if !response.is_success() {
            return Err(SourceError::status(ProviderId::Alphavantage, response.status));
        }

        let payload: AlphaVantageQuoteResponse = serde_json::from_str(&response.body).map_err(|error| {
            SourceError::malformed(format!("failed to parse alphavantage response: {error}"))
        })?;

        // Throttled and rejected calls still answer 200, with a note instead of data.
        if let Some(note) = payload.note.or(payload.information) {
            return Err(SourceError::rate_limited(format!("alphavantage throttled: {note}")));
        }
        if let Some(message) = payload.error_message {
            return Err(SourceError::invalid_request(format!("alphavantage rejected request: {message}")));
        }

        let raw_price = payload
            .quote
            .and_then(|quote| quote.price)
            .ok_or_else(|| SourceError::not_found(format!("no alphavantage quote for {ticker}")))?;

        let price = raw_price.trim().parse::<f64>().map_err(|_| {
            SourceError::malformed(format!("alphavantage price '{raw_price}' is not a number"))
        })?;

        Quote::new(ticker.clone(), price, ProviderId::Alphavantage)
            .map_err(|error| SourceError::malformed(format!("alphavantage price for {ticker}: {error}")))
    }
}

impl QuoteSource for AlphaVantageQuoteAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn quote<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Quote> {
        Box::pin(self.fetch_quote(ticker))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AlphaVantageQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    quote: Option<AlphaVantageQuoteData>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AlphaVantageQuoteData {
    #[serde(rename = "05. price", default)]
    price: Option<String>,
}
