use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::data_source::{NewsSource, QuoteSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, BROWSER_USER_AGENT};
use crate::{NewsSnippet, ProviderId, Quote, Ticker};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_BASE_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const REFERER: &str = "https://finance.yahoo.com/";

/// Yahoo Finance chart endpoint used as the primary quote provider.
///
/// The endpoint is unofficial and throttles non-browser agents, so requests
/// carry a browser user agent and a finance.yahoo.com referer.
#[derive(Clone)]
pub struct YahooQuoteAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooQuoteAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(CHART_BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Result<Quote, SourceError> {
        let endpoint = format!(
            "{}/{}?range=1d&interval=1d",
            self.base_url,
            urlencoding::encode(ticker.as_str())
        );

        let chart: YahooChartResponse = fetch_json(
            self.http_client.as_ref(),
            ProviderId::Yahoo,
            browser_request(endpoint, self.timeout_ms),
        )
        .await?;

        if let Some(error) = chart.chart.error.filter(|error| !error.is_null()) {
            return Err(SourceError::not_found(format!(
                "yahoo chart error for {ticker}: {}",
                describe_chart_error(&error)
            )));
        }

        let result = chart
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::not_found(format!("yahoo chart has no result for {ticker}")))?;

        let price = result
            .meta
            .as_ref()
            .and_then(|meta| meta.regular_market_price)
            .or_else(|| result.last_close())
            .ok_or_else(|| SourceError::not_found(format!("yahoo chart has no price for {ticker}")))?;

        Quote::new(ticker.clone(), price, ProviderId::Yahoo)
            .map_err(|error| SourceError::malformed(format!("yahoo price for {ticker}: {error}")))
    }
}

impl QuoteSource for YahooQuoteAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn quote<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Quote> {
        Box::pin(self.fetch_quote(ticker))
    }
}

/// Yahoo Finance search endpoint used for ticker headlines.
#[derive(Clone)]
pub struct YahooNewsAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooNewsAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(SEARCH_BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn fetch_news(&self, ticker: &Ticker, limit: usize) -> Result<Vec<NewsSnippet>, SourceError> {
        if limit == 0 {
            return Err(SourceError::invalid_request("yahoo news limit must be greater than zero"));
        }

        let endpoint = format!(
            "{}?q={}&quotesCount=0&newsCount={limit}",
            self.base_url,
            urlencoding::encode(ticker.as_str())
        );

        let search: YahooSearchResponse = fetch_json(
            self.http_client.as_ref(),
            ProviderId::YahooNews,
            browser_request(endpoint, self.timeout_ms),
        )
        .await?;

        let snippets = search
            .news
            .into_iter()
            .filter_map(|item| {
                let snippet = NewsSnippet::new(item.title).ok()?;
                Some(match item.link {
                    Some(link) => snippet.with_url(link),
                    None => snippet,
                })
            })
            .take(limit)
            .collect();

        Ok(snippets)
    }
}

impl NewsSource for YahooNewsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::YahooNews
    }

    fn news<'a>(&'a self, ticker: &'a Ticker, limit: usize) -> SourceFuture<'a, Vec<NewsSnippet>> {
        Box::pin(self.fetch_news(ticker, limit))
    }
}

fn browser_request(endpoint: String, timeout_ms: u64) -> HttpRequest {
    HttpRequest::get(endpoint)
        .with_header("user-agent", BROWSER_USER_AGENT)
        .with_header("referer", REFERER)
        .with_timeout_ms(timeout_ms)
}

async fn fetch_json<T: DeserializeOwned>(
    http_client: &dyn HttpClient,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<T, SourceError> {
    tracing::debug!(%provider, url = request.redacted_url(), "requesting");

    let response = http_client
        .execute(request)
        .await
        .map_err(|error| SourceError::transport(provider, &error))?;

    // Unknown symbols come back as 404 with a JSON error body worth decoding.
    if !response.is_success() && response.status != 404 {
        return Err(SourceError::status(provider, response.status));
    }

    serde_json::from_str(&response.body).map_err(|error| {
        if response.status == 404 {
            SourceError::not_found(format!("{provider} returned status 404"))
        } else {
            SourceError::malformed(format!("failed to parse {provider} response: {error}"))
        }
    })
}

fn describe_chart_error(error: &serde_json::Value) -> String {
    error
        .get("description")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| error.to_string())
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    indicators: Option<YahooChartIndicators>,
}

impl YahooChartResult {
    fn last_close(&self) -> Option<f64> {
        self.indicators
            .as_ref()?
            .quote
            .first()?
            .close
            .iter()
            .rev()
            .find_map(|close| *close)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooSearchNews>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooSearchNews {
    title: String,
    #[serde(default)]
    link: Option<String>,
}
