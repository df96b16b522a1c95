//! Ordered provider fallback.
//!
//! A router walks its chain in order and stops at the first provider that
//! answers. Every failed attempt is kept on the result so callers can log or
//! surface why a fallback happened. Mapping a total failure to a sentinel is
//! done here, in [`QuoteRouter::get_quote`] and [`NewsRouter::get_news`], and
//! nowhere else.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::{
    AlphaVantageQuoteAdapter, DuckDuckGoNewsAdapter, GoogleNewsAdapter, YahooNewsAdapter,
    YahooQuoteAdapter,
};
use crate::data_source::{NewsSource, QuoteSource, SourceError, SourceFuture};
use crate::http_client::HttpClient;
use crate::{NewsSnippet, ProviderId, Quote, Ticker};

/// Failed attempt recorded while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAttemptError {
    pub source: ProviderId,
    pub error: SourceError,
}

/// Successful routed call.
#[derive(Debug, Clone)]
pub struct RouteSuccess<T> {
    pub data: T,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub errors: Vec<RouteAttemptError>,
    pub latency_ms: u64,
}

/// Failed routed call after exhausting the chain.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub source_chain: Vec<ProviderId>,
    pub errors: Vec<RouteAttemptError>,
    pub latency_ms: u64,
}

impl RouteFailure {
    /// One-line summary of every attempt, for logs.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            return String::from("no sources configured");
        }
        self.errors
            .iter()
            .map(|attempt| format!("{}: {}", attempt.source, attempt.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub type RouteResult<T> = Result<RouteSuccess<T>, RouteFailure>;

/// Quote chain: primary provider first, secondary providers after it.
#[derive(Clone)]
pub struct QuoteRouter {
    sources: Vec<Arc<dyn QuoteSource>>,
}

impl QuoteRouter {
    /// Duplicate providers are dropped, keeping the first occurrence.
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        Self {
            sources: dedupe(sources, |source| source.id()),
        }
    }

    /// Yahoo chart first, then Alpha Vantage when a key is available.
    pub fn standard(http_client: Arc<dyn HttpClient>, alphavantage_api_key: Option<&str>) -> Self {
        let mut sources: Vec<Arc<dyn QuoteSource>> =
            vec![Arc::new(YahooQuoteAdapter::new(Arc::clone(&http_client)))];
        if let Some(api_key) = alphavantage_api_key {
            sources.push(Arc::new(AlphaVantageQuoteAdapter::new(http_client, api_key)));
        }
        Self::new(sources)
    }

    pub fn source_chain(&self) -> Vec<ProviderId> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    pub async fn route(&self, ticker: &Ticker) -> RouteResult<Quote> {
        route_chain(
            &self.sources,
            |source| source.id(),
            |source| source.quote(ticker),
        )
        .await
    }

    /// Price from the first provider that has one, or the `N/A` quote.
    pub async fn get_quote(&self, ticker: &Ticker) -> Quote {
        match self.route(ticker).await {
            Ok(success) => success.data,
            Err(failure) => {
                tracing::warn!(%ticker, reasons = %failure.summary(), "no quote source answered, using sentinel");
                Quote::unavailable(ticker.clone())
            }
        }
    }
}

/// News chain. An empty answer counts as a failed attempt.
#[derive(Clone)]
pub struct NewsRouter {
    sources: Vec<Arc<dyn NewsSource>>,
    limit: usize,
}

impl NewsRouter {
    /// `limit` is clamped to at least one snippet.
    pub fn new(sources: Vec<Arc<dyn NewsSource>>, limit: usize) -> Self {
        Self {
            sources: dedupe(sources, |source| source.id()),
            limit: limit.max(1),
        }
    }

    /// Yahoo search, then the Google News feed, then DuckDuckGo.
    pub fn standard(http_client: Arc<dyn HttpClient>, limit: usize) -> Self {
        Self::new(
            vec![
                Arc::new(YahooNewsAdapter::new(Arc::clone(&http_client))),
                Arc::new(GoogleNewsAdapter::new(Arc::clone(&http_client))),
                Arc::new(DuckDuckGoNewsAdapter::new(http_client)),
            ],
            limit,
        )
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub fn source_chain(&self) -> Vec<ProviderId> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    pub async fn route(&self, ticker: &Ticker) -> RouteResult<Vec<NewsSnippet>> {
        let limit = self.limit;
        route_chain(
            &self.sources,
            |source| source.id(),
            |source| {
                Box::pin(async move {
                    let mut news = source.news(ticker, limit).await?;
                    if news.is_empty() {
                        return Err(SourceError::not_found(format!(
                            "{} returned no news for {ticker}",
                            source.id()
                        )));
                    }
                    news.truncate(limit);
                    Ok(news)
                })
            },
        )
        .await
    }

    /// Snippets from the first provider that has any, or an empty list.
    pub async fn get_news(&self, ticker: &Ticker) -> Vec<NewsSnippet> {
        match self.route(ticker).await {
            Ok(success) => success.data,
            Err(failure) => {
                tracing::warn!(%ticker, reasons = %failure.summary(), "no news source answered, using sentinel");
                Vec::new()
            }
        }
    }
}

async fn route_chain<'s, S, T, I, F>(chain: &'s [Arc<S>], id: I, mut invoke: F) -> RouteResult<T>
where
    S: ?Sized + 's,
    I: Fn(&S) -> ProviderId,
    F: FnMut(&'s S) -> SourceFuture<'s, T>,
{
    let started = Instant::now();
    let mut source_chain = Vec::with_capacity(chain.len());
    let mut errors = Vec::new();

    for source in chain {
        let provider = id(source.as_ref());
        source_chain.push(provider);

        match invoke(source.as_ref()).await {
            Ok(data) => {
                let mut warnings = Vec::new();
                if !errors.is_empty() {
                    tracing::info!(%provider, failed = errors.len(), "fallback source answered");
                    warnings.push(format!(
                        "source fallback succeeded with '{}' after {} failed attempt(s)",
                        provider.as_str(),
                        errors.len()
                    ));
                }

                return Ok(RouteSuccess {
                    data,
                    selected_source: provider,
                    source_chain,
                    warnings,
                    errors,
                    latency_ms: elapsed_ms(started),
                });
            }
            Err(error) => {
                tracing::debug!(%provider, %error, "source attempt failed");
                errors.push(RouteAttemptError {
                    source: provider,
                    error,
                });
            }
        }
    }

    Err(RouteFailure {
        source_chain,
        errors,
        latency_ms: elapsed_ms(started),
    })
}

fn dedupe<S: ?Sized>(sources: Vec<Arc<S>>, id: impl Fn(&S) -> ProviderId) -> Vec<Arc<S>> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| seen.insert(id(source.as_ref())))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
