use std::sync::Arc;

use scraper::{Html, Selector};

use crate::data_source::{NewsSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, BROWSER_USER_AGENT};
use crate::{NewsSnippet, ProviderId, Ticker};

const BASE_URL: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo HTML results page, queried as `"{ticker} stock news"`.
///
/// Last resort in the news chain: results carry a snippet body, but ranking
/// is general web search rather than a news feed.
#[derive(Clone)]
pub struct DuckDuckGoNewsAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl DuckDuckGoNewsAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(BASE_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_news(&self, ticker: &Ticker, limit: usize) -> Result<Vec<NewsSnippet>, SourceError> {
        let query = format!("{ticker} stock news");
        let endpoint = format!("{}?q={}", self.base_url, urlencoding::encode(&query));
        let request = HttpRequest::get(endpoint)
            .with_header("user-agent", BROWSER_USER_AGENT)
            .with_timeout_ms(self.timeout_ms);
        tracing::debug!(provider = %ProviderId::Duckduckgo, url = request.redacted_url(), "requesting");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::transport(ProviderId::Duckduckgo, &error))?;

        // DuckDuckGo answers bot checks with 202 and an empty result page.
        if response.status == 202 {
            return Err(SourceError::rate_limited("duckduckgo served a bot challenge"));
        }
        if !response.is_success() {
            return Err(SourceError::status(ProviderId::Duckduckgo, response.status));
        }

        parse_results(&response.body, limit)
    }
}

impl NewsSource for DuckDuckGoNewsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Duckduckgo
    }

    fn news<'a>(&'a self, ticker: &'a Ticker, limit: usize) -> SourceFuture<'a, Vec<NewsSnippet>> {
        Box::pin(self.fetch_news(ticker, limit))
    }
}

fn parse_results(body: &str, limit: usize) -> Result<Vec<NewsSnippet>, SourceError> {
    let result_selector = selector("div.result:not(.result--ad)")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let document = Html::parse_document(body);
    let snippets = document
        .select(&result_selector)
        .filter_map(|result| {
            let anchor = result.select(&title_selector).next()?;
            let title: String = anchor.text().collect();
            let mut snippet = NewsSnippet::new(title).ok()?;

            if let Some(body) = result.select(&snippet_selector).next() {
                snippet = snippet.with_body(body.text().collect::<String>());
            }
            if let Some(href) = anchor.value().attr("href") {
                snippet = snippet.with_url(resolve_redirect(href));
            }
            Some(snippet)
        })
        .take(limit)
        .collect();

    Ok(snippets)
}

/// Result links point at `//duckduckgo.com/l/?uddg=<encoded target>`.
fn resolve_redirect(href: &str) -> String {
    href.split_once("uddg=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|| href.to_owned())
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|error| SourceError::internal(format!("invalid selector '{css}': {error}")))
}
