use std::sync::Arc;

use scraper::{ElementRef, Html, Node, Selector};

use crate::data_source::{NewsSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, BROWSER_USER_AGENT};
use crate::{NewsSnippet, ProviderId, Ticker};

const BASE_URL: &str = "https://news.google.com/rss/search";

/// Google News RSS search, queried as `"{ticker} stock"`.
#[derive(Clone)]
pub struct GoogleNewsAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl GoogleNewsAdapter {
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
        let query = format!("{ticker} stock");
        let endpoint = format!(
            "{}?q={}&hl=en-US&gl=US&ceid=US:en",
            self.base_url,
            urlencoding::encode(&query)
        );
        let request = HttpRequest::get(endpoint)
            .with_header("user-agent", BROWSER_USER_AGENT)
            .with_timeout_ms(self.timeout_ms);
        tracing::debug!(provider = %ProviderId::GoogleNews, url = request.redacted_url(), "requesting");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::transport(ProviderId::GoogleNews, &error))?;

        if !response.is_success() {
            return Err(SourceError::status(ProviderId::GoogleNews, response.status));
        }

        parse_feed(&response.body, limit)
    }
}

impl NewsSource for GoogleNewsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleNews
    }

    fn news<'a>(&'a self, ticker: &'a Ticker, limit: usize) -> SourceFuture<'a, Vec<NewsSnippet>> {
        Box::pin(self.fetch_news(ticker, limit))
    }
}

/// Extract `<item>` headlines from an RSS document.
///
/// The feed goes through the HTML parser, which treats `<link>` as a void
/// element; the URL therefore ends up in the text node right after it.
fn parse_feed(body: &str, limit: usize) -> Result<Vec<NewsSnippet>, SourceError> {
    let item_selector = selector("item")?;
    let title_selector = selector("title")?;
    let link_selector = selector("link")?;

    let document = Html::parse_document(body);
    let snippets = document
        .select(&item_selector)
        .filter_map(|item| {
            let raw_title: String = item.select(&title_selector).next()?.text().collect();
            let snippet = NewsSnippet::new(strip_publisher(&strip_cdata(&raw_title))).ok()?;
            Some(match item.select(&link_selector).next().and_then(link_target) {
                Some(url) => snippet.with_url(url),
                None => snippet,
            })
        })
        .take(limit)
        .collect();

    Ok(snippets)
}

fn link_target(link: ElementRef<'_>) -> Option<String> {
    let inner: String = link.text().collect();
    if !inner.trim().is_empty() {
        return Some(inner.trim().to_owned());
    }
    match link.next_sibling()?.value() {
        Node::Text(text) => Some(text.trim().to_owned()).filter(|url| !url.is_empty()),
        _ => None,
    }
}

fn strip_cdata(raw: &str) -> String {
    raw.replace("<![CDATA[", "").replace("]]>", "")
}

/// Google appends `" - Publisher"` to every headline.
fn strip_publisher(title: &str) -> &str {
    match title.rfind(" - ") {
        Some(index) if index > 0 => &title[..index],
        _ => title,
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|error| SourceError::internal(format!("invalid selector '{css}': {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>"NVDA stock" - Google News</title>
<item><title>Nvidia shares climb on AI demand - Reuters</title><link>https://news.example.test/1</link></item>
<item><title><![CDATA[Chipmakers rally - Bloomberg]]></title><link>https://news.example.test/2</link></item>
<item><title>Third headline - CNBC</title><link>https://news.example.test/3</link></item>
</channel></rss>"#;

    #[test]
    fn feed_items_are_trimmed_to_limit_without_publisher() {
        let snippets = parse_feed(FEED, 2).expect("feed should parse");

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].title, "Nvidia shares climb on AI demand");
        assert_eq!(snippets[0].url.as_deref(), Some("https://news.example.test/1"));
        assert_eq!(snippets[1].title, "Chipmakers rally");
    }

    #[test]
    fn title_without_publisher_suffix_is_kept() {
        assert_eq!(strip_publisher("Plain headline"), "Plain headline");
        assert_eq!(strip_publisher("A - B - Source"), "A - B");
    }

    #[tokio::test]
    async fn query_targets_ticker_stock_search() {
        let client = Arc::new(ScriptedHttpClient::new().respond("news.google.com", HttpResponse::ok(FEED)));
        let adapter = GoogleNewsAdapter::new(client.clone());
        let ticker = Ticker::parse("NVDA").expect("valid ticker");

        let snippets = adapter.news(&ticker, 3).await.expect("news should parse");

        assert_eq!(snippets.len(), 3);
        assert!(client.requests()[0].url.contains("q=NVDA%20stock"));
    }

    #[tokio::test]
    async fn empty_feed_yields_no_snippets() {
        let client = Arc::new(ScriptedHttpClient::new().respond(
            "news.google.com",
            HttpResponse::ok("<rss><channel></channel></rss>"),
        ));
        let adapter = GoogleNewsAdapter::new(client);
        let ticker = Ticker::parse("NVDA").expect("valid ticker");

        let snippets = adapter.news(&ticker, 3).await.expect("empty feed is not an error");
        assert!(snippets.is_empty());
    }
}
