use std::sync::Arc;

use tickerbrief_core::{
    AlphaVantageQuoteAdapter, DuckDuckGoNewsAdapter, GoogleNewsAdapter, HttpClient, HttpError,
    HttpResponse, NewsSource, ProviderId, QuoteSource, ScriptedHttpClient, SourceErrorKind, Ticker,
    YahooNewsAdapter, YahooQuoteAdapter,
};

struct QuoteCase {
    id: ProviderId,
    url_fragment: &'static str,
    ok_body: &'static str,
    build: fn(Arc<dyn HttpClient>) -> Arc<dyn QuoteSource>,
}

struct NewsCase {
    id: ProviderId,
    url_fragment: &'static str,
    five_items_body: &'static str,
    build: fn(Arc<dyn HttpClient>) -> Arc<dyn NewsSource>,
}

fn quote_cases() -> Vec<QuoteCase> {
    vec![
        QuoteCase {
            id: ProviderId::Yahoo,
            url_fragment: "/v8/finance/chart/",
            ok_body: r#"{"chart":{"result":[{"meta":{"regularMarketPrice":101.256}}],"error":null}}"#,
            build: |client| Arc::new(YahooQuoteAdapter::new(client)),
        },
        QuoteCase {
            id: ProviderId::Alphavantage,
            url_fragment: "alphavantage.co",
            ok_body: r#"{"Global Quote":{"05. price":"101.2560"}}"#,
            build: |client| Arc::new(AlphaVantageQuoteAdapter::new(client, "demo")),
        },
    ]
}

fn news_cases() -> Vec<NewsCase> {
    vec![
        NewsCase {
            id: ProviderId::YahooNews,
            url_fragment: "/v1/finance/search",
            five_items_body: r#"{"news":[{"title":"one"},{"title":"two"},{"title":"three"},{"title":"four"},{"title":"five"}]}"#,
            build: |client| Arc::new(YahooNewsAdapter::new(client)),
        },
        NewsCase {
            id: ProviderId::GoogleNews,
            url_fragment: "news.google.com",
            five_items_body: "<rss><channel>\
                <item><title>one - A</title></item><item><title>two - B</title></item>\
                <item><title>three - C</title></item><item><title>four - D</title></item>\
                <item><title>five - E</title></item></channel></rss>",
            build: |client| Arc::new(GoogleNewsAdapter::new(client)),
        },
        NewsCase {
            id: ProviderId::Duckduckgo,
            url_fragment: "html.duckduckgo.com",
            five_items_body: r#"<html><body>
                <div class="result"><a class="result__a" href="https://a.test">one</a></div>
                <div class="result"><a class="result__a" href="https://b.test">two</a></div>
                <div class="result"><a class="result__a" href="https://c.test">three</a></div>
                <div class="result"><a class="result__a" href="https://d.test">four</a></div>
                <div class="result"><a class="result__a" href="https://e.test">five</a></div>
                </body></html>"#,
            build: |client| Arc::new(DuckDuckGoNewsAdapter::new(client)),
        },
    ]
}

fn ticker() -> Ticker {
    Ticker::parse("NVDA").expect("valid ticker")
}

#[tokio::test]
async fn quote_sources_report_their_id_and_a_two_decimal_price() {
    for case in quote_cases() {
        let client = Arc::new(
            ScriptedHttpClient::new().respond(case.url_fragment, HttpResponse::ok(case.ok_body)),
        );
        let source = (case.build)(client.clone());

        let quote = source.quote(&ticker()).await.expect("quote should parse");

        assert_eq!(source.id(), case.id);
        assert_eq!(quote.source, Some(case.id));
        assert_eq!(quote.ticker, ticker());
        assert_eq!(quote.formatted_price(), "101.26", "provider {}", case.id);
        assert_eq!(client.requests().len(), 1, "one call per attempt for {}", case.id);
    }
}

#[tokio::test]
async fn quote_sources_make_a_single_bounded_attempt_on_transport_failure() {
    for case in quote_cases() {
        let client = Arc::new(
            ScriptedHttpClient::new().fail(case.url_fragment, HttpError::new("request timeout")),
        );
        let source = (case.build)(client.clone());

        let error = source.quote(&ticker()).await.expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable, "provider {}", case.id);
        assert!(error.retryable());
        let requests = client.requests();
        assert_eq!(requests.len(), 1, "adapters never retry ({})", case.id);
        assert!((5_000..=10_000).contains(&requests[0].timeout_ms));
    }
}

#[tokio::test]
async fn quote_sources_classify_undecodable_payloads_as_malformed() {
    for case in quote_cases() {
        let client = Arc::new(
            ScriptedHttpClient::new().respond(case.url_fragment, HttpResponse::ok("<html>captcha</html>")),
        );
        let source = (case.build)(client);

        let error = source.quote(&ticker()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::MalformedResponse, "provider {}", case.id);
    }
}

#[tokio::test]
async fn quote_sources_map_server_errors_to_unavailable_and_429_to_rate_limited() {
    for case in quote_cases() {
        for (status, kind) in [(503, SourceErrorKind::Unavailable), (429, SourceErrorKind::RateLimited)] {
            let client = Arc::new(
                ScriptedHttpClient::new().respond(case.url_fragment, HttpResponse::new(status, "")),
            );
            let source = (case.build)(client);

            let error = source.quote(&ticker()).await.expect_err("must fail");
            assert_eq!(error.kind(), kind, "provider {} status {status}", case.id);
        }
    }
}

#[tokio::test]
async fn news_sources_truncate_to_the_requested_limit_in_retrieval_order() {
    for case in news_cases() {
        let client = Arc::new(
            ScriptedHttpClient::new().respond(case.url_fragment, HttpResponse::ok(case.five_items_body)),
        );
        let source = (case.build)(client);

        let news = source.news(&ticker(), 3).await.expect("news should parse");

        assert_eq!(source.id(), case.id);
        let titles: Vec<&str> = news.iter().map(|snippet| snippet.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"], "provider {}", case.id);
    }
}

#[tokio::test]
async fn news_sources_surface_transport_failures_as_errors() {
    for case in news_cases() {
        let client = Arc::new(
            ScriptedHttpClient::new().fail(case.url_fragment, HttpError::new("connection refused")),
        );
        let source = (case.build)(client.clone());

        let error = source.news(&ticker(), 3).await.expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable, "provider {}", case.id);
        assert_eq!(client.requests().len(), 1);
    }
}
