use std::time::Duration;

use crate::routing::{NewsRouter, QuoteRouter};
use crate::{AggregatedBlock, AggregatedEntry, Ticker};

/// Sequential per-ticker collection of quotes and news.
///
/// Tickers are processed strictly in order with a pause between them; one
/// ticker's failure never stops the next. Failed tickers stay in the block
/// with sentinel values, but a run where no ticker produced anything usable
/// yields an empty block.
#[derive(Clone)]
pub struct DataAggregator {
    quotes: QuoteRouter,
    news: NewsRouter,
    pause: Duration,
}

impl DataAggregator {
    pub fn new(quotes: QuoteRouter, news: NewsRouter) -> Self {
        Self {
            quotes,
            news,
            pause: Duration::from_millis(1_500),
        }
    }

    /// Delay after each ticker except the last.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn collect_entry(&self, ticker: &Ticker) -> AggregatedEntry {
        let quote = self.quotes.get_quote(ticker).await;
        let news = self.news.get_news(ticker).await;
        AggregatedEntry::new(quote, news)
    }

    pub async fn collect(&self, tickers: &[Ticker]) -> AggregatedBlock {
        let mut entries = Vec::with_capacity(tickers.len());

        for (index, ticker) in tickers.iter().enumerate() {
            let entry = self.collect_entry(ticker).await;
            tracing::info!(
                %ticker,
                price = %entry.quote.formatted_price(),
                news = entry.news.len(),
                "collected ticker"
            );
            entries.push(entry);

            if index + 1 < tickers.len() && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        if !entries.iter().any(AggregatedEntry::is_usable) {
            tracing::warn!(tickers = tickers.len(), "no ticker produced usable data");
            return AggregatedBlock::default();
        }

        AggregatedBlock::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};

    fn aggregator(client: Arc<ScriptedHttpClient>) -> DataAggregator {
        DataAggregator::new(
            QuoteRouter::standard(client.clone(), None),
            NewsRouter::standard(client, 3),
        )
        .with_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn entries_follow_ticker_order() {
        let client = Arc::new(
            ScriptedHttpClient::new()
                .respond(
                    "/chart/AAPL",
                    HttpResponse::ok(r#"{"chart":{"result":[{"meta":{"regularMarketPrice":227.5}}]}}"#),
                )
                .respond(
                    "/chart/MSFT",
                    HttpResponse::ok(r#"{"chart":{"result":[{"meta":{"regularMarketPrice":410}}]}}"#),
                ),
        );
        let tickers = Ticker::parse_list("MSFT,AAPL").expect("valid tickers");

        let block = aggregator(client).collect(&tickers).await;

        let rendered = block.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Stock: MSFT | Price: 410.00 | News: No news found",
                "Stock: AAPL | Price: 227.50 | News: No news found",
            ]
        );
    }

    #[tokio::test]
    async fn all_failed_tickers_yield_empty_block() {
        let client = Arc::new(ScriptedHttpClient::new());
        let tickers = Ticker::parse_list("NVDA,TSLA").expect("valid tickers");

        let block = aggregator(client).collect(&tickers).await;

        assert!(block.is_empty());
        assert_eq!(block.render(), "");
    }

    #[tokio::test]
    async fn empty_ticker_list_yields_empty_block() {
        let client = Arc::new(ScriptedHttpClient::new());
        let block = aggregator(client.clone()).collect(&[]).await;

        assert!(block.is_empty());
        assert!(client.requests().is_empty());
    }
}
