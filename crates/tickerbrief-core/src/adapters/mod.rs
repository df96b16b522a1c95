mod alphavantage;
mod duckduckgo;
mod google_news;
mod yahoo;

pub use alphavantage::AlphaVantageQuoteAdapter;
pub use duckduckgo::DuckDuckGoNewsAdapter;
pub use google_news::GoogleNewsAdapter;
pub use yahoo::{YahooNewsAdapter, YahooQuoteAdapter};
