//! # Domain Models
//!
//! Per-run value types for tickerbrief. Every value is created fresh for a run
//! and dropped at exit; nothing here is persisted.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated instrument symbol |
//! | [`Price`] | Last price or the `N/A` sentinel |
//! | [`Quote`] | Price for one ticker plus the provider that supplied it |
//! | [`NewsSnippet`] | Title with optional body and URL |
//! | [`AggregatedEntry`] | One ticker's quote and news as a text record |
//! | [`AggregatedBlock`] | All entries of a run |
//! | [`ModelId`] / [`ModelDescriptor`] | Generation endpoint identifiers |
//! | [`Report`] | Generated summary or the error standing in for it |

mod models;
mod ticker;

pub use models::{
    AggregatedBlock, AggregatedEntry, ModelDescriptor, ModelId, NewsSnippet, Price, Quote, Report,
    NEWS_SENTINEL, PRICE_SENTINEL,
};
pub use ticker::Ticker;
