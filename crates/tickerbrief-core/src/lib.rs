//! # Tickerbrief Core
//!
//! Daily market brief pipeline: per-ticker quotes and headlines collected
//! through provider fallback chains, summarized by a generation model picked
//! at run time, and delivered to a chat.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo, Alpha Vantage, Google News, DuckDuckGo) |
//! | [`aggregator`] | Sequential per-ticker collection with pacing |
//! | [`config`] | Run configuration read once from the environment |
//! | [`data_source`] | Quote/news source traits and [`SourceError`] |
//! | [`domain`] | Domain models (Ticker, Quote, NewsSnippet, Report) |
//! | [`error`] | Validation errors |
//! | [`generation`] | Generation client, model selection, report generation |
//! | [`http_client`] | HTTP client abstraction |
//! | [`notify`] | Telegram and console delivery |
//! | [`pipeline`] | End-to-end run with no-data and crash notices |
//! | [`retry`] | Bounded retry policy |
//! | [`routing`] | Ordered provider fallback and sentinel mapping |
//! | [`source`] | Provider identifiers |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Pipeline │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Aggregator │────▶│ Quote/News Router│
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       ▼
//!          │              ┌──────────────────┐     ┌─────────────┐
//!          │              │ Source Adapters  │────▶│ HTTP Client │
//!          │              └──────────────────┘     └─────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Model Selector  │────▶│ Report Generator │────▶ Notifier
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapters return typed errors; routers turn an exhausted chain into the
//! `N/A` / `No news found` sentinels so one ticker never aborts a run:
//!
//! ```rust
//! use tickerbrief_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => "throttled, next provider",
//!         SourceErrorKind::NotFound => "no data for this ticker",
//!         _ => "provider failed, next provider",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Credentials are read from the environment only and never logged
//! - The generation key travels in a header, not the URL
//! - Request URLs are logged without their query string

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod generation;
pub mod http_client;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod routing;
pub mod source;

// Adapter implementations
pub use adapters::{
    AlphaVantageQuoteAdapter, DuckDuckGoNewsAdapter, GoogleNewsAdapter, YahooNewsAdapter,
    YahooQuoteAdapter,
};

pub use aggregator::DataAggregator;

pub use config::{BriefConfig, ConfigError, ModelStrategy, TelegramConfig};

// Source traits and errors
pub use data_source::{NewsSource, QuoteSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    AggregatedBlock, AggregatedEntry, ModelDescriptor, ModelId, NewsSnippet, Price, Quote, Report,
    Ticker, NEWS_SENTINEL, PRICE_SENTINEL,
};

pub use error::ValidationError;

// Generation
pub use generation::{
    GeminiClient, GenerationClient, GenerationError, GenerationErrorKind, ModelRule,
    ModelSelector, ProbeSelector, ReportGenerator, SelectionStrategy,
};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

pub use notify::{ConsoleNotifier, Notifier, NotifyError, TelegramNotifier};

pub use pipeline::{Pipeline, PipelineError, PipelineOutcome, CRASH_NOTICE, NO_DATA_NOTICE};

pub use retry::{Backoff, RetryPolicy};

// Routing types
pub use routing::{NewsRouter, QuoteRouter, RouteAttemptError, RouteFailure, RouteResult, RouteSuccess};

pub use source::ProviderId;
