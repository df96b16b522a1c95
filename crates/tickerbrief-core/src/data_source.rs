//! Source adapter contracts and the structured error they return.
//!
//! Adapters never map failures to sentinels themselves: they return a typed
//! [`SourceError`] and leave the decision to the router, which falls through
//! to the next provider and only then substitutes `N/A` / `No news found`.
//!
//! | Contract | Output | Providers |
//! |----------|--------|-----------|
//! | [`QuoteSource`] | [`Quote`] | Yahoo chart, Alpha Vantage |
//! | [`NewsSource`] | `Vec<NewsSnippet>` | Yahoo search, Google News RSS, DuckDuckGo |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::http_client::HttpError;
use crate::{NewsSnippet, ProviderId, Quote, Ticker};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure or non-success status.
    Unavailable,
    RateLimited,
    /// Upstream answered but the payload could not be decoded.
    MalformedResponse,
    /// Payload decoded but the requested field or item was absent.
    NotFound,
    InvalidRequest,
    Internal,
}

/// Structured source error used by router fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    /// Classify a transport error from `provider`.
    pub fn transport(provider: ProviderId, error: &HttpError) -> Self {
        let message = format!("{provider} transport error: {}", error.message());
        if error.retryable() {
            Self::unavailable(message)
        } else {
            Self::internal(message)
        }
    }

    /// Classify a non-success HTTP status from `provider`.
    pub fn status(provider: ProviderId, status: u16) -> Self {
        let message = format!("{provider} returned status {status}");
        if status == 429 {
            Self::rate_limited(message)
        } else {
            Self::unavailable(message)
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Last-price provider for a single ticker.
///
/// Implementations make exactly one bounded upstream call per invocation and
/// never retry; fallback is the router's job.
pub trait QuoteSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, non-success status,
    /// undecodable payload, or a payload without a usable price.
    fn quote<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Quote>;
}

/// Headline provider for a single ticker.
///
/// An empty vector is a valid answer; the router treats it like a failure and
/// moves on to the next provider.
pub trait NewsSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Returns at most `limit` snippets in retrieval order.
    fn news<'a>(&'a self, ticker: &'a Ticker, limit: usize) -> SourceFuture<'a, Vec<NewsSnippet>>;
}
