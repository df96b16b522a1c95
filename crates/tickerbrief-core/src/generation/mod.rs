//! # Text Generation
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`gemini`] | Generative Language API client (listing + generate) |
//! | [`selector`] | Per-run model choice: catalog cascade or probing |
//! | [`report`] | Prompt rendering and the single rate-limit retry |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::http_client::HttpError;
use crate::{ModelDescriptor, ModelId};

pub mod gemini;
pub mod report;
pub mod selector;

pub use gemini::GeminiClient;
pub use report::ReportGenerator;
pub use selector::{ModelRule, ModelSelector, ProbeSelector, SelectionStrategy};

/// Generation failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// HTTP 429 or a `RESOURCE_EXHAUSTED` status.
    RateLimited,
    /// Unknown or retired model identifier.
    NotFound,
    Unauthorized,
    InvalidRequest,
    /// Prompt or candidate withheld by the content filter.
    Blocked,
    /// Successful call without any candidate text.
    EmptyResponse,
    Unavailable,
    MalformedResponse,
}

/// Structured error returned by a [`GenerationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    kind: GenerationErrorKind,
    message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::RateLimited, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::NotFound, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Blocked, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Unavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::MalformedResponse, message)
    }

    pub fn transport(error: &HttpError) -> Self {
        Self::unavailable(format!("generation transport error: {}", error.message()))
    }

    /// Classify a non-success status, with the provider's `error.status` when present.
    pub fn from_status(status: u16, provider_status: Option<&str>, message: impl Into<String>) -> Self {
        let kind = match (status, provider_status) {
            (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => GenerationErrorKind::RateLimited,
            (404, _) | (_, Some("NOT_FOUND")) => GenerationErrorKind::NotFound,
            (401 | 403, _) => GenerationErrorKind::Unauthorized,
            (400, _) => GenerationErrorKind::InvalidRequest,
            _ => GenerationErrorKind::Unavailable,
        };
        Self::new(kind, message)
    }

    pub const fn kind(&self) -> GenerationErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self.kind, GenerationErrorKind::RateLimited)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            GenerationErrorKind::RateLimited => "generation.rate_limited",
            GenerationErrorKind::NotFound => "generation.not_found",
            GenerationErrorKind::Unauthorized => "generation.unauthorized",
            GenerationErrorKind::InvalidRequest => "generation.invalid_request",
            GenerationErrorKind::Blocked => "generation.blocked",
            GenerationErrorKind::EmptyResponse => "generation.empty_response",
            GenerationErrorKind::Unavailable => "generation.unavailable",
            GenerationErrorKind::MalformedResponse => "generation.malformed_response",
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for GenerationError {}

pub type GenerationFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, GenerationError>> + Send + 'a>>;

/// Generation provider: capability listing plus single-prompt generation.
pub trait GenerationClient: Send + Sync {
    fn list_models<'a>(&'a self) -> GenerationFuture<'a, Vec<ModelDescriptor>>;

    fn generate<'a>(&'a self, model: &'a ModelId, prompt: &'a str) -> GenerationFuture<'a, String>;
}
