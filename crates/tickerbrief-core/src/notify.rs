//! Message delivery.
//!
//! | Notifier | Used when |
//! |----------|-----------|
//! | [`TelegramNotifier`] | bot token and chat id are configured |
//! | [`ConsoleNotifier`] | messaging credentials are absent, or on dry runs |

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::http_client::{HttpClient, HttpError, HttpRequest};
use crate::retry::{Backoff, RetryPolicy};

/// Telegram rejects `sendMessage` text longer than this.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("delivery transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("delivery rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },

    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    pub fn is_retryable(&self) -> bool {
        match self {
            // A timed-out sendMessage may already have been delivered.
            Self::Transport(error) => error.retryable() && !error.is_timeout(),
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyMessage | Self::Io(_) => false,
        }
    }

    const fn is_bad_request(&self) -> bool {
        matches!(self, Self::Rejected { status: 400, .. })
    }
}

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Delivery channel for the final message.
pub trait Notifier: Send + Sync {
    /// Short channel name for logs.
    fn channel(&self) -> &'static str;

    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a>;
}

/// Telegram Bot API `sendMessage` delivery.
///
/// Messages go out with Markdown parsing. Generated text often contains
/// unbalanced `*` or `_`, which Telegram rejects with 400; such a chunk is
/// resent once as plain text.
#[derive(Clone)]
pub struct TelegramNotifier {
    http_client: Arc<dyn HttpClient>,
    token: String,
    chat_id: String,
    base_url: String,
    retry: RetryPolicy,
}

impl TelegramNotifier {
    pub fn new(http_client: Arc<dyn HttpClient>, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http_client,
            token: token.into(),
            chat_id: chat_id.into(),
            base_url: String::from(TELEGRAM_BASE_URL),
            retry: RetryPolicy {
                max_retries: 2,
                backoff: Backoff::Exponential {
                    base: Duration::from_secs(1),
                    factor: 2.0,
                    max: Duration::from_secs(8),
                    jitter: true,
                },
            },
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post(&self, text: &str, markdown: bool) -> Result<(), NotifyError> {
        let mut body = json!({ "chat_id": self.chat_id, "text": text });
        if markdown {
            body["parse_mode"] = json!("Markdown");
        }
        // The token is part of the path; never log this URL.
        let endpoint = format!("{}/bot{}/sendMessage", self.base_url, self.token);

        let response = self
            .http_client
            .execute(HttpRequest::post_json(endpoint, &body))
            .await?;

        if response.is_success() {
            return Ok(());
        }

        let description = serde_json::from_str::<TelegramErrorBody>(&response.body)
            .ok()
            .and_then(|error| error.description)
            .unwrap_or_else(|| String::from("no description"));
        Err(NotifyError::Rejected {
            status: response.status,
            description,
        })
    }

    async fn post_with_retry(&self, text: &str, markdown: bool) -> Result<(), NotifyError> {
        self.retry
            .run(|_| self.post(text, markdown), NotifyError::is_retryable)
            .await
    }

    async fn send_chunk(&self, chunk: &str) -> Result<(), NotifyError> {
        match self.post_with_retry(chunk, true).await {
            Err(error) if error.is_bad_request() => {
                tracing::warn!(%error, "telegram rejected markdown, resending as plain text");
                self.post_with_retry(chunk, false).await
            }
            other => other,
        }
    }

    async fn send_all(&self, message: &str) -> Result<(), NotifyError> {
        let chunks = split_message(message, TELEGRAM_MESSAGE_LIMIT);
        if chunks.is_empty() {
            return Err(NotifyError::EmptyMessage);
        }

        for chunk in &chunks {
            self.send_chunk(chunk).await?;
        }
        tracing::info!(chunks = chunks.len(), "telegram message delivered");
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn channel(&self) -> &'static str {
        "telegram"
    }

    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(self.send_all(message))
    }
}

/// Prints the message to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn channel(&self) -> &'static str {
        "console"
    }

    fn send<'a>(&'a self, message: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move { write_stdout(message) })
    }
}

fn write_stdout(message: &str) -> Result<(), NotifyError> {
    if message.trim().is_empty() {
        return Err(NotifyError::EmptyMessage);
    }
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{message}")?;
    stdout.flush()?;
    Ok(())
}

/// Split on line boundaries so that no chunk exceeds `limit` characters.
/// Lines longer than `limit` are cut at character boundaries.
pub fn split_message(message: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.trim().lines() {
        let line_len = line.chars().count();

        if line_len > limit {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(limit).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        let needed = if current_len == 0 { line_len } else { current_len + 1 + line_len };
        if needed > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

#[derive(Debug, Deserialize)]
struct TelegramErrorBody {
    #[serde(default)]
    description: Option<String>,
}
