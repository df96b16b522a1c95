//! Run configuration, read once at startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GOOGLE_API_KEY` | required for generation |
//! | `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` | unset: print locally |
//! | `TICKERBRIEF_TICKERS` | `NVDA,TSLA,AAPL` |
//! | `TICKERBRIEF_NEWS_LIMIT` | `3`, clamped to `1..=3` |
//! | `TICKERBRIEF_PAUSE_MS` | `1500` |
//! | `TICKERBRIEF_LANGUAGE` | `Arabic` |
//! | `TICKERBRIEF_FALLBACK_MODEL` | `gemini-1.5-flash` |
//! | `TICKERBRIEF_MODEL_STRATEGY` | `catalog` (or `probe`) |
//! | `TICKERBRIEF_ALPHAVANTAGE_API_KEY` / `ALPHAVANTAGE_API_KEY` | unset: Yahoo only |

use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::generation::selector::DEFAULT_FALLBACK_MODEL;
use crate::generation::{ModelSelector, ProbeSelector, SelectionStrategy};
use crate::{ModelId, Ticker, ValidationError};

pub const DEFAULT_TICKERS: &str = "NVDA,TSLA,AAPL";
pub const DEFAULT_LANGUAGE: &str = "Arabic";
pub const MAX_NEWS_LIMIT: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("no tickers configured")]
    NoTickers,

    #[error("invalid ticker list: {0}")]
    Ticker(#[from] ValidationError),
}

/// How the generation model is chosen each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStrategy {
    /// Capability listing plus rule cascade.
    #[default]
    Catalog,
    /// Trivial generate call per candidate.
    Probe,
}

impl FromStr for ModelStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "catalog" | "list" => Ok(Self::Catalog),
            "probe" => Ok(Self::Probe),
            other => Err(format!("expected 'catalog' or 'probe', got '{other}'")),
        }
    }
}

/// Bot credentials; only present when both parts are configured.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl Debug for TelegramConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Everything a run needs, passed by reference into each component.
#[derive(Clone, PartialEq, Eq)]
pub struct BriefConfig {
    pub google_api_key: Option<String>,
    pub telegram: Option<TelegramConfig>,
    pub tickers: Vec<Ticker>,
    pub news_limit: usize,
    pub pause: Duration,
    pub language: String,
    pub fallback_model: ModelId,
    pub model_strategy: ModelStrategy,
    pub alphavantage_api_key: Option<String>,
}

impl BriefConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let telegram = match (get("TELEGRAM_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig { token, chat_id }),
            (None, None) => None,
            (token, _) => {
                let missing = if token.is_some() { "TELEGRAM_CHAT_ID" } else { "TELEGRAM_TOKEN" };
                tracing::warn!(missing, "telegram only partially configured, printing locally");
                None
            }
        };

        let raw_tickers = get("TICKERBRIEF_TICKERS").unwrap_or_else(|| DEFAULT_TICKERS.to_owned());
        let tickers = Ticker::parse_list(&raw_tickers)?;
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }

        let news_limit = parse_or(
            "TICKERBRIEF_NEWS_LIMIT",
            get("TICKERBRIEF_NEWS_LIMIT"),
            MAX_NEWS_LIMIT,
        )?
        .clamp(1, MAX_NEWS_LIMIT);
        let pause_ms = parse_or("TICKERBRIEF_PAUSE_MS", get("TICKERBRIEF_PAUSE_MS"), 1_500_u64)?;

        let fallback_raw = get("TICKERBRIEF_FALLBACK_MODEL")
            .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_owned());
        let fallback_model = ModelId::parse(&fallback_raw).map_err(|error| ConfigError::Invalid {
            name: "TICKERBRIEF_FALLBACK_MODEL",
            value: fallback_raw.clone(),
            reason: error.to_string(),
        })?;

        let model_strategy = match get("TICKERBRIEF_MODEL_STRATEGY") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: "TICKERBRIEF_MODEL_STRATEGY",
                value: raw,
                reason,
            })?,
            None => ModelStrategy::default(),
        };

        Ok(Self {
            google_api_key: get("GOOGLE_API_KEY"),
            telegram,
            tickers,
            news_limit,
            pause: Duration::from_millis(pause_ms),
            language: get("TICKERBRIEF_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
            fallback_model,
            model_strategy,
            alphavantage_api_key: get("TICKERBRIEF_ALPHAVANTAGE_API_KEY")
                .or_else(|| get("ALPHAVANTAGE_API_KEY")),
        })
    }

    /// Generation credential; its absence stops a run before any work.
    pub fn require_google_api_key(&self) -> Result<&str, ConfigError> {
        self.google_api_key
            .as_deref()
            .ok_or(ConfigError::Missing { name: "GOOGLE_API_KEY" })
    }

    /// Replace the configured ticker list.
    pub fn with_tickers(mut self, tickers: Vec<Ticker>) -> Result<Self, ConfigError> {
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        self.tickers = tickers;
        Ok(self)
    }

    pub fn selection_strategy(&self) -> SelectionStrategy {
        let fallback = self.fallback_model.clone();
        match self.model_strategy {
            ModelStrategy::Catalog => {
                SelectionStrategy::Catalog(ModelSelector::with_fallback(fallback))
            }
            ModelStrategy::Probe => {
                SelectionStrategy::Probe(ProbeSelector::with_fallback(fallback))
            }
        }
    }
}

impl Debug for BriefConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("BriefConfig")
            .field("google_api_key", &redacted(&self.google_api_key))
            .field("telegram", &self.telegram)
            .field("tickers", &self.tickers)
            .field("news_limit", &self.news_limit)
            .field("pause", &self.pause)
            .field("language", &self.language)
            .field("fallback_model", &self.fallback_model)
            .field("model_strategy", &self.model_strategy)
            .field("alphavantage_api_key", &redacted(&self.alphavantage_api_key))
            .finish()
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|error: T::Err| ConfigError::Invalid {
            name,
            reason: error.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BriefConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        BriefConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = config(&[("GOOGLE_API_KEY", "g-key")]).expect("valid config");

        assert_eq!(config.require_google_api_key(), Ok("g-key"));
        let tickers: Vec<&str> = config.tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(tickers, vec!["NVDA", "TSLA", "AAPL"]);
        assert_eq!(config.news_limit, 3);
        assert_eq!(config.pause, Duration::from_millis(1_500));
        assert_eq!(config.language, "Arabic");
        assert_eq!(config.fallback_model.as_str(), "gemini-1.5-flash");
        assert_eq!(config.model_strategy, ModelStrategy::Catalog);
        assert!(config.telegram.is_none());
        assert!(config.alphavantage_api_key.is_none());
    }

    #[test]
    fn missing_generation_key_is_reported_on_demand() {
        let config = config(&[]).expect("collection does not need the key");
        assert_eq!(
            config.require_google_api_key(),
            Err(ConfigError::Missing { name: "GOOGLE_API_KEY" })
        );
    }

    #[test]
    fn partial_telegram_credentials_are_ignored() {
        let config = config(&[("TELEGRAM_TOKEN", "t")]).expect("valid config");
        assert!(config.telegram.is_none());

        let config = config_with_both();
        assert_eq!(config.telegram.as_ref().map(|t| t.chat_id.as_str()), Some("42"));
    }

    fn config_with_both() -> BriefConfig {
        config(&[("TELEGRAM_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "42")]).expect("valid config")
    }

    #[test]
    fn news_limit_is_clamped_and_bad_numbers_rejected() {
        assert_eq!(config(&[("TICKERBRIEF_NEWS_LIMIT", "10")]).expect("valid").news_limit, 3);
        assert_eq!(config(&[("TICKERBRIEF_NEWS_LIMIT", "0")]).expect("valid").news_limit, 1);

        let error = config(&[("TICKERBRIEF_PAUSE_MS", "soon")]).expect_err("must fail");
        assert!(matches!(error, ConfigError::Invalid { name: "TICKERBRIEF_PAUSE_MS", .. }));
    }

    #[test]
    fn tickers_and_strategy_are_parsed() {
        let config = config(&[
            ("TICKERBRIEF_TICKERS", "btc-usd, msft ,"),
            ("TICKERBRIEF_MODEL_STRATEGY", "Probe"),
            ("ALPHAVANTAGE_API_KEY", "av"),
        ])
        .expect("valid config");

        let tickers: Vec<&str> = config.tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(tickers, vec!["BTC-USD", "MSFT"]);
        assert_eq!(config.model_strategy, ModelStrategy::Probe);
        assert!(matches!(config.selection_strategy(), SelectionStrategy::Probe(_)));
        assert_eq!(config.alphavantage_api_key.as_deref(), Some("av"));
    }

    #[test]
    fn blank_ticker_list_is_rejected() {
        assert_eq!(config(&[("TICKERBRIEF_TICKERS", " , ")]), Err(ConfigError::NoTickers));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config(&[
            ("GOOGLE_API_KEY", "super-secret"),
            ("TELEGRAM_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
        ])
        .expect("valid config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
