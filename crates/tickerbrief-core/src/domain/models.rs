use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{ProviderId, Ticker, ValidationError};

/// Rendered in place of a price no provider could supply.
pub const PRICE_SENTINEL: &str = "N/A";

/// Rendered in place of news when no provider returned a snippet.
pub const NEWS_SENTINEL: &str = "No news found";

/// Last traded price, or the explicit "unavailable" marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Price {
    Last(f64),
    Unavailable,
}

impl Price {
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Last(_))
    }

    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Last(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Last(value) => write!(f, "{value:.2}"),
            Self::Unavailable => f.write_str(PRICE_SENTINEL),
        }
    }
}

/// Price snapshot for exactly one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub price: Price,
    /// Provider that supplied the price; `None` for the sentinel.
    pub source: Option<ProviderId>,
}

impl Quote {
    pub fn new(ticker: Ticker, price: f64, source: ProviderId) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        Ok(Self {
            ticker,
            price: Price::Last(price),
            source: Some(source),
        })
    }

    pub fn unavailable(ticker: Ticker) -> Self {
        Self {
            ticker,
            price: Price::Unavailable,
            source: None,
        }
    }

    /// Two-decimal price or [`PRICE_SENTINEL`].
    pub fn formatted_price(&self) -> String {
        self.price.to_string()
    }
}

/// Short news text associated with one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSnippet {
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
}

impl NewsSnippet {
    pub fn new(title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = collapse_whitespace(&title.into());
        if title.is_empty() {
            return Err(ValidationError::EmptyNewsTitle);
        }
        Ok(Self {
            title,
            body: None,
            url: None,
        })
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = collapse_whitespace(&body.into());
        self.body = (!body.is_empty()).then_some(body);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim();
        self.url = (!url.is_empty()).then(|| url.to_owned());
        self
    }

    fn render(&self) -> String {
        match &self.body {
            Some(body) => format!("{} ({body})", self.title),
            None => self.title.clone(),
        }
    }
}

/// One ticker's quote and news, rendered as a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    pub quote: Quote,
    pub news: Vec<NewsSnippet>,
}

impl AggregatedEntry {
    pub fn new(quote: Quote, news: Vec<NewsSnippet>) -> Self {
        Self { quote, news }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.quote.ticker
    }

    /// An entry is usable when it carries a real price or at least one snippet.
    pub fn is_usable(&self) -> bool {
        self.quote.price.is_available() || !self.news.is_empty()
    }

    pub fn render(&self) -> String {
        let news = if self.news.is_empty() {
            NEWS_SENTINEL.to_owned()
        } else {
            self.news
                .iter()
                .map(NewsSnippet::render)
                .collect::<Vec<_>>()
                .join("; ")
        };

        format!(
            "Stock: {} | Price: {} | News: {news}",
            self.quote.ticker,
            self.quote.formatted_price()
        )
    }
}

/// Ordered per-ticker records for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBlock {
    pub entries: Vec<AggregatedEntry>,
}

impl AggregatedBlock {
    pub fn new(entries: Vec<AggregatedEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// One line per entry, in ticker order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(AggregatedEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Generation endpoint identifier without the `models/` resource prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelId(String);

impl ModelId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix("models/").unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(ValidationError::EmptyModelId);
        }
        Ok(Self(bare.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource path used in generation URLs.
    pub fn resource_name(&self) -> String {
        format!("models/{}", self.0)
    }
}

impl Display for ModelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ModelId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelId> for String {
    fn from(value: ModelId) -> Self {
        value.0
    }
}

/// Entry of a provider's capability listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: ModelId,
    pub display_name: Option<String>,
    /// `None` when the listing did not report capabilities.
    pub supports_generation: Option<bool>,
}

impl ModelDescriptor {
    pub fn new(id: ModelId, supports_generation: Option<bool>) -> Self {
        Self {
            id,
            display_name: None,
            supports_generation,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn advertises_generation(&self) -> bool {
        self.supports_generation == Some(true)
    }
}

/// Final text of a run: the generated summary or the failure standing in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    Generated { model: ModelId, text: String },
    Failed { model: ModelId, error: String },
}

impl Report {
    pub fn model(&self) -> &ModelId {
        match self {
            Self::Generated { model, .. } | Self::Failed { model, .. } => model,
        }
    }

    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }

    /// Message delivered to the recipient. Failures carry the raw error detail.
    pub fn message(&self) -> String {
        match self {
            Self::Generated { text, .. } => text.clone(),
            Self::Failed { error, .. } => format!("Error details: {error}"),
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
