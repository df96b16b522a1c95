//! Per-run generation model choice.
//!
//! Model identifiers are retired regularly, so nothing here hardcodes the one
//! to use. [`ModelSelector`] reads the provider's listing and applies an
//! ordered rule cascade; [`ProbeSelector`] skips the listing and tries a
//! candidate list with a tiny prompt. Both end on a configured fallback
//! identifier rather than failing: a stale fallback surfaces later as a
//! generation error.

use super::{GenerationClient, GenerationErrorKind};
use crate::{ModelDescriptor, ModelId};

/// Markers of unstable endpoints, excluded by every default rule.
const UNSTABLE_MARKERS: [&str; 2] = ["exp", "preview"];

/// Default fallback when selection finds nothing.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Name-substring predicate over model identifiers, case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRule {
    name: String,
    required: Vec<String>,
    excluded: Vec<String>,
}

impl ModelRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn requiring(mut self, token: impl Into<String>) -> Self {
        self.required.push(token.into().to_ascii_lowercase());
        self
    }

    pub fn excluding(mut self, token: impl Into<String>) -> Self {
        self.excluded.push(token.into().to_ascii_lowercase());
        self
    }

    fn excluding_unstable(self) -> Self {
        UNSTABLE_MARKERS
            .iter()
            .fold(self, |rule, marker| rule.excluding(*marker))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, model: &ModelId) -> bool {
        let id = model.as_str().to_ascii_lowercase();
        self.required.iter().all(|token| id.contains(token.as_str()))
            && !self.excluded.iter().any(|token| id.contains(token.as_str()))
    }

    /// Most specific first: fast tier at a pinned version, any stable fast
    /// tier, then any stable general-purpose tier.
    pub fn default_cascade() -> Vec<Self> {
        vec![
            Self::new("flash-1.5")
                .requiring("flash")
                .requiring("1.5")
                .excluding_unstable(),
            Self::new("flash").requiring("flash").excluding_unstable(),
            Self::new("pro").requiring("pro").excluding_unstable(),
        ]
    }
}

/// Catalog-driven selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    rules: Vec<ModelRule>,
    fallback: ModelId,
}

impl ModelSelector {
    pub fn new(rules: Vec<ModelRule>, fallback: ModelId) -> Self {
        Self { rules, fallback }
    }

    pub fn with_fallback(fallback: ModelId) -> Self {
        Self::new(ModelRule::default_cascade(), fallback)
    }

    pub fn fallback(&self) -> &ModelId {
        &self.fallback
    }

    /// Pick from an already fetched listing.
    ///
    /// Only descriptors advertising generation are considered. Within the
    /// first rule that matches anything, listing order decides.
    pub fn select_from(&self, descriptors: &[ModelDescriptor]) -> ModelId {
        let candidates: Vec<&ModelDescriptor> = descriptors
            .iter()
            .filter(|descriptor| descriptor.advertises_generation())
            .collect();

        for rule in &self.rules {
            if let Some(descriptor) = candidates.iter().find(|descriptor| rule.matches(&descriptor.id)) {
                tracing::debug!(rule = rule.name(), model = %descriptor.id, "model rule matched");
                return descriptor.id.clone();
            }
        }

        tracing::warn!(
            candidates = candidates.len(),
            fallback = %self.fallback,
            "no listed model matched, using fallback"
        );
        self.fallback.clone()
    }

    /// List models and pick one. Listing failures fall back silently.
    pub async fn select(&self, client: &dyn GenerationClient) -> ModelId {
        match client.list_models().await {
            Ok(descriptors) => self.select_from(&descriptors),
            Err(error) => {
                tracing::warn!(%error, fallback = %self.fallback, "model listing failed, using fallback");
                self.fallback.clone()
            }
        }
    }
}

/// Probe-driven selection: first candidate that answers a trivial prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSelector {
    candidates: Vec<ModelId>,
    fallback: ModelId,
    probe_prompt: String,
}

impl ProbeSelector {
    pub fn new(candidates: Vec<ModelId>, fallback: ModelId) -> Self {
        Self {
            candidates,
            fallback,
            probe_prompt: String::from("Reply with OK."),
        }
    }

    /// Canonical identifiers the default cascade aims for, in the same order.
    pub fn default_candidates() -> Vec<ModelId> {
        [
            "gemini-1.5-flash",
            "gemini-1.5-flash-latest",
            "gemini-2.0-flash",
            "gemini-1.5-pro",
            "gemini-pro",
        ]
        .iter()
        .filter_map(|raw| ModelId::parse(raw).ok())
        .collect()
    }

    pub fn with_fallback(fallback: ModelId) -> Self {
        Self::new(Self::default_candidates(), fallback)
    }

    /// A rate-limited probe counts as a hit: the endpoint exists and the
    /// report generator has its own retry for the quota.
    pub async fn select(&self, client: &dyn GenerationClient) -> ModelId {
        for candidate in &self.candidates {
            match client.generate(candidate, &self.probe_prompt).await {
                Ok(_) => return candidate.clone(),
                Err(error) if error.kind() == GenerationErrorKind::RateLimited => {
                    tracing::debug!(model = %candidate, "probe rate limited, accepting candidate");
                    return candidate.clone();
                }
                Err(error) => {
                    tracing::debug!(model = %candidate, %error, "probe failed");
                }
            }
        }

        tracing::warn!(fallback = %self.fallback, "no probe candidate answered, using fallback");
        self.fallback.clone()
    }
}

/// Selection strategy chosen by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    Catalog(ModelSelector),
    Probe(ProbeSelector),
}

impl SelectionStrategy {
    pub async fn select(&self, client: &dyn GenerationClient) -> ModelId {
        match self {
            Self::Catalog(selector) => selector.select(client).await,
            Self::Probe(selector) => selector.select(client).await,
        }
    }
}
