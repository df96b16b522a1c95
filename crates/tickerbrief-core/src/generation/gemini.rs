use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::{GenerationClient, GenerationError, GenerationErrorKind, GenerationFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::{ModelDescriptor, ModelId};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GENERATE_METHOD: &str = "generateContent";
const MAX_LIST_PAGES: usize = 10;

/// Content filter categories relaxed on every generate call. Market news
/// regularly trips the default thresholds.
const RELAXED_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google Generative Language API client.
///
/// The API key travels in the `x-goog-api-key` header so it never appears in
/// URLs or logs.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    base_url: String,
    timeout_ms: u64,
    relax_safety: bool,
}

impl GeminiClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            auth: HttpAuth::Header {
                name: String::from("x-goog-api-key"),
                value: api_key.into(),
            },
            base_url: String::from(BASE_URL),
            timeout_ms: 60_000,
            relax_safety: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Send the provider's default content filter instead of `BLOCK_NONE`.
    pub fn with_default_safety(mut self) -> Self {
        self.relax_safety = false;
        self
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if self.relax_safety {
            body["safetySettings"] = RELAXED_CATEGORIES
                .iter()
                .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
                .collect();
        }
        body
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GenerationError> {
        let request = request.with_auth(&self.auth).with_timeout_ms(self.timeout_ms);
        tracing::debug!(url = request.redacted_url(), "calling generation provider");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| GenerationError::transport(&error))?;

        if response.is_success() {
            return Ok(response);
        }

        let envelope = serde_json::from_str::<GeminiErrorEnvelope>(&response.body).ok();
        let (provider_status, message) = match envelope {
            Some(envelope) => (envelope.error.status, envelope.error.message),
            None => (None, None),
        };
        let message = format!(
            "generation provider returned {}: {}",
            response.status,
            message.unwrap_or_else(|| String::from("no error detail"))
        );
        Err(GenerationError::from_status(
            response.status,
            provider_status.as_deref(),
            message,
        ))
    }

    async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, GenerationError> {
        let mut descriptors = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut endpoint = format!("{}/models?pageSize=1000", self.base_url);
            if let Some(token) = &page_token {
                endpoint.push_str("&pageToken=");
                endpoint.push_str(&urlencoding::encode(token));
            }

            let response = self.send(HttpRequest::get(endpoint)).await?;
            let page: GeminiModelList = serde_json::from_str(&response.body).map_err(|error| {
                GenerationError::malformed(format!("failed to parse model listing: {error}"))
            })?;

            descriptors.extend(page.models.into_iter().filter_map(GeminiModel::into_descriptor));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(models = descriptors.len(), "listed generation models");
        Ok(descriptors)
    }

    async fn generate_text(&self, model: &ModelId, prompt: &str) -> Result<String, GenerationError> {
        let endpoint = format!(
            "{}/{}:{GENERATE_METHOD}",
            self.base_url,
            model.resource_name()
        );
        let response = self
            .send(HttpRequest::post_json(endpoint, &self.request_body(prompt)))
            .await?;

        let payload: GeminiGenerateResponse = serde_json::from_str(&response.body).map_err(|error| {
            GenerationError::malformed(format!("failed to parse generation response: {error}"))
        })?;

        if let Some(reason) = payload.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(GenerationError::blocked(format!("prompt blocked: {reason}")));
        }

        let Some(candidate) = payload.candidates.into_iter().next() else {
            return Err(GenerationError::new(
                GenerationErrorKind::EmptyResponse,
                "generation returned no candidates",
            ));
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(match candidate.finish_reason.as_deref() {
                Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                    GenerationError::blocked("candidate withheld by content filter")
                }
                reason => GenerationError::new(
                    GenerationErrorKind::EmptyResponse,
                    format!(
                        "generation returned no text (finish reason: {})",
                        reason.unwrap_or("unknown")
                    ),
                ),
            });
        }

        Ok(text)
    }
}

impl GenerationClient for GeminiClient {
    fn list_models<'a>(&'a self) -> GenerationFuture<'a, Vec<ModelDescriptor>> {
        Box::pin(self.fetch_models())
    }

    fn generate<'a>(&'a self, model: &'a ModelId, prompt: &'a str) -> GenerationFuture<'a, String> {
        Box::pin(self.generate_text(model, prompt))
    }
}

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiModel {
    name: String,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "supportedGenerationMethods", default)]
    supported_generation_methods: Option<Vec<String>>,
}

impl GeminiModel {
    fn into_descriptor(self) -> Option<ModelDescriptor> {
        let id = ModelId::parse(&self.name).ok()?;
        let supports_generation = self
            .supported_generation_methods
            .map(|methods| methods.iter().any(|method| method == GENERATE_METHOD));
        let descriptor = ModelDescriptor::new(id, supports_generation);
        Some(match self.display_name {
            Some(name) => descriptor.with_display_name(name),
            None => descriptor,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}
