//! Behavior-driven tests for model selection and report generation
//!
//! Selection must never fail a run and generation must retry rate limits
//! exactly once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickerbrief_core::generation::GenerationFuture;
use tickerbrief_core::{
    AggregatedBlock, AggregatedEntry, GeminiClient, GenerationClient, GenerationError,
    GenerationErrorKind, HttpError, HttpResponse, ModelDescriptor, ModelId, ModelRule,
    ModelSelector, ProbeSelector, Quote, Report, ReportGenerator, RetryPolicy, ScriptedHttpClient,
    SelectionStrategy, Ticker,
};

/// Generation double answering from a queue; the last answer repeats.
struct QueuedGeneration {
    listing: Result<Vec<ModelDescriptor>, GenerationError>,
    answers: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<String>>,
}

impl QueuedGeneration {
    fn new(answers: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            listing: Ok(Vec::new()),
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl GenerationClient for QueuedGeneration {
    fn list_models<'a>(&'a self) -> GenerationFuture<'a, Vec<ModelDescriptor>> {
        let listing = self.listing.clone();
        Box::pin(async move { listing })
    }

    fn generate<'a>(&'a self, model: &'a ModelId, _prompt: &'a str) -> GenerationFuture<'a, String> {
        self.calls.lock().expect("calls lock").push(model.to_string());
        let mut answers = self.answers.lock().expect("answers lock");
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        };
        let answer = answer.unwrap_or_else(|| Err(GenerationError::unavailable("no scripted answer")));
        Box::pin(async move { answer })
    }
}

fn id(raw: &str) -> ModelId {
    ModelId::parse(raw).expect("valid model id")
}

fn block() -> AggregatedBlock {
    let ticker = Ticker::parse("NVDA").expect("valid ticker");
    AggregatedBlock::new(vec![AggregatedEntry::new(
        Quote::unavailable(ticker),
        Vec::new(),
    )])
}

fn fast_reporter() -> ReportGenerator {
    ReportGenerator::new("English").with_retry(RetryPolicy::fixed(Duration::ZERO, 1))
}

fn listing(body: &str) -> Arc<ScriptedHttpClient> {
    Arc::new(ScriptedHttpClient::new().respond("/models?", HttpResponse::ok(body)))
}

// =============================================================================
// Catalog selection
// =============================================================================

#[tokio::test]
async fn when_several_rules_match_the_most_specific_one_wins() {
    // Given: A listing with pro, 2.0 flash, an experimental 1.5 flash and a stable 1.5 flash
    let client = listing(
        r#"{"models":[
            {"name":"models/gemini-1.0-pro","supportedGenerationMethods":["generateContent"]},
            {"name":"models/gemini-2.0-flash","supportedGenerationMethods":["generateContent"]},
            {"name":"models/gemini-1.5-flash-exp-0827","supportedGenerationMethods":["generateContent"]},
            {"name":"models/gemini-1.5-flash-002","supportedGenerationMethods":["generateContent"]}
        ]}"#,
    );
    let gemini = GeminiClient::new(client, "key");
    let selector = ModelSelector::with_fallback(id("gemini-1.5-flash"));

    // When: A model is selected
    let model = selector.select(&gemini).await;

    // Then: The stable 1.5 flash model is chosen
    assert_eq!(model, id("gemini-1.5-flash-002"));
}

#[tokio::test]
async fn when_only_general_purpose_models_exist_the_last_rule_applies() {
    // Given: Only pro models, one of them a preview
    let client = listing(
        r#"{"models":[
            {"name":"models/gemini-2.5-pro-preview-03-25","supportedGenerationMethods":["generateContent"]},
            {"name":"models/gemini-1.5-pro","supportedGenerationMethods":["generateContent"]}
        ]}"#,
    );
    let gemini = GeminiClient::new(client, "key");

    // When: A model is selected
    let model = ModelSelector::with_fallback(id("gemini-1.5-flash")).select(&gemini).await;

    // Then: The stable pro model is chosen
    assert_eq!(model, id("gemini-1.5-pro"));
}

#[tokio::test]
async fn when_listing_is_empty_fallback_is_returned() {
    // Given: An empty listing
    let gemini = GeminiClient::new(listing(r#"{"models":[]}"#), "key");

    // When: A model is selected
    let model = ModelSelector::with_fallback(id("gemini-1.5-flash")).select(&gemini).await;

    // Then: The fallback identifier is used
    assert_eq!(model, id("gemini-1.5-flash"));
}

#[tokio::test]
async fn when_listing_fails_fallback_is_returned_without_error() {
    // Given: The listing endpoint is unreachable
    let client = Arc::new(ScriptedHttpClient::new().fail("/models?", HttpError::new("dns failure")));
    let gemini = GeminiClient::new(client, "key");

    // When: A model is selected
    let model = ModelSelector::with_fallback(id("gemini-pro")).select(&gemini).await;

    // Then: The configured fallback is used
    assert_eq!(model, id("gemini-pro"));
}

#[tokio::test]
async fn when_no_listed_model_advertises_generation_fallback_is_returned() {
    // Given: Only embedding models
    let client = listing(
        r#"{"models":[{"name":"models/embedding-flash-1.5","supportedGenerationMethods":["embedContent"]}]}"#,
    );
    let gemini = GeminiClient::new(client, "key");

    // When: A model is selected
    let model = ModelSelector::with_fallback(id("gemini-1.5-flash")).select(&gemini).await;

    // Then: The fallback identifier is used
    assert_eq!(model, id("gemini-1.5-flash"));
}

#[test]
fn custom_rules_are_evaluated_in_the_given_order() {
    // Given: A cascade preferring pro over flash
    let selector = ModelSelector::new(
        vec![
            ModelRule::new("pro").requiring("pro"),
            ModelRule::new("flash").requiring("flash"),
        ],
        id("fallback"),
    );
    let listing = vec![
        ModelDescriptor::new(id("gemini-1.5-flash"), Some(true)),
        ModelDescriptor::new(id("gemini-1.5-pro"), Some(true)),
    ];

    // When / Then: The first rule decides
    assert_eq!(selector.select_from(&listing), id("gemini-1.5-pro"));
}

// =============================================================================
// Probe selection
// =============================================================================

#[tokio::test]
async fn when_probing_the_first_candidate_that_answers_wins() {
    // Given: The first candidate is retired, the second answers
    let client = Arc::new(
        ScriptedHttpClient::new()
            .respond(
                "/models/gemini-old:generateContent",
                HttpResponse::new(404, r#"{"error":{"code":404,"message":"not found","status":"NOT_FOUND"}}"#),
            )
            .respond(
                "/models/gemini-new:generateContent",
                HttpResponse::ok(r#"{"candidates":[{"content":{"parts":[{"text":"OK"}]}}]}"#),
            ),
    );
    let gemini = GeminiClient::new(client.clone(), "key");
    let strategy = SelectionStrategy::Probe(ProbeSelector::new(
        vec![id("gemini-old"), id("gemini-new"), id("gemini-unused")],
        id("gemini-fallback"),
    ));

    // When: A model is selected
    let model = strategy.select(&gemini).await;

    // Then: The second candidate is chosen and the third never probed
    assert_eq!(model, id("gemini-new"));
    assert_eq!(client.count_matching("gemini-unused"), 0);
}

#[tokio::test]
async fn when_no_probe_succeeds_fallback_is_returned() {
    // Given: Every probe fails
    let generation = QueuedGeneration::new(vec![Err(GenerationError::not_found("gone"))]);
    let selector = ProbeSelector::new(vec![id("a"), id("b")], id("gemini-1.5-flash"));

    // When: A model is selected
    let model = selector.select(&generation).await;

    // Then: Both candidates were tried and the fallback returned
    assert_eq!(model, id("gemini-1.5-flash"));
    assert_eq!(generation.calls(), vec!["a", "b"]);
}

// =============================================================================
// Report generation
// =============================================================================

#[tokio::test]
async fn when_generation_succeeds_report_carries_the_text() {
    // Given: The provider answers immediately
    let generation = QueuedGeneration::new(vec![Ok(String::from("📈 NVDA steady"))]);

    // When: The report is generated
    let report = fast_reporter().generate(&generation, &id("m"), &block()).await;

    // Then: One call, generated text
    assert_eq!(report.message(), "📈 NVDA steady");
    assert_eq!(generation.calls().len(), 1);
}

#[tokio::test]
async fn when_rate_limited_once_then_success_report_is_the_success_text() {
    // Given: A rate limit followed by success
    let generation = QueuedGeneration::new(vec![
        Err(GenerationError::rate_limited("quota exceeded")),
        Ok(String::from("summary")),
    ]);

    // When: The report is generated
    let report = fast_reporter().generate(&generation, &id("m"), &block()).await;

    // Then: Exactly two calls and the success text
    assert_eq!(
        report,
        Report::Generated {
            model: id("m"),
            text: String::from("summary")
        }
    );
    assert_eq!(generation.calls().len(), 2);
}

#[tokio::test]
async fn when_rate_limited_twice_report_is_the_error_string_and_no_third_call() {
    // Given: The provider keeps rate limiting
    let generation = QueuedGeneration::new(vec![Err(GenerationError::rate_limited("quota exceeded"))]);

    // When: The report is generated
    let report = fast_reporter().generate(&generation, &id("m"), &block()).await;

    // Then: Two calls, then the error string stands in for the report
    assert!(!report.is_generated());
    assert_eq!(
        report.message(),
        "Error details: quota exceeded (generation.rate_limited)"
    );
    assert_eq!(generation.calls().len(), 2);
}

#[tokio::test]
async fn when_error_is_not_a_rate_limit_it_is_reported_without_retry() {
    // Given: The selected model no longer exists
    let generation = QueuedGeneration::new(vec![Err(GenerationError::new(
        GenerationErrorKind::NotFound,
        "models/gemini-pro is not found",
    ))]);

    // When: The report is generated
    let report = fast_reporter().generate(&generation, &id("gemini-pro"), &block()).await;

    // Then: One call and the raw detail in the report
    assert!(report.message().starts_with("Error details: models/gemini-pro is not found"));
    assert_eq!(generation.calls().len(), 1);
}

#[tokio::test]
async fn configured_backoff_elapses_before_the_retry() {
    // Given: A short fixed backoff and a rate limit followed by success
    let generation = QueuedGeneration::new(vec![
        Err(GenerationError::rate_limited("slow down")),
        Ok(String::from("ok")),
    ]);
    let reporter = ReportGenerator::new("English").with_retry(RetryPolicy::fixed(Duration::from_millis(30), 1));

    // When: The report is generated
    let started = std::time::Instant::now();
    let report = reporter.generate(&generation, &id("m"), &block()).await;

    // Then: The backoff elapsed before the retry
    assert!(report.is_generated());
    assert!(started.elapsed() >= Duration::from_millis(30));
}
