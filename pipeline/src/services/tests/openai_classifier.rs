//! Tests for OpenAiClassifier service

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared::{QueryCategory, Source, VideoKind, VideoRecord};
use crate::config::ClassifierConfig;
use crate::core::QueryPolicy;
use crate::error::PipelineError;
use crate::services::openai_classifier::OpenAiClassifier;
use crate::traits::ClassificationService;
use crate::types::{CurationPass, QueryContext, Rubric};

fn config(server: &MockServer) -> ClassifierConfig {
    ClassifierConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..ClassifierConfig::new("test-key")
    }
}

fn rubric() -> Rubric {
    Rubric {
        pass: CurationPass::Search,
        audience: "A 6th grader".to_string(),
        standards: None,
    }
}

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content.to_string() } }],
        "usage": { "total_tokens": 120 }
    }))
}

fn record(id: &str) -> VideoRecord {
    VideoRecord::from_listing(&format!("/watch?v={id}"), "Fractions", VideoKind::Video, Source::Search, Some("easy fractions"), false)
        .unwrap()
}

#[tokio::test]
async fn test_evaluate_parses_verdicts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(completion(json!({
            "verdicts": [
                { "id": "a1", "like": true, "rationale": "clear explanation" },
                { "id": "b2", "like": false }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(config(&server)).unwrap();
    let verdicts = classifier.evaluate(&[record("a1"), record("b2")], &rubric()).await.unwrap();

    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0].record_id, "a1");
    assert!(verdicts[0].like);
    assert_eq!(verdicts[0].rationale.as_deref(), Some("clear explanation"));
    assert!(!verdicts[1].like);
    assert_eq!(classifier.model(), "gpt-4o-mini");
}

#[tokio::test]
async fn test_propose_queries_parses_categories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!({
            "queries": [
                { "text": "easy ratios", "category": "math" },
                { "text": "how glaciers move", "category": "curiosity" }
            ]
        })))
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(config(&server)).unwrap();
    let context = QueryContext {
        feed_titles: vec!["Glacier timelapse".to_string()],
        rubric: rubric(),
        policy: QueryPolicy::default(),
    };
    let queries = classifier.propose_queries(&context).await.unwrap();

    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].category, QueryCategory::Math);
    assert_eq!(queries[1].text, "how glaciers move");
}

#[tokio::test]
async fn test_server_error_maps_to_classification_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(config(&server)).unwrap();
    let result = classifier.evaluate(&[record("a1")], &rubric()).await;

    match result {
        Err(PipelineError::ClassificationServiceError { message }) => {
            assert!(message.contains("500"));
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("expected ClassificationServiceError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(config(&server)).unwrap();
    let result = classifier.evaluate(&[record("a1")], &rubric()).await;
    assert!(matches!(result, Err(PipelineError::ClassificationServiceError { message }) if message.contains("rate limit")));
}

#[tokio::test]
async fn test_malformed_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!({ "something": "else" })))
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(config(&server)).unwrap();
    let result = classifier.evaluate(&[record("a1")], &rubric()).await;
    assert!(matches!(result, Err(PipelineError::ClassificationServiceError { .. })));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(json!({ "verdicts": [] })).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.timeout = Duration::from_millis(50);
    let classifier = OpenAiClassifier::new(config).unwrap();
    let result = classifier.evaluate(&[record("a1")], &rubric()).await;

    match result {
        Err(PipelineError::ClassificationServiceError { message }) => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn test_empty_api_key_rejected() {
    let result = OpenAiClassifier::new(ClassifierConfig::new("  "));
    assert!(matches!(result, Err(PipelineError::ConfigError { .. })));
}
