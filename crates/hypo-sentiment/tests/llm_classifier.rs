//! Integration tests for `LlmClassifier` using wiremock HTTP mocks.

use hypo_core::{ClassificationSource, LlmProvider, SentimentCategory, SentimentSettings};
use hypo_sentiment::{
    ClassificationError, FallbackClassifier, KeywordClassifier, LlmClassifier,
    SentimentClassifier,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(provider: LlmProvider) -> SentimentSettings {
    SentimentSettings {
        provider,
        model: "test-model".to_string(),
        temperature: 0.1,
        categories: ["BULLISH", "BEARISH", "NEUTRAL"]
            .iter()
            .map(|n| SentimentCategory {
                name: (*n).to_string(),
                description: String::new(),
            })
            .collect(),
        custom_prompt: None,
    }
}

#[tokio::test]
async fn openai_reply_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({ "model": "test-model", "max_tokens": 150 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"sentiment\": \"BULLISH\", \"confidence\": 0.85, \"reason\": \"record deliveries\"}"
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::with_base_url(settings(LlmProvider::OpenAi), "sk-test", 5, &server.uri())
            .expect("client construction should not fail");
    let result = classifier.classify("Record deliveries!").await.unwrap();
    assert_eq!(result.label, "BULLISH");
    assert!((result.confidence - 0.85).abs() < f64::EPSILON);
    assert_eq!(result.source, ClassificationSource::Model);
}

#[tokio::test]
async fn anthropic_reply_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{
                "type": "text",
                "text": "Here is my answer: {\"sentiment\": \"bearish\", \"confidence\": 0.7, \"reason\": \"recall\"}"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = LlmClassifier::with_base_url(
        settings(LlmProvider::Anthropic),
        "ak-test",
        5,
        &server.uri(),
    )
    .unwrap();
    let result = classifier.classify("Recall announced").await.unwrap();
    assert_eq!(result.label, "BEARISH");
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::with_base_url(settings(LlmProvider::OpenAi), "sk-test", 5, &server.uri())
            .unwrap();
    let err = classifier.classify("anything").await.unwrap_err();
    assert!(matches!(err, ClassificationError::Status { status: 500, .. }));
}

#[tokio::test]
async fn fallback_recovers_from_unknown_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": "{\"sentiment\": \"EUPHORIC\"}" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let primary =
        LlmClassifier::with_base_url(settings(LlmProvider::OpenAi), "sk-test", 5, &server.uri())
            .unwrap();
    let heuristic = KeywordClassifier::new(settings(LlmProvider::OpenAi).category_names());
    let classifier = FallbackClassifier::new(Box::new(primary), heuristic);

    let result = classifier.classify_or_fallback("to the moon").await;
    assert_eq!(result.label, "BULLISH");
    assert_eq!(result.source, ClassificationSource::Heuristic);
    assert_eq!(result.reason, "Keyword-based");
}

#[test]
fn blank_key_names_the_provider_variable() {
    let err = LlmClassifier::new(settings(LlmProvider::Anthropic), "", 5).err();
    assert!(
        matches!(err, Some(ClassificationError::MissingCredential(v)) if v == "ANTHROPIC_API_KEY")
    );
}
