//! Google Provider Unit Tests (API Key-based)
//!
//! Tests for the Gemini provider including:
//! - API request formatting
//! - Response parsing
//! - Error handling
//! - Model listing

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::llm::providers::GoogleProvider;
use crate::core::llm::router::{ChatRequest, LLMError, LLMProvider};

const KEY: &str = "AIzaTestApiKey";
const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn provider(server: &MockServer) -> GoogleProvider {
    GoogleProvider::flash(KEY.to_string()).with_base_url(server.uri())
}

// =============================================================================
// Provider Identity Tests
// =============================================================================

#[test]
fn test_provider_identity() {
    let provider = GoogleProvider::new(KEY.to_string(), "gemini-2.5-pro".to_string());
    assert_eq!(provider.id(), "google");
    assert_eq!(provider.name(), "Google");
    assert_eq!(provider.model(), "gemini-2.5-pro");
    assert_eq!(provider.label(), "google/gemini-2.5-pro");
}

#[test]
fn test_convenience_constructors() {
    assert_eq!(GoogleProvider::flash(KEY.to_string()).model(), "gemini-2.5-flash");
    assert_eq!(GoogleProvider::pro(KEY.to_string()).model(), "gemini-2.5-pro");
}

// =============================================================================
// generateContent
// =============================================================================

#[tokio::test]
async fn test_chat_success_joins_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Be brief." }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[START_A]one" }, { "text": "[END_A]" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .chat(ChatRequest::prompt("Hello").with_system("Be brief."))
        .await
        .unwrap();

    assert_eq!(response.content, "[START_A]one[END_A]");
    assert_eq!(response.provider, "google");
    assert_eq!(response.model, "gemini-2.5-flash");
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    let usage = response.usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (12, 7));
}

#[tokio::test]
async fn test_chat_generation_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 256 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .chat(ChatRequest::prompt("Hi").with_max_tokens(256))
        .await
        .unwrap();
    assert_eq!(response.content, "ok");
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_chat_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::RateLimited { .. }));
}

#[tokio::test]
async fn test_chat_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::AuthError(msg) if msg.contains("not valid")));
}

#[tokio::test]
async fn test_chat_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn test_chat_missing_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_chat_without_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = GoogleProvider::flash("   ".to_string())
        .with_base_url(server.uri())
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::NotConfigured(_)));
}

// =============================================================================
// Model listing
// =============================================================================

#[tokio::test]
async fn test_list_models_filters_generation_capable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/gemini-2.5-flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/text-embedding-004",
                    "supportedGenerationMethods": ["embedContent"]
                },
                { "name": "models/gemini-2.5-pro", "supportedGenerationMethods": ["generateContent"] }
            ]
        })))
        .mount(&server)
        .await;

    let models = provider(&server).list_models().await.unwrap();
    assert_eq!(models, vec!["gemini-2.5-flash", "gemini-2.5-pro"]);
}

#[tokio::test]
async fn test_list_models_falls_back_on_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider(&server);
    assert!(provider.list_models().await.is_err());
    assert_eq!(
        provider.list_models_or_fallback().await,
        GoogleProvider::fallback_models()
    );
}

#[tokio::test]
async fn test_list_models_falls_back_on_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    assert_eq!(
        provider(&server).list_models_or_fallback().await,
        vec!["gemini-2.5-flash", "gemini-2.5-pro"]
    );
}
