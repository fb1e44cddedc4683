//! Cohere Provider Unit Tests

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::llm::providers::CohereProvider;
use crate::core::llm::router::{ChatMessage, ChatRequest, LLMError, LLMProvider};

fn provider(server: &MockServer) -> CohereProvider {
    CohereProvider::command_r("co-test-key".to_string()).with_base_url(server.uri())
}

#[test]
fn test_provider_identity() {
    let provider = CohereProvider::command_r_plus("co-test-key".to_string());
    assert_eq!(provider.id(), "cohere");
    assert_eq!(provider.name(), "Cohere");
    assert_eq!(provider.label(), "cohere/command-r-plus");
}

#[tokio::test]
async fn test_chat_request_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("Authorization", "Bearer co-test-key"))
        .and(body_partial_json(json!({
            "model": "command-r",
            "message": "Now the answer",
            "preamble": "Be brief.",
            "chat_history": [{ "role": "USER", "message": "Earlier question" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "[START_A]alpha[END_A]",
            "finish_reason": "COMPLETE",
            "meta": { "tokens": { "input_tokens": 40, "output_tokens": 9 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new(vec![
        ChatMessage::user("Earlier question"),
        ChatMessage::user("Now the answer"),
    ])
    .with_system("Be brief.");

    let response = provider(&server).chat(request).await.unwrap();
    assert_eq!(response.content, "[START_A]alpha[END_A]");
    assert_eq!(response.provider, "cohere");
    assert_eq!(response.finish_reason.as_deref(), Some("COMPLETE"));
    assert_eq!(response.usage.unwrap().total(), 49);
}

#[tokio::test]
async fn test_chat_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api token"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::AuthError(_)));
}

#[tokio::test]
async fn test_chat_missing_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generation_id": "x" })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_chat_without_key() {
    let err = CohereProvider::command_r(String::new())
        .chat(ChatRequest::prompt("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::NotConfigured(_)));
}
