//! Cohere Provider Implementation
//!
//! Command models through Cohere's v1 chat endpoint.

use crate::core::llm::router::{
    ChatRequest, ChatResponse, LLMError, LLMProvider, MessageRole, Result, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const COHERE_API_BASE: &str = "https://api.cohere.ai";

/// Cohere provider
pub struct CohereProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl CohereProvider {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: api_key.trim().to_string(),
            model,
            base_url: COHERE_API_BASE.to_string(),
            client,
        }
    }

    /// Use Command R+ (most capable)
    pub fn command_r_plus(api_key: String) -> Self {
        Self::new(api_key, "command-r-plus".to_string())
    }

    /// Use Command R
    pub fn command_r(api_key: String) -> Self {
        Self::new(api_key, "command-r".to_string())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        // Build chat history (all messages except the last one)
        let chat_history: Vec<serde_json::Value> = request
            .messages
            .iter()
            .take(request.messages.len().saturating_sub(1))
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::System => "SYSTEM",
                    MessageRole::User => "USER",
                    MessageRole::Assistant => "CHATBOT",
                };
                serde_json::json!({
                    "role": role,
                    "message": msg.content
                })
            })
            .collect();

        // Last message is the current query
        let message = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut body = serde_json::json!({
            "model": self.model,
            "message": message,
        });

        if !chat_history.is_empty() {
            body["chat_history"] = serde_json::Value::Array(chat_history);
        }

        if let Some(system) = &request.system_prompt {
            body["preamble"] = serde_json::Value::String(system.clone());
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }

        body
    }
}

#[async_trait]
impl LLMProvider for CohereProvider {
    fn id(&self) -> &str {
        "cohere"
    }

    fn name(&self) -> &str {
        "Cohere"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(LLMError::NotConfigured("cohere: missing API key".to_string()));
        }

        let body = self.build_body(&request);

        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(format!("{}/v1/chat", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let latency = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LLMError::AuthError(text),
                429 => LLMError::RateLimited {
                    retry_after_secs: 60,
                },
                code => LLMError::ApiError {
                    status: code,
                    message: text,
                },
            });
        }

        let json: serde_json::Value = resp.json().await?;

        let content = json["text"]
            .as_str()
            .ok_or_else(|| LLMError::InvalidResponse("Missing text in response".to_string()))?
            .to_string();

        let usage = json["meta"]["tokens"].as_object().map(|t| TokenUsage {
            input_tokens: t.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            output_tokens: t.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: self.model.clone(),
            provider: "cohere".to_string(),
            usage,
            finish_reason: json["finish_reason"].as_str().map(|s| s.to_string()),
            latency_ms: latency,
        })
    }
}
