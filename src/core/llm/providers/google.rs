//! Google Provider Implementation (API Key-based)
//!
//! Gemini models through Google's Generative Language API.

use crate::core::llm::router::{
    ChatRequest, ChatResponse, LLMError, LLMProvider, MessageRole, Result, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Models offered when the model listing endpoint cannot be reached.
const FALLBACK_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro"];

/// Google provider (API key-based)
pub struct GoogleProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GoogleProvider {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        // Trim the API key at construction to ensure consistency with validation
        Self {
            api_key: api_key.trim().to_string(),
            model,
            base_url: GOOGLE_API_BASE.to_string(),
            client,
        }
    }

    pub fn flash(api_key: String) -> Self {
        Self::new(api_key, "gemini-2.5-flash".to_string())
    }

    pub fn pro(api_key: String) -> Self {
        Self::new(api_key, "gemini-2.5-pro".to_string())
    }

    /// Point the provider at a different API host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Default model list used when [`list_models`](Self::list_models) fails.
    pub fn fallback_models() -> Vec<String> {
        FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
    }

    /// List the models that support `generateContent`, without the `models/` prefix.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1beta/models", self.base_url);

        let resp = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthError(text),
                code => LLMError::ApiError {
                    status: code,
                    message: text,
                },
            });
        }

        let json: serde_json::Value = resp.json().await?;
        let models = json["models"]
            .as_array()
            .ok_or_else(|| LLMError::InvalidResponse("Missing models array".to_string()))?
            .iter()
            .filter(|m| {
                m["supportedGenerationMethods"]
                    .as_array()
                    .map(|methods| methods.iter().any(|v| v.as_str() == Some("generateContent")))
                    .unwrap_or(false)
            })
            .filter_map(|m| m["name"].as_str())
            .map(|name| name.trim_start_matches("models/").to_string())
            .collect();

        Ok(models)
    }

    /// [`list_models`](Self::list_models), degrading to the built-in list on any failure.
    pub async fn list_models_or_fallback(&self) -> Vec<String> {
        match self.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => Self::fallback_models(),
            Err(e) => {
                log::warn!("Failed to list Google models: {}", e);
                Self::fallback_models()
            }
        }
    }

    fn build_contents(&self, request: &ChatRequest) -> Vec<serde_json::Value> {
        request
            .messages
            .iter()
            .filter_map(|msg| {
                let role = match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                    MessageRole::System => return None,
                };
                Some(serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.content }]
                }))
            })
            .collect()
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({ "contents": self.build_contents(request) });

        if let Some(system) = &request.system_prompt {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system }]
            });
        }

        if request.temperature.is_some() || request.max_tokens.is_some() {
            let mut gen_config = serde_json::Map::new();
            if let Some(temp) = request.temperature {
                gen_config.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max) = request.max_tokens {
                gen_config.insert("maxOutputTokens".to_string(), serde_json::json!(max));
            }
            body["generationConfig"] = serde_json::Value::Object(gen_config);
        }

        body
    }
}

#[async_trait]
impl LLMProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(LLMError::NotConfigured("google: missing API key".to_string()));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = self.build_body(&request);

        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let latency = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthError(text),
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

        // Gemini may split one answer over several parts
        let content = json["candidates"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .ok_or_else(|| LLMError::InvalidResponse("Missing content".to_string()))?;

        let usage = json["usageMetadata"].as_object().map(|u| TokenUsage {
            input_tokens: u
                .get("promptTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            output_tokens: u
                .get("candidatesTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: self.model.clone(),
            provider: "google".to_string(),
            usage,
            finish_reason: json["candidates"]
                .as_array()
                .and_then(|arr| arr.first())
                .and_then(|c| c["finishReason"].as_str())
                .map(|s| s.to_string()),
            latency_ms: latency,
        })
    }
}
