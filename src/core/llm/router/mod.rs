//! Provider Chain
//!
//! The `LLMProvider` trait every backend implements, the error type shared by
//! all providers, and `ProviderChain`: the ordered, per-request list of
//! providers the generation orchestrator walks when falling back.
//!
//! There is no process-wide provider registry. Callers build a chain for each
//! request and hand it over explicitly.

mod builder;
mod types;


pub use builder::ProviderChainBuilder;
pub use types::{ChatMessage, ChatRequest, ChatResponse, MessageRole, TokenUsage};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors a single provider call can produce. All of them are transport-level
/// failures from the orchestrator's point of view.
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

// ============================================================================
// Provider Trait
// ============================================================================

/// A generative text backend: (model, prompt) → text, or a failure.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stable provider identifier ("google", "cohere", ...)
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Model identifier used for calls
    fn model(&self) -> &str;

    /// Run one completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// `provider/model` label used in logs and failure messages
    fn label(&self) -> String {
        format!("{}/{}", self.id(), self.model())
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Chain configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    /// Hard per-call deadline. A call exceeding it fails with `LLMError::Timeout`.
    pub request_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Ordered provider priority list for one request.
#[derive(Clone, Default)]
pub struct ProviderChain {
    config: ChainConfig,
    providers: Vec<Arc<dyn LLMProvider>>,
}

impl ProviderChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
        }
    }

    pub fn builder() -> ProviderChainBuilder {
        ProviderChainBuilder::new()
    }

    /// Append a provider at the lowest priority.
    pub fn add_provider(&mut self, provider: Arc<dyn LLMProvider>) {
        log::debug!("Adding provider {} to chain", provider.label());
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<dyn LLMProvider>] {
        &self.providers
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn LLMProvider>> {
        self.providers.get(index)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    /// Labels in priority order
    pub fn labels(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.label()).collect()
    }

    /// Call one provider under the chain's deadline.
    pub async fn dispatch(
        &self,
        provider: &dyn LLMProvider,
        request: ChatRequest,
    ) -> Result<ChatResponse> {
        match tokio::time::timeout(self.config.request_timeout, provider.chat(request)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Provider {} exceeded {:?} deadline",
                    provider.label(),
                    self.config.request_timeout
                );
                Err(LLMError::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("config", &self.config)
            .field("providers", &self.labels())
            .finish()
    }
}
