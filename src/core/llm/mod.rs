//! LLM Client Module
//!
//! Provider-agnostic access to generative text backends:
//! - `router`: the `LLMProvider` trait, shared error type and the per-request
//!   `ProviderChain` with its mandatory call deadline
//! - `providers`: Google Gemini and Cohere implementations plus `ProviderConfig`

pub mod providers;
pub mod router;

// Re-export commonly used types
pub use router::{
    ChainConfig, ChatMessage, ChatRequest, ChatResponse, LLMError, LLMProvider, MessageRole,
    ProviderChain, ProviderChainBuilder, Result, TokenUsage,
};

pub use providers::*;

/// Build a chain from provider configs, in the order given.
pub fn chain_from_configs(configs: &[ProviderConfig], config: ChainConfig) -> ProviderChain {
    let mut chain = ProviderChain::new(config);
    for provider_config in configs {
        if !provider_config.has_api_key() {
            log::warn!(
                "Provider {}/{} has no API key; it will fail at dispatch",
                provider_config.provider_id(),
                provider_config.model()
            );
        }
        chain.add_provider(provider_config.create_provider());
    }
    chain
}
