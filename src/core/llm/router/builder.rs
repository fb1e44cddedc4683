//! Provider Chain Builder
//!
//! Builder pattern for constructing a ProviderChain.

use std::sync::Arc;
use std::time::Duration;

use super::{ChainConfig, LLMProvider, ProviderChain};

/// Builder for constructing a ProviderChain
pub struct ProviderChainBuilder {
    config: ChainConfig,
    providers: Vec<Arc<dyn LLMProvider>>,
}

impl ProviderChainBuilder {
    pub fn new() -> Self {
        Self {
            config: ChainConfig::default(),
            providers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> ProviderChain {
        let mut chain = ProviderChain::new(self.config);
        for provider in self.providers {
            chain.add_provider(provider);
        }
        chain
    }
}

impl Default for ProviderChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
