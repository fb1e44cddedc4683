//! LLM Provider Implementations
//!
//! Concrete implementations of the `LLMProvider` trait plus the canonical
//! provider metadata table.
//!
//! Adding a new provider requires:
//! 1. A new enum variant in `ProviderConfig`
//! 2. A new entry in `PROVIDERS`
//! 3. The provider implementation file

mod cohere;
mod google;

pub use cohere::CohereProvider;
pub use google::GoogleProvider;

use super::router::LLMProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Provider metadata ───────────────────────────────────────────────────────

/// Static metadata for a known provider (defaults, key source).
#[derive(Clone, Debug)]
pub struct ProviderMeta {
    pub id: &'static str,
    pub default_model: &'static str,
    /// Environment variable consulted when the config carries no key.
    pub api_key_env: &'static str,
}

/// Canonical table of all known providers. Single source of truth.
pub const PROVIDERS: &[ProviderMeta] = &[
    ProviderMeta {
        id: "google",
        default_model: "gemini-2.5-flash",
        api_key_env: "GEMINI_API_KEY",
    },
    ProviderMeta {
        id: "cohere",
        default_model: "command-r-plus",
        api_key_env: "COHERE_API_KEY",
    },
];

/// Look up a provider's metadata by ID.
pub fn find_provider_meta(id: &str) -> Option<&'static ProviderMeta> {
    PROVIDERS.iter().find(|p| p.id == id)
}

// ── ProviderConfig ──────────────────────────────────────────────────────────

/// Configuration for creating providers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Google Gemini (API key-based)
    Google { api_key: String, model: String },
    Cohere { api_key: String, model: String },
}

impl ProviderConfig {
    /// Build a config for a known provider id, taking the key from its
    /// environment variable when `api_key` is `None`.
    pub fn resolve(id: &str, model: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        let meta = find_provider_meta(id)?;
        let model = model.unwrap_or(meta.default_model).to_string();
        let api_key = api_key
            .map(str::to_string)
            .or_else(|| std::env::var(meta.api_key_env).ok())
            .unwrap_or_default();

        match meta.id {
            "google" => Some(ProviderConfig::Google { api_key, model }),
            "cohere" => Some(ProviderConfig::Cohere { api_key, model }),
            _ => None,
        }
    }

    /// Create a provider from this configuration
    pub fn create_provider(&self) -> Arc<dyn LLMProvider> {
        match self {
            ProviderConfig::Google { api_key, model } => {
                Arc::new(GoogleProvider::new(api_key.clone(), model.clone()))
            }
            ProviderConfig::Cohere { api_key, model } => {
                Arc::new(CohereProvider::new(api_key.clone(), model.clone()))
            }
        }
    }

    /// Get the provider ID for this configuration
    pub fn provider_id(&self) -> &'static str {
        match self {
            ProviderConfig::Google { .. } => "google",
            ProviderConfig::Cohere { .. } => "cohere",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Google { model, .. } | ProviderConfig::Cohere { model, .. } => model,
        }
    }

    pub fn has_api_key(&self) -> bool {
        match self {
            ProviderConfig::Google { api_key, .. } | ProviderConfig::Cohere { api_key, .. } => {
                !api_key.trim().is_empty()
            }
        }
    }
}
