use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::generation::{
    ContractError, FieldContract, FieldSpec, GenerationOrchestrator, Normalizer, NormalizerConfig,
    PromptBuilder, YieldPolicy,
};
use crate::core::generation::prompt::{DEFAULT_MEMORIAL_LIMIT, DEFAULT_SYSTEM_PROMPT};
use crate::core::llm::{ChainConfig, ProviderConfig};

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `DOCWEAVER_GENERATION__MIN_YIELD=10`.
pub const ENV_PREFIX: &str = "DOCWEAVER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid field contract: {0}")]
    Contract(#[from] ContractError),

    #[error("Invalid normalizer pattern: {0}")]
    Normalizer(#[from] regex::Error),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    /// Provider priority list, highest first
    pub providers: Vec<ProviderEntry>,
    pub contract: ContractConfig,
    pub normalizer: NormalizerConfig,
    pub data: DataConfig,
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Hard deadline for a single provider call.
    pub request_timeout_secs: u64,
    /// Minimum non-empty fields to accept a response; majority when unset.
    pub min_yield: Option<usize>,
    pub system_prompt: String,
    /// Character cap stated in the answer-key prompt.
    pub memorial_limit: usize,
}

/// One provider in the chain. The key falls back to the provider's
/// environment variable (`GEMINI_API_KEY`, `COHERE_API_KEY`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Declared fields of the generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub fields: Vec<FieldSpec>,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            providers: vec![
                ProviderEntry {
                    provider: "google".to_string(),
                    model: Some("gemini-2.5-flash".to_string()),
                    api_key: None,
                },
                ProviderEntry {
                    provider: "google".to_string(),
                    model: Some("gemini-2.5-pro".to_string()),
                    api_key: None,
                },
            ],
            contract: ContractConfig::default(),
            normalizer: NormalizerConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            min_yield: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            memorial_limit: DEFAULT_MEMORIAL_LIMIT,
        }
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldSpec::new("STEP_2")
                    .with_guidance(
                        "Identify the three most relevant aspects of the case and justify each one. \
                         Label them Aspect 1:, Aspect 2:, Aspect 3: and give a Rationale: for each.",
                    )
                    .with_anchor(["STEP 2:"]),
                FieldSpec::new("STEP_3")
                    .with_guidance("Annotated list of the theoretical concepts that apply to the case.")
                    .with_anchor(["STEP 3:"]),
                FieldSpec::new("STEP_4")
                    .with_guidance("Apply the concepts to the case and propose concrete solutions.")
                    .with_anchor(["STEP 4:"]),
                FieldSpec::new("STEP_5")
                    .with_guidance(
                        "Analytical memorial with these bold titles, each on its own line: \
                         **Summary:** (one paragraph) **Context:** (who, where, what situation) \
                         **Analysis:** (concepts with examples) **Proposed solutions:** \
                         **Reflective conclusion:** **References:** **Self-assessment:**",
                    )
                    .with_anchor(["STEP 5", "ASSESSED"]),
            ],
        }
    }
}

/// Where the file layer of a loaded configuration came from. Loading runs
/// before logging is set up, so callers log this once the subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults { missing: PathBuf },
}

impl ConfigSource {
    pub fn of(path: &Path) -> Self {
        if path.exists() {
            Self::File(path.to_path_buf())
        } else {
            Self::Defaults {
                missing: path.to_path_buf(),
            }
        }
    }

    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("Loaded config from {}", path.display()),
            Self::Defaults { missing } => {
                log::debug!("No config file at {}, using defaults", missing.display())
            }
        }
    }
}

impl AppConfig {
    /// Load from `~/.config/docweaver/config.toml` and `DOCWEAVER_*` env vars
    /// over the built-in defaults.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load with an explicit config file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<(Self, ConfigSource), ConfigError> {
        let source = ConfigSource::of(path);
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        Ok((config, source))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("docweaver").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Resolved data directory (override or platform default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("docweaver"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    pub fn contract(&self) -> Result<FieldContract, ContractError> {
        FieldContract::new(self.contract.fields.clone())
    }

    pub fn yield_policy(&self) -> YieldPolicy {
        YieldPolicy::from_min_yield(self.generation.min_yield)
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            request_timeout: Duration::from_secs(self.generation.request_timeout_secs),
        }
    }

    pub fn orchestrator(&self) -> Result<GenerationOrchestrator, ConfigError> {
        let normalizer = Normalizer::new(&self.normalizer)?;
        let prompts = PromptBuilder::new(self.generation.system_prompt.clone())
            .with_section_titles(self.normalizer.section_titles.clone())
            .with_memorial_limit(self.generation.memorial_limit);
        Ok(GenerationOrchestrator::new(
            normalizer,
            prompts,
            self.yield_policy(),
        ))
    }

    /// Provider configs in priority order, with keys resolved
    pub fn provider_configs(&self) -> Result<Vec<ProviderConfig>, ConfigError> {
        self.providers
            .iter()
            .map(|entry| {
                ProviderConfig::resolve(
                    &entry.provider,
                    entry.model.as_deref(),
                    entry.api_key.as_deref(),
                )
                .ok_or_else(|| ConfigError::UnknownProvider(entry.provider.clone()))
            })
            .collect()
    }
}
