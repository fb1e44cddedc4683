//! Generation Error Types
//!
//! Contract construction errors and the failure taxonomy of a generation run.

use thiserror::Error;

use crate::core::llm::LLMError;

// ============================================================================
// Contract Errors
// ============================================================================

/// Malformed field contract. Fatal at construction, never recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Field contract declares no fields")]
    Empty,

    #[error("Field '{id}' is declared more than once")]
    DuplicateField { id: String },

    #[error("Invalid field identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },
}

// ============================================================================
// Generation Errors
// ============================================================================

/// Why a generation request (or one attempt within it) failed.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network, timeout or provider-side failure on a single call.
    #[error("Provider '{provider}' failed: {source}")]
    ProviderTransport {
        provider: String,
        #[source]
        source: LLMError,
    },

    /// The call succeeded but too few fields came back non-empty.
    #[error("Provider '{provider}' yielded {yielded} of {expected} fields (at least {required} required)")]
    InsufficientYield {
        provider: String,
        yielded: usize,
        required: usize,
        expected: usize,
    },

    /// Every provider in the chain failed or under-yielded.
    #[error("All {attempted} providers failed; last attempt: {last}")]
    ExhaustedProviders {
        attempted: usize,
        #[source]
        last: Box<GenerationError>,
    },

    #[error("No providers configured for this request")]
    NoProviders,

    #[error("Field '{0}' is not declared by the contract")]
    UnknownField(String),

    #[error("Regenerating field '{0}' requires the current field map")]
    MissingPrior(String),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl GenerationError {
    /// The provider the failure is attributed to, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderTransport { provider, .. } | Self::InsufficientYield { provider, .. } => {
                Some(provider)
            }
            Self::ExhaustedProviders { last, .. } => last.provider(),
            _ => None,
        }
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
