//! Generation Orchestrator
//!
//! Drives one generation request through its provider chain:
//!
//! ```text
//! INIT ──► DISPATCH(0) ──► DISPATCH(1) ──► ... ──► FAILED (exhausted)
//!               │               │
//!               └──► SUCCESS ◄──┘
//! ```
//!
//! Each DISPATCH calls one provider under the chain's deadline, extracts the
//! contract fields and checks the yield. A transport failure or a response
//! below the yield threshold advances to the next provider. Nothing partial
//! is ever returned as success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::llm::{ChatRequest, ProviderChain};

use super::contract::FieldContract;
use super::errors::{GenerationError, GenerationResult};
use super::extractor::{extract_fields, extract_last};
use super::field_map::FieldMap;
use super::normalizer::Normalizer;
use super::prompt::PromptBuilder;

// ============================================================================
// Request
// ============================================================================

/// One generation or regeneration request. Immutable once built.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    topic: String,
    contract: Arc<FieldContract>,
    chain: ProviderChain,
    prior: Option<FieldMap>,
    critique: Option<String>,
    target_field: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, contract: Arc<FieldContract>, chain: ProviderChain) -> Self {
        Self {
            topic: topic.into(),
            contract,
            chain,
            prior: None,
            critique: None,
            target_field: None,
        }
    }

    /// The accepted field map a regeneration starts from
    pub fn with_prior(mut self, prior: FieldMap) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Free-text revision notes for a regeneration
    pub fn with_critique(mut self, critique: impl Into<String>) -> Self {
        self.critique = Some(critique.into());
        self
    }

    /// Regenerate only this field
    pub fn with_target_field(mut self, id: impl Into<String>) -> Self {
        self.target_field = Some(id.into());
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn contract(&self) -> &FieldContract {
        &self.contract
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub fn prior(&self) -> Option<&FieldMap> {
        self.prior.as_ref()
    }

    pub fn critique(&self) -> Option<&str> {
        self.critique.as_deref()
    }

    pub fn target_field(&self) -> Option<&str> {
        self.target_field.as_deref()
    }
}

// ============================================================================
// Yield policy
// ============================================================================

/// Minimum number of non-empty fields a response must carry to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldPolicy {
    /// More than half of the contract's fields
    #[default]
    Majority,
    /// An explicit count, capped at the contract size
    AtLeast(usize),
}

impl YieldPolicy {
    pub fn from_min_yield(min_yield: Option<usize>) -> Self {
        min_yield.map_or(Self::Majority, Self::AtLeast)
    }

    /// Threshold for a contract with `field_count` fields. Never below one.
    pub fn required(&self, field_count: usize) -> usize {
        let required = match self {
            Self::Majority => field_count / 2 + 1,
            Self::AtLeast(n) => (*n).min(field_count),
        };
        required.max(1)
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What happened on one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted { yielded: usize },
    InsufficientYield { yielded: usize, required: usize },
    Transport { message: String },
}

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// `provider/model` label
    pub provider: String,
    pub latency: Duration,
    pub outcome: AttemptOutcome,
}

/// Terminal state of a request, with the attempt history either way
#[derive(Debug)]
pub enum GenerationOutcome<T = FieldMap> {
    Success {
        output: T,
        provider: String,
        attempts: Vec<AttemptRecord>,
    },
    Failed {
        error: GenerationError,
        attempts: Vec<AttemptRecord>,
    },
}

impl<T> GenerationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Self::Success { attempts, .. } | Self::Failed { attempts, .. } => attempts,
        }
    }

    /// Provider that produced the accepted output
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Success { provider, .. } => Some(provider),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_result(self) -> GenerationResult<T> {
        match self {
            Self::Success { output, .. } => Ok(output),
            Self::Failed { error, .. } => Err(error),
        }
    }

    /// `(output, provider)` on success
    pub fn into_output(self) -> GenerationResult<(T, String)> {
        match self {
            Self::Success {
                output, provider, ..
            } => Ok((output, provider)),
            Self::Failed { error, .. } => Err(error),
        }
    }

    fn failed(error: GenerationError) -> Self {
        Self::Failed {
            error,
            attempts: Vec::new(),
        }
    }
}

/// Why a response was not accepted
struct Shortfall {
    yielded: usize,
    required: usize,
    expected: usize,
}

enum RunState<T> {
    Init,
    Dispatch {
        index: usize,
        last_error: Option<GenerationError>,
    },
    Success {
        output: T,
        provider: String,
    },
    Failed(GenerationError),
}

// ============================================================================
// Orchestrator
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GenerationOrchestrator {
    normalizer: Normalizer,
    prompts: PromptBuilder,
    policy: YieldPolicy,
}

impl GenerationOrchestrator {
    pub fn new(normalizer: Normalizer, prompts: PromptBuilder, policy: YieldPolicy) -> Self {
        Self {
            normalizer,
            prompts,
            policy,
        }
    }

    pub fn with_policy(mut self, policy: YieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> YieldPolicy {
        self.policy
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Run a request: full generation, or single-field regeneration when the
    /// request names a target field.
    pub async fn run(&self, request: &GenerationRequest) -> GenerationOutcome {
        match request.target_field() {
            Some(target) => self.regenerate(request, target).await,
            None => self.generate(request).await,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let contract = request.contract();
        let expected = contract.len();
        let required = self.policy.required(expected);
        let chat = self.prompts.generation(request.topic(), contract);

        log::info!(
            "Generating {} fields (need {}) across {} providers",
            expected,
            required,
            request.chain().len()
        );

        self.drive(request.chain(), &chat, |text| {
            let map = extract_fields(text, contract);
            let yielded = map.non_empty_count();
            if yielded >= required {
                Ok((self.normalizer.normalize_map(&map), yielded))
            } else {
                Err(Shortfall {
                    yielded,
                    required,
                    expected,
                })
            }
        })
        .await
    }

    async fn regenerate(&self, request: &GenerationRequest, target: &str) -> GenerationOutcome {
        let contract = request.contract();
        if !contract.contains(target) {
            return GenerationOutcome::failed(GenerationError::UnknownField(target.to_string()));
        }
        let Some(prior) = request.prior() else {
            return GenerationOutcome::failed(GenerationError::MissingPrior(target.to_string()));
        };
        let prior = FieldMap::conform(contract, prior.iter());

        let chat = self.prompts.regeneration(
            request.topic(),
            contract,
            &prior,
            target,
            request.critique(),
        );

        log::info!(
            "Regenerating field '{}' across {} providers",
            target,
            request.chain().len()
        );

        self.drive(request.chain(), &chat, |text| {
            let value = extract_last(text, contract, target);
            if value.trim().is_empty() {
                return Err(Shortfall {
                    yielded: 0,
                    required: 1,
                    expected: 1,
                });
            }

            let mut merged = prior.clone();
            merged
                .set(target, self.normalizer.normalize(&value))
                .map_err(|_| Shortfall {
                    yielded: 0,
                    required: 1,
                    expected: 1,
                })?;
            Ok((merged, 1))
        })
        .await
    }

    /// Free-text answer key for a topic against a template's text, with the
    /// same fallback semantics. Any non-empty response is accepted.
    pub async fn answer_key(
        &self,
        topic: &str,
        template_text: &str,
        chain: &ProviderChain,
    ) -> GenerationOutcome<String> {
        let chat = self.prompts.answer_key(topic, template_text);
        log::info!("Generating answer key across {} providers", chain.len());

        self.drive(chain, &chat, |text| {
            let text = text.trim();
            if text.is_empty() {
                Err(Shortfall {
                    yielded: 0,
                    required: 1,
                    expected: 1,
                })
            } else {
                Ok((text.to_string(), 1))
            }
        })
        .await
    }

    /// The state machine shared by every flow. `accept` turns a raw response
    /// into output and its yield, or reports a shortfall.
    async fn drive<T, F>(
        &self,
        chain: &ProviderChain,
        chat: &ChatRequest,
        mut accept: F,
    ) -> GenerationOutcome<T>
    where
        F: FnMut(&str) -> Result<(T, usize), Shortfall>,
    {
        let mut attempts = Vec::new();
        let mut state = RunState::Init;

        loop {
            state = match state {
                RunState::Init => {
                    if chain.is_empty() {
                        RunState::Failed(GenerationError::NoProviders)
                    } else {
                        RunState::Dispatch {
                            index: 0,
                            last_error: None,
                        }
                    }
                }

                RunState::Dispatch { index, last_error } if index >= chain.len() => {
                    let last = last_error.unwrap_or(GenerationError::NoProviders);
                    log::error!("All {} providers failed: {}", index, last);
                    RunState::Failed(GenerationError::ExhaustedProviders {
                        attempted: index,
                        last: Box::new(last),
                    })
                }

                RunState::Dispatch { index, .. } => {
                    let provider = Arc::clone(&chain.providers()[index]);
                    let label = provider.label();
                    let started = Instant::now();
                    let result = chain.dispatch(provider.as_ref(), chat.clone()).await;
                    let latency = started.elapsed();

                    match result {
                        Err(source) => {
                            log::warn!(
                                "Attempt {} with {} failed after {}ms: {}",
                                index + 1,
                                label,
                                latency.as_millis(),
                                source
                            );
                            attempts.push(AttemptRecord {
                                provider: label.clone(),
                                latency,
                                outcome: AttemptOutcome::Transport {
                                    message: source.to_string(),
                                },
                            });
                            RunState::Dispatch {
                                index: index + 1,
                                last_error: Some(GenerationError::ProviderTransport {
                                    provider: label,
                                    source,
                                }),
                            }
                        }
                        Ok(response) => match accept(&response.content) {
                            Ok((output, yielded)) => {
                                log::info!(
                                    "Attempt {} with {} accepted ({} fields, {}ms)",
                                    index + 1,
                                    label,
                                    yielded,
                                    latency.as_millis()
                                );
                                attempts.push(AttemptRecord {
                                    provider: label.clone(),
                                    latency,
                                    outcome: AttemptOutcome::Accepted { yielded },
                                });
                                RunState::Success {
                                    output,
                                    provider: label,
                                }
                            }
                            Err(shortfall) => {
                                log::warn!(
                                    "Attempt {} with {} yielded {}/{} fields (need {})",
                                    index + 1,
                                    label,
                                    shortfall.yielded,
                                    shortfall.expected,
                                    shortfall.required
                                );
                                attempts.push(AttemptRecord {
                                    provider: label.clone(),
                                    latency,
                                    outcome: AttemptOutcome::InsufficientYield {
                                        yielded: shortfall.yielded,
                                        required: shortfall.required,
                                    },
                                });
                                RunState::Dispatch {
                                    index: index + 1,
                                    last_error: Some(GenerationError::InsufficientYield {
                                        provider: label,
                                        yielded: shortfall.yielded,
                                        required: shortfall.required,
                                        expected: shortfall.expected,
                                    }),
                                }
                            }
                        },
                    }
                }

                RunState::Success { output, provider } => {
                    return GenerationOutcome::Success {
                        output,
                        provider,
                        attempts,
                    };
                }

                RunState::Failed(error) => {
                    return GenerationOutcome::Failed { error, attempts };
                }
            };
        }
    }
}
