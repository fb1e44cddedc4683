//! Mock providers for testing
//!
//! `ScriptedProvider` plays back a fixed sequence of replies and failures and
//! records every prompt it receives, so orchestrator and pipeline tests can
//! run without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::llm::{
    ChatRequest, ChatResponse, LLMError, LLMProvider, ProviderChain, Result, TokenUsage,
};

// ============================================================================
// Script steps
// ============================================================================

/// One scripted call result
#[derive(Debug, Clone)]
pub enum Step {
    /// Successful response with this text
    Reply(String),
    /// Provider-side error with this HTTP status
    Fail(u16),
    /// Never answers within any test deadline
    Hang,
}

impl Step {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }
}

// ============================================================================
// Scripted provider
// ============================================================================

/// Provider that answers from a script. The last step repeats once the
/// script runs out.
pub struct ScriptedProvider {
    id: String,
    model: String,
    script: Vec<Step>,
    call_count: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(id: &str, script: Vec<Step>) -> Self {
        Self {
            id: id.to_string(),
            model: format!("{}-model", id),
            script,
            call_count: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(id: &str, text: impl Into<String>) -> Self {
        Self::new(id, vec![Step::reply(text)])
    }

    pub fn failing(id: &str, status: u16) -> Self {
        Self::new(id, vec![Step::Fail(status)])
    }

    pub fn hanging(id: &str) -> Self {
        Self::new(id, vec![Step::Hang])
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// User text of every request received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) as usize;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.user_text());
        }

        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(Step::Fail(500));

        match step {
            Step::Reply(content) => Ok(ChatResponse {
                content,
                model: self.model.clone(),
                provider: self.id.clone(),
                usage: Some(TokenUsage::new(100, 50)),
                finish_reason: Some("stop".to_string()),
                latency_ms: 1,
            }),
            Step::Fail(status) => Err(LLMError::ApiError {
                status,
                message: format!("{} scripted failure", self.id),
            }),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LLMError::Timeout)
            }
        }
    }
}

/// Chain over the given providers with a short deadline, keeping handles for
/// call-count assertions.
pub fn chain_of(providers: &[Arc<ScriptedProvider>], timeout: Duration) -> ProviderChain {
    let mut builder = ProviderChain::builder().with_timeout(timeout);
    for provider in providers {
        builder = builder.add_provider(Arc::clone(provider) as Arc<dyn LLMProvider>);
    }
    builder.build()
}
