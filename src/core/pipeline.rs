//! Document Pipeline
//!
//! The end-to-end flows: generate → normalize → inject, single-field
//! regeneration against an accepted field map, and the answer key.
//! Templates are validated before any provider is called.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::core::generation::{
    AttemptRecord, FieldContract, FieldMap, GenerationError, GenerationOrchestrator,
    GenerationOutcome, GenerationRequest,
};
use crate::core::llm::ProviderChain;
use crate::document::{
    build_answer_key, DocumentError, DocumentInjector, DocxPackage, DocxReader, ANSWER_KEY_TITLE,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// A filled template together with the values that went into it
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub field_map: FieldMap,
    /// `provider/model` that produced the accepted response
    pub provider: String,
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Debug, Clone)]
pub struct AnswerKey {
    pub bytes: Vec<u8>,
    pub text: String,
    pub provider: String,
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    orchestrator: GenerationOrchestrator,
    contract: Arc<FieldContract>,
}

impl DocumentPipeline {
    pub fn new(orchestrator: GenerationOrchestrator, contract: Arc<FieldContract>) -> Self {
        Self {
            orchestrator,
            contract,
        }
    }

    pub fn contract(&self) -> &Arc<FieldContract> {
        &self.contract
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    /// Generate every field for `topic` and inject them into `template`.
    #[instrument(skip_all, fields(fields = self.contract.len()))]
    pub async fn fill_template(
        &self,
        topic: &str,
        template: &[u8],
        chain: ProviderChain,
    ) -> PipelineResult<FilledDocument> {
        validate_template(template)?;

        let request = GenerationRequest::new(topic, Arc::clone(&self.contract), chain);
        let outcome = self.orchestrator.run(&request).await;
        self.finish(template, outcome)
    }

    /// Regenerate one field of an accepted map and re-inject the whole map.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn regenerate_field(
        &self,
        topic: &str,
        template: &[u8],
        prior: FieldMap,
        target: &str,
        critique: Option<&str>,
        chain: ProviderChain,
    ) -> PipelineResult<FilledDocument> {
        validate_template(template)?;

        let mut request = GenerationRequest::new(topic, Arc::clone(&self.contract), chain)
            .with_prior(prior)
            .with_target_field(target);
        if let Some(critique) = critique {
            request = request.with_critique(critique);
        }

        let outcome = self.orchestrator.run(&request).await;
        self.finish(template, outcome)
    }

    /// Re-render a template from an existing map without calling a provider.
    /// The map is first conformed to the contract: undeclared keys are dropped
    /// and missing fields render as empty.
    pub fn inject(&self, template: &[u8], field_map: &FieldMap) -> PipelineResult<Vec<u8>> {
        let field_map = FieldMap::conform(&self.contract, field_map.iter());
        let normalized = self.orchestrator.normalizer().normalize_map(&field_map);
        Ok(DocumentInjector::inject(template, &self.contract, &normalized)?)
    }

    /// Solve the challenge described by `topic` against the template's own
    /// text, as a new document.
    #[instrument(skip_all)]
    pub async fn answer_key(
        &self,
        topic: &str,
        template: &[u8],
        chain: &ProviderChain,
    ) -> PipelineResult<AnswerKey> {
        let template_text = DocxReader::extract_text(template)?;
        log::debug!("Template text: {} chars", template_text.chars().count());

        let outcome = self
            .orchestrator
            .answer_key(topic, &template_text, chain)
            .await;
        let attempts = outcome.attempts().to_vec();
        let (text, provider) = outcome.into_output()?;

        let bytes = build_answer_key(ANSWER_KEY_TITLE, &text)?;
        Ok(AnswerKey {
            bytes,
            text,
            provider,
            attempts,
        })
    }

    fn finish(&self, template: &[u8], outcome: GenerationOutcome) -> PipelineResult<FilledDocument> {
        let attempts = outcome.attempts().to_vec();
        let (field_map, provider) = outcome.into_output()?;

        let bytes = DocumentInjector::inject(template, &self.contract, &field_map)?;
        log::info!(
            "Filled template with {}/{} fields from {}",
            field_map.non_empty_count(),
            self.contract.len(),
            provider
        );

        Ok(FilledDocument {
            bytes,
            field_map,
            provider,
            attempts,
        })
    }
}

/// Fail fast on unreadable templates, before spending a provider call.
fn validate_template(template: &[u8]) -> PipelineResult<()> {
    let package = DocxPackage::from_bytes(template)?;
    crate::document::scan::scan_paragraphs(package.document_xml())?;
    Ok(())
}
