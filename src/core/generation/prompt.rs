//! Prompt Builder
//!
//! Assembles the provider request for each generation flow: full generation,
//! single-field regeneration and the free-text answer key.

use crate::core::llm::ChatRequest;

use super::contract::FieldContract;
use super::field_map::FieldMap;

/// Default system instructions sent with every request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an academic specialist helping a university \
student complete a professional challenge. Write original, plagiarism-free answers grounded \
in the case description. Use **double asterisks** for bold headings and labels.";

/// Default character cap for the answer key's structured memorial
pub const DEFAULT_MEMORIAL_LIMIT: usize = 6000;

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    section_titles: Vec<String>,
    memorial_limit: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            section_titles: Vec::new(),
            memorial_limit: DEFAULT_MEMORIAL_LIMIT,
        }
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }

    /// Section titles the answer key's memorial must use, in order
    pub fn with_section_titles(mut self, titles: Vec<String>) -> Self {
        self.section_titles = titles;
        self
    }

    pub fn with_memorial_limit(mut self, limit: usize) -> Self {
        self.memorial_limit = limit;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Request for every field of the contract.
    pub fn generation(&self, topic: &str, contract: &FieldContract) -> ChatRequest {
        let mut prompt = String::new();
        prompt.push_str("Generate the content for every field listed below.\n\n");
        push_topic(&mut prompt, topic);
        prompt.push_str(&contract.prompt_fragment(None));
        prompt.push('\n');

        ChatRequest::prompt(prompt).with_system(self.system_prompt.clone())
    }

    /// Request that rewrites `target` only. The current map is shown read-only
    /// so the provider keeps the rest of the document consistent.
    pub fn regeneration(
        &self,
        topic: &str,
        contract: &FieldContract,
        prior: &FieldMap,
        target: &str,
        critique: Option<&str>,
    ) -> ChatRequest {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "Rewrite the field {} of an existing document. Do not repeat or change any other field.\n\n",
            target
        ));
        push_topic(&mut prompt, topic);

        // Shown as plain headings; only the rewrite carries delimiters
        prompt.push_str("CURRENT DOCUMENT (read-only):\n");
        for field in contract.fields() {
            let value = prior.get(&field.id).unwrap_or_default();
            prompt.push_str(&format!("{}:\n{}\n\n", field.id, value.trim()));
        }

        if let Some(notes) = critique.map(str::trim).filter(|n| !n.is_empty()) {
            prompt.push_str("REVISION NOTES:\n");
            prompt.push_str(notes);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&contract.prompt_fragment(Some(target)));
        prompt.push('\n');

        ChatRequest::prompt(prompt).with_system(self.system_prompt.clone())
    }

    /// Free-text request: solve the challenge against the template's own text.
    pub fn answer_key(&self, topic: &str, template_text: &str) -> ChatRequest {
        let mut prompt = String::new();
        push_topic(&mut prompt, topic);
        prompt.push_str("TEMPLATE TEXT:\n");
        prompt.push_str(template_text.trim());
        prompt.push_str("\n\n");
        prompt.push_str(
            "Produce every answer step by step and state clearly where each one belongs in the document.\n",
        );

        if !self.section_titles.is_empty() {
            prompt.push_str("\nWrite the analytical memorial with exactly these bold section titles, in order:\n");
            for title in &self.section_titles {
                prompt.push_str(&format!("**{}:**\n", title));
            }
        }
        prompt.push_str(&format!(
            "The analytical memorial must not exceed {} characters.\n",
            self.memorial_limit
        ));

        ChatRequest::prompt(prompt).with_system(self.system_prompt.clone())
    }
}

fn push_topic(prompt: &mut String, topic: &str) {
    prompt.push_str("TOPIC:\n");
    prompt.push_str(topic.trim());
    prompt.push_str("\n\n");
}
