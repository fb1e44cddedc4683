//! Field Contract
//!
//! The fixed, ordered set of fields a generation task must produce and the
//! delimiter protocol that marks each field in raw provider output.
//!
//! For a field `SUMMARY` the provider is asked to answer between
//! `[START_SUMMARY]` and `[END_SUMMARY]`; templates reference the same field
//! with the placeholder token `{{SUMMARY}}`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::ContractError;

/// Opening bracket of a placeholder token
pub const PLACEHOLDER_OPEN: &str = "{{";
/// Closing bracket of a placeholder token
pub const PLACEHOLDER_CLOSE: &str = "}}";

/// Start/end marker pair for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    pub fn for_field(id: &str) -> Self {
        Self {
            start: format!("[START_{}]", id),
            end: format!("[END_{}]", id),
        }
    }
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field identifier, unique within a contract
    pub id: String,
    /// Operator-supplied authoring guidance shown to the provider
    #[serde(default)]
    pub guidance: String,
    /// Heading texts that locate the field in templates without placeholder
    /// tokens. A paragraph matches when its upper-cased text contains all of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchor: Vec<String>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guidance: String::new(),
            anchor: Vec::new(),
        }
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    pub fn with_anchor<I, S>(mut self, anchor: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchor = anchor.into_iter().map(Into::into).collect();
        self
    }

    /// Placeholder token for this field, e.g. `{{SUMMARY}}`
    pub fn placeholder(&self) -> String {
        placeholder_token(&self.id)
    }

    pub fn delimiters(&self) -> Delimiters {
        Delimiters::for_field(&self.id)
    }
}

/// Placeholder token for a field identifier
pub fn placeholder_token(id: &str) -> String {
    format!("{}{}{}", PLACEHOLDER_OPEN, id, PLACEHOLDER_CLOSE)
}

/// Ordered, validated list of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldContract {
    fields: Vec<FieldSpec>,
}

impl FieldContract {
    /// Validate and build a contract. Duplicate or malformed identifiers are
    /// rejected here so that every later stage can rely on disjoint delimiters.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, ContractError> {
        if fields.is_empty() {
            return Err(ContractError::Empty);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            validate_identifier(&field.id)?;
            if !seen.insert(field.id.as_str()) {
                return Err(ContractError::DuplicateField {
                    id: field.id.clone(),
                });
            }
        }

        Ok(Self { fields })
    }

    /// Contract with bare identifiers and no guidance
    pub fn from_ids<I, S>(ids: I) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(FieldSpec::new).collect())
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fields.iter().any(|f| f.id == id)
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn delimiters(&self, id: &str) -> Option<Delimiters> {
        self.field(id).map(FieldSpec::delimiters)
    }

    /// Prompt instructions for the delimiter protocol.
    ///
    /// With `only = Some(id)` the fragment covers that single field, which is
    /// what single-field regeneration asks for.
    pub fn prompt_fragment(&self, only: Option<&str>) -> String {
        let selected: Vec<&FieldSpec> = self
            .fields
            .iter()
            .filter(|f| only.map_or(true, |id| f.id == id))
            .collect();

        let mut out = String::new();
        out.push_str("OUTPUT FORMAT (mandatory):\n");
        out.push_str(
            "Write each answer between its start and end markers, exactly as shown below. \
             Do not rename, translate or omit markers, do not nest them, and do not add JSON, \
             code fences or commentary outside the markers.\n\n",
        );

        for field in selected {
            let delims = field.delimiters();
            out.push_str(&delims.start);
            out.push('\n');
            if field.guidance.trim().is_empty() {
                out.push_str(&format!("(content for {})", field.id));
            } else {
                out.push_str(field.guidance.trim());
            }
            out.push('\n');
            out.push_str(&delims.end);
            out.push_str("\n\n");
        }

        out.trim_end().to_string()
    }
}

fn validate_identifier(id: &str) -> Result<(), ContractError> {
    let invalid = |reason: &str| ContractError::InvalidIdentifier {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("identifier is empty"));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(invalid("identifier contains whitespace"));
    }
    if id.chars().any(|c| matches!(c, '[' | ']' | '{' | '}')) {
        return Err(invalid("identifier contains a bracket character"));
    }
    Ok(())
}
