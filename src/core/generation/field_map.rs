//! Field Map
//!
//! Extracted field values keyed by identifier. A map is always built from a
//! contract, so it carries exactly one entry per declared field; unmatched
//! fields hold the empty string.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::contract::FieldContract;
use super::errors::GenerationError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    values: IndexMap<String, String>,
}

impl FieldMap {
    /// Map with every contract field present and empty
    pub fn empty_for(contract: &FieldContract) -> Self {
        Self {
            values: contract
                .ids()
                .map(|id| (id.to_string(), String::new()))
                .collect(),
        }
    }

    /// Conform arbitrary key/value pairs to a contract: undeclared keys are
    /// dropped and missing fields are filled with the empty string.
    pub fn conform<I, K, V>(contract: &FieldContract, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::empty_for(contract);
        for (key, value) in pairs {
            let key = key.into();
            if let Some(slot) = map.values.get_mut(&key) {
                *slot = value.into();
            } else {
                log::debug!("Dropping undeclared field '{}'", key);
            }
        }
        map
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    /// Replace a declared field's value.
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> Result<(), GenerationError> {
        match self.values.get_mut(id) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(GenerationError::UnknownField(id.to_string())),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Yield: number of fields with non-whitespace content
    pub fn non_empty_count(&self) -> usize {
        self.values.values().filter(|v| !v.trim().is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply a value transform to every entry.
    pub fn map_values<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            values: self
                .values
                .iter()
                .map(|(k, v)| (k.clone(), f(v)))
                .collect(),
        }
    }

    /// Whether the keys are exactly the contract's identifiers
    pub fn matches_contract(&self, contract: &FieldContract) -> bool {
        self.values.len() == contract.len() && contract.ids().all(|id| self.values.contains_key(id))
    }
}
