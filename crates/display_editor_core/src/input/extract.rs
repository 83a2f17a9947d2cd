//! Required-field extraction from request input.
//!
//! # Invariants
//! - Output only ever contains keys named by the rule set.
//! - Values pass through untouched; extraction checks presence, not type.
//! - An incomplete extraction is never handed to a mutation.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Untyped, string-keyed request fields as submitted by the caller.
pub type RequestFields = Map<String, Value>;

/// Required fields that were absent from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields(pub BTreeSet<String>);

impl MissingFields {
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl Display for MissingFields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing fields: {}", self.names().join(", "))
    }
}

impl Error for MissingFields {}

/// Named set of fields an operation requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    required: BTreeSet<&'static str>,
}

impl FieldRule {
    pub fn new(required: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().copied()
    }

    /// Selects the rule's fields from `input` and lists the absent ones.
    pub fn extract(&self, input: &RequestFields) -> Extraction {
        let fields = self
            .required
            .iter()
            .filter_map(|name| {
                input
                    .get(*name)
                    .map(|value| ((*name).to_string(), value.clone()))
            })
            .collect::<RequestFields>();
        let missing = self
            .required
            .iter()
            .filter(|name| !fields.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();
        Extraction { fields, missing }
    }
}

/// Outcome of applying a [`FieldRule`] to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    fields: RequestFields,
    missing: BTreeSet<String>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    /// Returns the selected fields, or every missing name when incomplete.
    pub fn into_complete(self) -> Result<RequestFields, MissingFields> {
        if self.missing.is_empty() {
            Ok(self.fields)
        } else {
            Err(MissingFields(self.missing))
        }
    }
}
