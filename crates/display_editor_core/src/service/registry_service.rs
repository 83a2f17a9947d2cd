//! Display point registry use-case service.
//!
//! # Responsibility
//! - Create, update, rename, list and fetch named display points.
//! - Register and remove the module's settings on install/uninstall.
//!
//! # Invariants
//! - Every mutation is exactly one store write; rejected requests write nothing.
//! - The document id is looked up right before each write, never cached.
//! - Entry names are non-empty, case-sensitive keys stored exactly as given;
//!   `.`, `"`, `\` and control characters are rejected.
//! - `update_entry` writes under `name` only; an entry stored under a
//!   different `prev_name` is left in place (use `rename_entry` to move it).

use crate::config::RegistryConfig;
use crate::input::extract::{FieldRule, RequestFields};
use crate::model::path::{is_reserved_char, DotPath};
use crate::repo::config_store::ConfigDocumentStore;
use crate::service::error::{RegistryError, RegistryResult, ValidationError};
use log::{info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

pub const FIELD_NAME: &str = "name";
pub const FIELD_PREV_NAME: &str = "prev_name";
pub const FIELD_QUERIES: &str = "queries";
const QUERY_TEXT_INDENT: &[u8] = b"    ";

/// Names matching one search, plus whether the registry holds anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryListing {
    pub has_entries: bool,
    /// Sorted ascending by byte order (uppercase before lowercase).
    pub names: Vec<String>,
    pub search: String,
}

/// One stored display point prepared for display or editing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedEntry {
    pub name: String,
    /// The entry's query specification.
    pub spec: Value,
    /// `spec` as JSON indented by four spaces.
    pub query_text: String,
}

/// Display point registry inside the shared configuration document.
pub struct RegistryService<S: ConfigDocumentStore> {
    store: S,
    config: RegistryConfig,
    module_path: DotPath,
    registry_path: DotPath,
}

impl<S: ConfigDocumentStore> RegistryService<S> {
    /// Creates a service over `store` after validating `config`.
    pub fn new(store: S, config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        let module_path = config.module_path()?;
        let registry_path = config.registry_path()?;
        Ok(Self {
            store,
            config,
            module_path,
            registry_path,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn registry_path(&self) -> &DotPath {
        &self.registry_path
    }

    /// Registers the module with an empty settings mapping.
    ///
    /// The registry itself appears with the first created entry.
    pub fn install(&self) -> RegistryResult<()> {
        let doc_id = self.store.current_document_id()?;
        self.store
            .set_field(doc_id, &self.module_path, &Value::Object(Map::new()))?;
        info!(
            "event=module_install module=registry status=ok path={}",
            self.module_path
        );
        Ok(())
    }

    /// Removes the module settings, the registry and every entry.
    pub fn uninstall(&self) -> RegistryResult<()> {
        let doc_id = self.store.current_document_id()?;
        self.store.unset_field(doc_id, &self.module_path)?;
        info!(
            "event=module_uninstall module=registry status=ok path={}",
            self.module_path
        );
        Ok(())
    }

    /// Creates `name` with an empty spec, overwriting any existing spec.
    pub fn create_entry(&self, name: &str) -> RegistryResult<()> {
        let path = self.entry_path(name)?;
        let doc_id = self.store.current_document_id()?;
        self.store
            .set_field(doc_id, &path, &Value::Object(Map::new()))?;
        info!("event=entry_create module=registry status=ok name={name}");
        Ok(())
    }

    /// Replaces the stored record of `input.name` with the
    /// `{name, prev_name, queries}` subset of `input`.
    pub fn update_entry(&self, input: &RequestFields) -> RegistryResult<()> {
        let record = update_rule()
            .extract(input)
            .into_complete()
            .inspect_err(|missing| {
                warn!("event=entry_update module=registry status=rejected error={missing}");
            })?;
        let name = field_as_name(&record, FIELD_NAME)?.to_string();
        let path = self.entry_path(&name)?;
        if record.get(FIELD_PREV_NAME).and_then(Value::as_str) != Some(name.as_str()) {
            warn!("event=entry_update module=registry status=renamed_in_place name={name}");
        }

        let doc_id = self.store.current_document_id()?;
        self.store
            .set_field(doc_id, &path, &Value::Object(record))?;
        info!("event=entry_update module=registry status=ok name={name}");
        Ok(())
    }

    /// Moves the entry stored under `prev_name` to `name` in one write.
    pub fn rename_entry(&self, prev_name: &str, name: &str) -> RegistryResult<()> {
        let from = self.entry_path(prev_name)?;
        let to = self.entry_path(name)?;
        let doc_id = self.store.current_document_id()?;
        if !self.store.move_field(doc_id, &from, &to)? {
            return Err(RegistryError::NotFound(prev_name.to_string()));
        }
        info!("event=entry_rename module=registry status=ok prev_name={prev_name} name={name}");
        Ok(())
    }

    /// Lists entry names containing `search` (case-sensitive), sorted.
    pub fn list_entries(&self, search: &str) -> RegistryResult<EntryListing> {
        let doc_id = self.store.current_document_id()?;
        let snapshot = self.store.load_document(doc_id)?;
        let entries = snapshot
            .get(&self.registry_path)
            .and_then(Value::as_object);

        let mut names = entries
            .into_iter()
            .flat_map(|entries| entries.keys())
            .filter(|name| name.contains(search))
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(EntryListing {
            has_entries: entries.is_some_and(|entries| !entries.is_empty()),
            names,
            search: search.to_string(),
        })
    }

    /// Fetches one entry's spec with its indented text form.
    ///
    /// A name that could never be stored is reported as not found.
    pub fn fetch_entry(&self, name: &str) -> RegistryResult<FetchedEntry> {
        let Ok(path) = self.entry_path(name) else {
            return Err(RegistryError::NotFound(name.to_string()));
        };
        let doc_id = self.store.current_document_id()?;
        let snapshot = self.store.load_document(doc_id)?;
        let Some(stored) = snapshot.get(&path) else {
            return Err(RegistryError::NotFound(name.to_string()));
        };

        // Records written by `update_entry` carry the spec under `queries`.
        let spec = stored
            .as_object()
            .and_then(|record| record.get(FIELD_QUERIES))
            .unwrap_or(stored)
            .clone();
        let query_text = to_indented_json(&spec)?;
        Ok(FetchedEntry {
            name: name.to_string(),
            spec,
            query_text,
        })
    }

    fn entry_path(&self, name: &str) -> RegistryResult<DotPath> {
        validate_entry_name(name)?;
        Ok(self.registry_path.child(name)?)
    }
}

/// Fields required by `update_entry`.
pub fn update_rule() -> FieldRule {
    FieldRule::new([FIELD_NAME, FIELD_PREV_NAME, FIELD_QUERIES])
}

/// Checks that `name` can be used as a registry key.
pub fn validate_entry_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let reason = if name.contains('.') {
        "must not contain `.`"
    } else if name.chars().any(is_reserved_char) {
        "must not contain `\"`, `\\` or control characters"
    } else {
        return Ok(());
    };
    Err(ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn field_as_name<'a>(
    record: &'a RequestFields,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match record.get(field) {
        Some(Value::String(name)) => Ok(name.as_str()),
        Some(other) => Err(ValidationError::InvalidName {
            name: other.to_string(),
            reason: "must be a string",
        }),
        None => Err(ValidationError::MissingName),
    }
}

fn to_indented_json(value: &Value) -> RegistryResult<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(QUERY_TEXT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| RegistryError::Render(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| RegistryError::Render(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{to_indented_json, update_rule, validate_entry_name};
    use crate::service::error::{RegistryError, ValidationError};
    use std::error::Error;
    use serde_json::json;

    #[test]
    fn entry_names_reject_empty_dots_and_reserved_characters() {
        assert_eq!(validate_entry_name(""), Err(ValidationError::MissingName));
        assert!(validate_entry_name("  ").is_ok());
        for name in ["a\\b", "x\\", "tab\tname", "line\nbreak"] {
            assert!(
                matches!(
                    validate_entry_name(name),
                    Err(ValidationError::InvalidName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
        assert!(matches!(
            validate_entry_name("top.bar"),
            Err(ValidationError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_entry_name("top\"bar"),
            Err(ValidationError::InvalidName { .. })
        ));
        assert!(validate_entry_name("Top-Bar_2").is_ok());
    }

    #[test]
    fn update_rule_requires_three_fields() {
        assert_eq!(
            update_rule().required().collect::<Vec<_>>(),
            vec!["name", "prev_name", "queries"]
        );
    }

    #[test]
    fn render_errors_are_not_storage_errors() {
        let err = RegistryError::Render("bad bytes".to_string());
        assert_eq!(err.to_string(), "can't render display point: bad bytes");
        assert!(err.source().is_none());
    }

    #[test]
    fn query_text_uses_four_space_indent() {
        let text = to_indented_json(&json!({"limit": 5})).unwrap();
        assert_eq!(text, "{\n    \"limit\": 5\n}");
    }
}
