//! Display point registry for a shared configuration document.
//!
//! Named query specifications live under one key of the installation-wide
//! configuration document. Every mutation is a single field-scoped write so
//! other modules sharing the document are never clobbered.

pub mod admin;
pub mod config;
pub mod db;
pub mod input;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use admin::hooks::{AdminAction, AdminView, DisplayEditorHooks, HelpPage, FIELD_SEARCH};
pub use admin::route::{AdminRoute, RouteParams};
pub use config::{ConfigError, RegistryConfig};
pub use input::extract::{Extraction, FieldRule, MissingFields, RequestFields};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{ConfigDocument, DocumentId};
pub use model::path::{DotPath, PathError};
pub use repo::config_store::{ConfigDocumentStore, SqliteConfigStore, StoreError, StoreResult};
pub use service::error::{RegistryError, RegistryResult, RoutingError, ValidationError};
pub use service::registry_service::{EntryListing, FetchedEntry, RegistryService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
