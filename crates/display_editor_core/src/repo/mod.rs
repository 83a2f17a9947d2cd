//! Persistence boundary for the shared configuration document.
//!
//! # Responsibility
//! - Define the field-scoped store contract consumed by the registry.
//! - Keep SQLite and JSON1 details out of service orchestration.
//!
//! # Invariants
//! - Every write is one atomic set, unset or move at a dot path.
//! - No write rewrites the document body from a client-side copy.

pub mod config_store;
