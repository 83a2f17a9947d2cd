//! Configuration document model.
//!
//! # Responsibility
//! - Describe the shared configuration tree and its snapshots.
//! - Address values inside the tree with dot-separated paths.
//!
//! # Invariants
//! - The tree is a recursive `serde_json::Value`; the document root is always
//!   a mapping.
//! - Paths are parsed once into segments and never re-split afterwards.

pub mod document;
pub mod path;
