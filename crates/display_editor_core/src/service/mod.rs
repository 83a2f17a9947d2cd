//! Registry use-case services.
//!
//! # Responsibility
//! - Orchestrate input validation, path building and store writes.
//! - Keep admin dispatch decoupled from storage details.

pub mod error;
pub mod registry_service;
