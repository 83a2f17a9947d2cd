//! Host-facing admin surface.
//!
//! # Responsibility
//! - Resolve admin URLs into `{view, param}` pairs.
//! - Dispatch admin views and actions onto registry operations.
//! - Expose install/uninstall lifecycle hooks.

pub mod hooks;
pub mod route;
