//! Untrusted request input handling.
//!
//! # Responsibility
//! - Select the fields an operation needs from loosely typed request maps.
//! - Report every missing required field at once.

pub mod extract;
