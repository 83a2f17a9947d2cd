//! Configuration document snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::path::DotPath;

/// Stable identifier of the live configuration document.
pub type DocumentId = Uuid;

/// Read-only snapshot of the configuration document.
///
/// Snapshots are never written back; every mutation goes through the store as
/// a field-level set or unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub id: DocumentId,
    /// Incremented by every successful field write.
    pub revision: i64,
    pub root: Value,
}

impl ConfigDocument {
    /// Resolves `path` in this snapshot.
    pub fn get(&self, path: &DotPath) -> Option<&Value> {
        path.get(&self.root)
    }
}
