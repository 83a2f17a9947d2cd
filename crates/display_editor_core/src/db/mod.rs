//! SQLite hosting of the shared configuration document.
//!
//! # Responsibility
//! - Hand out connections on which `config_documents` exists and JSON1
//!   functions (`json_set`, `json_remove`, `json_type`) are usable.
//! - Keep schema state in `PRAGMA user_version` so file databases shared by
//!   several processes agree on the layout before any field write.
//!
//! # Invariants
//! - `config_documents` bodies are always JSON objects (table CHECK).
//! - A connection with an older or newer schema is refused, never upgraded
//!   behind the store's back.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or checking a configuration database.
#[derive(Debug)]
pub enum DbError {
    /// Transport or SQL failure reported by SQLite.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build; its layout is unknown here.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// The connection was opened without `open_db`, so migrations never ran.
    SchemaNotReady { db_version: u32, required: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "config database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "config database schema {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady {
                db_version,
                required,
            } => write!(
                f,
                "config database schema {db_version} is older than required {required}; open it with open_db first"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
