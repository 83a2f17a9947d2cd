//! Configuration document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the single live configuration document of an installation.
//! - Apply field-level `json_set` / `json_remove` updates atomically.
//!
//! # Invariants
//! - Exactly one row exists in `config_documents` once the id was requested.
//! - The document id never changes after creation.
//! - A write whose path crosses a non-mapping value is rolled back.

use crate::db::migrations::ensure_latest;
use crate::db::DbError;
use crate::model::document::{ConfigDocument, DocumentId};
use crate::model::path::DotPath;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by configuration document storage.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    DocumentNotFound(DocumentId),
    /// An ancestor of the target path holds a non-mapping value.
    PathBlocked(DotPath),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DocumentNotFound(id) => write!(f, "config document not found: {id}"),
            Self::PathBlocked(path) => {
                write!(f, "cannot write `{path}`: a parent value is not a mapping")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted config data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Field-scoped access to the shared configuration document.
pub trait ConfigDocumentStore {
    /// Returns the id of the live document, creating an empty one if needed.
    fn current_document_id(&self) -> StoreResult<DocumentId>;
    /// Loads a read-only snapshot of the document.
    fn load_document(&self, id: DocumentId) -> StoreResult<ConfigDocument>;
    /// Sets the value at `path`, creating missing parent mappings.
    fn set_field(&self, id: DocumentId, path: &DotPath, value: &Value) -> StoreResult<()>;
    /// Removes the value at `path` and everything under it.
    fn unset_field(&self, id: DocumentId, path: &DotPath) -> StoreResult<()>;
    /// Moves the sub-tree at `from` to `to` in one step.
    ///
    /// Returns `false` without writing when `from` is absent.
    fn move_field(&self, id: DocumentId, from: &DotPath, to: &DotPath) -> StoreResult<bool>;
}

impl<T: ConfigDocumentStore + ?Sized> ConfigDocumentStore for &T {
    fn current_document_id(&self) -> StoreResult<DocumentId> {
        (**self).current_document_id()
    }

    fn load_document(&self, id: DocumentId) -> StoreResult<ConfigDocument> {
        (**self).load_document(id)
    }

    fn set_field(&self, id: DocumentId, path: &DotPath, value: &Value) -> StoreResult<()> {
        (**self).set_field(id, path, value)
    }

    fn unset_field(&self, id: DocumentId, path: &DotPath) -> StoreResult<()> {
        (**self).unset_field(id, path)
    }

    fn move_field(&self, id: DocumentId, from: &DotPath, to: &DotPath) -> StoreResult<bool> {
        (**self).move_field(id, from, to)
    }
}

/// SQLite-backed configuration document store.
pub struct SqliteConfigStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConfigStore<'conn> {
    /// Wraps a connection whose schema is already migrated.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_latest(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl ConfigDocumentStore for SqliteConfigStore<'_> {
    fn current_document_id(&self) -> StoreResult<DocumentId> {
        if let Some(id) = select_document_id(self.conn)? {
            return Ok(id);
        }

        let tx = self.begin()?;
        // Another connection may have created the row since the first read.
        let id = match select_document_id(&tx)? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO config_documents (id, body) VALUES (?1, '{}');",
                    [id.to_string()],
                )?;
                debug!("event=config_document_create module=config_store status=ok doc_id={id}");
                id
            }
        };
        tx.commit()?;
        Ok(id)
    }

    fn load_document(&self, id: DocumentId) -> StoreResult<ConfigDocument> {
        let row = self
            .conn
            .query_row(
                "SELECT revision, body FROM config_documents WHERE id = ?1;",
                [id.to_string()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((revision, body)) = row else {
            return Err(StoreError::DocumentNotFound(id));
        };
        let root = serde_json::from_str::<Value>(&body).map_err(|err| {
            StoreError::InvalidData(format!("config_documents.body of {id}: {err}"))
        })?;
        Ok(ConfigDocument { id, revision, root })
    }

    fn set_field(&self, id: DocumentId, path: &DotPath, value: &Value) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.set_in_tx(id, path, value);
        log_write("set", id, path, started_at, &result);
        result
    }

    fn unset_field(&self, id: DocumentId, path: &DotPath) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self
            .conn
            .execute(
                "UPDATE config_documents
                 SET
                    body = json_remove(body, ?2),
                    revision = revision + 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), path.to_json_path()],
            )
            .map_err(StoreError::from)
            .and_then(|changed| match changed {
                0 => Err(StoreError::DocumentNotFound(id)),
                _ => Ok(()),
            });
        log_write("unset", id, path, started_at, &result);
        result
    }

    fn move_field(&self, id: DocumentId, from: &DotPath, to: &DotPath) -> StoreResult<bool> {
        let started_at = Instant::now();
        let result = self.move_in_tx(id, from, to);
        log_write("move", id, to, started_at, &result);
        result
    }
}

impl SqliteConfigStore<'_> {
    fn set_in_tx(&self, id: DocumentId, path: &DotPath, value: &Value) -> StoreResult<()> {
        let json_path = path.to_json_path();
        let tx = self.begin()?;
        let changed = tx.execute(
            "UPDATE config_documents
             SET
                body = json_set(body, ?2, json(?3)),
                revision = revision + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), json_path, value.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::DocumentNotFound(id));
        }
        // json_set leaves the body untouched when a parent is not a mapping.
        if field_type(&tx, id, &json_path)?.is_none() {
            return Err(StoreError::PathBlocked(path.clone()));
        }
        tx.commit()?;
        Ok(())
    }

    fn move_in_tx(&self, id: DocumentId, from: &DotPath, to: &DotPath) -> StoreResult<bool> {
        let from_path = from.to_json_path();
        let to_path = to.to_json_path();
        let tx = self.begin()?;
        if !document_exists(&tx, id)? {
            return Err(StoreError::DocumentNotFound(id));
        }
        if field_type(&tx, id, &from_path)?.is_none() {
            return Ok(false);
        }
        tx.execute(
            "UPDATE config_documents
             SET
                body = json_set(json_remove(body, ?2), ?3, json_extract(body, ?2)),
                revision = revision + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), from_path, to_path],
        )?;
        if field_type(&tx, id, &to_path)?.is_none() {
            return Err(StoreError::PathBlocked(to.clone()));
        }
        tx.commit()?;
        Ok(true)
    }
}

fn select_document_id(conn: &Connection) -> StoreResult<Option<DocumentId>> {
    let text = conn
        .query_row(
            "SELECT id FROM config_documents ORDER BY created_at ASC, id ASC LIMIT 1;",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    text.map(|value| {
        Uuid::parse_str(&value).map_err(|_| {
            StoreError::InvalidData(format!("invalid uuid `{value}` in config_documents.id"))
        })
    })
    .transpose()
}

fn document_exists(conn: &Connection, id: DocumentId) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM config_documents WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns the JSON type name at `json_path`, `None` when absent.
fn field_type(conn: &Connection, id: DocumentId, json_path: &str) -> StoreResult<Option<String>> {
    let kind = conn
        .query_row(
            "SELECT json_type(body, ?2) FROM config_documents WHERE id = ?1;",
            params![id.to_string(), json_path],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;
    Ok(kind.flatten())
}

fn log_write<T>(
    op: &'static str,
    id: DocumentId,
    path: &DotPath,
    started_at: Instant,
    result: &StoreResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!(
            "event=config_write module=config_store status=ok op={op} doc_id={id} path={path} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event=config_write module=config_store status=error op={op} doc_id={id} path={path} duration_ms={duration_ms} error={err}"
        ),
    }
}
