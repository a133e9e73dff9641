//! Local cache store
//!
//! Durable key-value storage for per-book reader state. Pure storage: no
//! merge logic lives here.
//!
//! Entries that fail to deserialize are reported as absent rather than as
//! errors, so a damaged row never blocks the reader from opening a book.

use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};

/// Record types stored per book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Highlights,
    Bookmarks,
    Notes,
    Location,
    TotalChars,
    CopiedChars,
    Preferences,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Highlights => "highlights",
            RecordKind::Bookmarks => "bookmarks",
            RecordKind::Notes => "notes",
            RecordKind::Location => "location",
            RecordKind::TotalChars => "total_chars",
            RecordKind::CopiedChars => "copied_chars",
            RecordKind::Preferences => "preferences",
        }
    }
}

/// Cache key derived from a book's resource locator and a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(locator: &str, kind: RecordKind) -> Self {
        Self(format!("{}:{}", kind.as_str(), locator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SQLite-backed key-value cache
///
/// The connection sits behind a mutex that is held for a single statement
/// at a time, so the cache can be shared between async tasks.
pub struct LocalCache {
    conn: Mutex<Connection>,
}

impl LocalCache {
    /// Open or create the cache database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(path).map_err(StorageError::from_sqlite)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory cache (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from_sqlite)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn).map_err(StorageError::from_sqlite)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    /// Read a value, treating missing and corrupt entries alike as `None`
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> StorageResult<Option<T>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from_sqlite)?;
        drop(conn);

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring undeserializable cache entry");
                Ok(None)
            }
        }
    }

    /// Read a list, treating missing and corrupt entries as empty
    pub fn get_list<T: DeserializeOwned>(&self, key: &CacheKey) -> StorageResult<Vec<T>> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Store a value, replacing whatever was there
    pub fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?)",
            params![key.as_str(), json, Utc::now().timestamp()],
        )
        .map_err(StorageError::from_sqlite)?;
        Ok(())
    }

    /// Delete an entry; missing keys are not an error
    pub fn remove(&self, key: &CacheKey) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM cache_entries WHERE key = ?",
            params![key.as_str()],
        )
        .map_err(StorageError::from_sqlite)?;
        Ok(())
    }

    /// Number of stored entries
    pub fn entry_count(&self) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
            .map_err(StorageError::from_sqlite)
    }

    /// Write a raw string under a key, bypassing serialization
    #[cfg(test)]
    pub(crate) fn set_raw(&self, key: &CacheKey, raw: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?, ?, 0)",
            params![key.as_str(), raw],
        )?;
        Ok(())
    }
}
