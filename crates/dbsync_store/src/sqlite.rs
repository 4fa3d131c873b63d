//! SQLite-backed record store.

use crate::error::{StoreError, StoreResult};
use crate::record::{check_model_name, Payload, RecordSnapshot};
use crate::store::RecordStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A record store backed by an SQLite database file.
///
/// Each model lives in a table named after the model:
///
/// ```sql
/// CREATE TABLE "<model>" (
///     id TEXT PRIMARY KEY,
///     updated_at INTEGER,      -- epoch milliseconds, NULL if unknown
///     payload TEXT NOT NULL    -- JSON object with the remaining columns
/// )
/// ```
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so the store can be shared across
/// threads even though `rusqlite::Connection` is not `Sync`.
///
/// # Example
///
/// ```no_run
/// use dbsync_store::{RecordSnapshot, RecordStore, SqliteStore};
/// use std::path::Path;
///
/// let store = SqliteStore::open(Path::new("local.db")).unwrap();
/// store.upsert("user", &RecordSnapshot::new("u1").with_updated_at(1)).unwrap();
/// store.close().unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    label: String,
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Opens an existing database file for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the file does not exist or is not
    /// an SQLite database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    /// Opens a database file, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the file cannot be created or opened.
    pub fn create(path: &Path) -> StoreResult<Self> {
        Self::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn open_with_flags(path: &Path, flags: OpenFlags) -> StoreResult<Self> {
        let connect_error = |e: rusqlite::Error| StoreError::Connect {
            target: path.display().to_string(),
            message: e.to_string(),
        };

        let conn = Connection::open_with_flags(path, flags).map_err(connect_error)?;
        // Opening is lazy; touching the schema surfaces files that are not databases.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connect_error)?;
        debug!(path = %path.display(), "opened sqlite database");

        Ok(Self {
            label: format!("sqlite:{}", path.display()),
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Returns the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the table for `model` if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the model name is invalid or the statement fails.
    pub fn ensure_table(&self, model: &str) -> StoreResult<()> {
        let model = check_model_name(model)?;
        self.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS \"{model}\" (
                    id TEXT PRIMARY KEY,
                    updated_at INTEGER,
                    payload TEXT NOT NULL
                )"
            ))?;
            Ok(())
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        f(conn)
    }

    fn require_table(conn: &Connection, model: &str) -> StoreResult<()> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![model],
                |_| Ok(()),
            )
            .optional()?;
        match found {
            Some(()) => Ok(()),
            None => Err(StoreError::UnknownModel(model.to_string())),
        }
    }
}

impl RecordStore for SqliteStore {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>> {
        let model = check_model_name(model)?;
        self.with_conn(|conn| {
            Self::require_table(conn, model)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT id, updated_at, payload FROM \"{model}\" ORDER BY id"
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (id, updated_at, payload) = row?;
                let payload: Payload = serde_json::from_str(&payload)?;
                records.push(RecordSnapshot {
                    id,
                    updated_at,
                    payload,
                });
            }
            Ok(records)
        })
    }

    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()> {
        let model = check_model_name(model)?;
        let payload = serde_json::to_string(&record.payload)?;
        self.with_conn(|conn| {
            Self::require_table(conn, model)?;
            conn.execute(
                &format!(
                    "INSERT INTO \"{model}\" (id, updated_at, payload) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                         updated_at = excluded.updated_at,
                         payload = excluded.payload"
                ),
                params![record.id, record.updated_at, payload],
            )?;
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    fn close(&self) -> StoreResult<()> {
        match self.conn.lock().take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                debug!(path = %self.path.display(), "closed sqlite database");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
