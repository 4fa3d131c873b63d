//! Test fixtures and store helpers.
//!
//! Provides seeded stores, temporary SQLite databases and a store that
//! fails on demand.

use dbsync_store::{
    MemoryStore, RecordSnapshot, RecordStore, SqliteStore, StoreError, StoreResult, Timestamp,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Builds a record with a timestamp and an empty payload.
pub fn record(id: &str, updated_at: Timestamp) -> RecordSnapshot {
    RecordSnapshot::new(id).with_updated_at(updated_at)
}

/// Builds a record with a random id.
pub fn random_record(updated_at: Timestamp) -> RecordSnapshot {
    record(&uuid::Uuid::new_v4().to_string(), updated_at)
}

/// Creates a shared in-memory store holding `records` under `model`.
pub fn seeded_store(label: &str, model: &str, records: &[RecordSnapshot]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(label));
    for record in records {
        store.insert(model, record.clone());
    }
    store
}

/// A temporary SQLite database removed on drop.
pub struct TempSqlite {
    /// The open store.
    pub store: SqliteStore,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempSqlite {
    /// Creates a fresh database with one empty table per model.
    pub fn with_models(models: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("sync.db");
        let store = SqliteStore::create(&path).expect("Failed to create SQLite database");
        for model in models {
            store
                .ensure_table(model)
                .expect("Failed to create model table");
        }
        Self {
            store,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connection string for the database.
    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    /// Writes records into one model.
    pub fn seed(&self, model: &str, records: &[RecordSnapshot]) {
        for record in records {
            self.store
                .upsert(model, record)
                .expect("Failed to seed record");
        }
    }
}

/// An in-memory store that fails selected reads and writes.
///
/// Failures are configured up front with the `fail_*` builders. Ordinary
/// failures surface as [`StoreError::Rejected`] or
/// [`StoreError::UnknownModel`]; a lost connection surfaces as
/// [`StoreError::ConnectionLost`].
pub struct FaultyStore {
    inner: MemoryStore,
    failing_writes: HashSet<(String, String)>,
    failing_reads: HashSet<String>,
    lose_connection_after: Option<u64>,
    writes: AtomicU64,
}

impl FaultyStore {
    /// Creates a store that does not fail yet.
    pub fn new(label: &str) -> Self {
        Self {
            inner: MemoryStore::new(label),
            failing_writes: HashSet::new(),
            failing_reads: HashSet::new(),
            lose_connection_after: None,
            writes: AtomicU64::new(0),
        }
    }

    /// Rejects every write of record `id` in `model`.
    pub fn fail_write(mut self, model: &str, id: &str) -> Self {
        self.failing_writes.insert((model.to_string(), id.to_string()));
        self
    }

    /// Fails every snapshot read of `model`.
    pub fn fail_read(mut self, model: &str) -> Self {
        self.failing_reads.insert(model.to_string());
        self
    }

    /// Reports a lost connection once `writes` writes have succeeded.
    pub fn lose_connection_after(mut self, writes: u64) -> Self {
        self.lose_connection_after = Some(writes);
        self
    }

    /// Seeds a record without going through the fault rules.
    pub fn insert(&self, model: &str, record: RecordSnapshot) {
        self.inner.insert(model, record);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn connection_lost(&self) -> bool {
        self.lose_connection_after
            .is_some_and(|limit| self.writes.load(Ordering::SeqCst) >= limit)
    }
}

impl RecordStore for FaultyStore {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>> {
        if self.connection_lost() {
            return Err(StoreError::ConnectionLost("server closed the connection".into()));
        }
        if self.failing_reads.contains(model) {
            return Err(StoreError::UnknownModel(model.to_string()));
        }
        self.inner.read_all(model)
    }

    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()> {
        if self.connection_lost() {
            return Err(StoreError::ConnectionLost("server closed the connection".into()));
        }
        if self
            .failing_writes
            .contains(&(model.to_string(), record.id.clone()))
        {
            return Err(StoreError::rejected(model, &record.id, "constraint violation"));
        }
        self.inner.upsert(model, record)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }
}
