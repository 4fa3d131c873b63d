//! In-memory record store for testing.

use crate::error::{StoreError, StoreResult};
use crate::record::{check_model_name, RecordSnapshot};
use crate::store::RecordStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Every record of every model, keyed by model name then record id.
pub type MemoryContents = BTreeMap<String, BTreeMap<String, RecordSnapshot>>;

/// An in-memory record store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Dry runs against throwaway data (`memory://`)
///
/// A model that was never written reads back as empty.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use dbsync_store::{MemoryStore, RecordSnapshot, RecordStore};
///
/// let store = MemoryStore::new("local");
/// store.upsert("user", &RecordSnapshot::new("u1").with_updated_at(5)).unwrap();
/// assert_eq!(store.read_all("user").unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    label: String,
    models: RwLock<MemoryContents>,
    connected: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            models: RwLock::new(BTreeMap::new()),
            connected: AtomicBool::new(true),
            writes: AtomicU64::new(0),
        }
    }

    /// Inserts a record directly, without counting it as a write.
    ///
    /// Used to seed fixtures.
    pub fn insert(&self, model: &str, record: RecordSnapshot) {
        self.models
            .write()
            .entry(model.to_string())
            .or_default()
            .insert(record.id.clone(), record);
    }

    /// Returns a copy of one record.
    #[must_use]
    pub fn get(&self, model: &str, id: &str) -> Option<RecordSnapshot> {
        self.models
            .read()
            .get(model)
            .and_then(|records| records.get(id))
            .cloned()
    }

    /// Returns the number of records in a model.
    #[must_use]
    pub fn len(&self, model: &str) -> usize {
        self.models.read().get(model).map_or(0, BTreeMap::len)
    }

    /// Returns true if the model holds no records.
    #[must_use]
    pub fn is_empty(&self, model: &str) -> bool {
        self.len(model) == 0
    }

    /// Returns a copy of everything in the store.
    ///
    /// Useful for asserting that a run left the store unchanged.
    #[must_use]
    pub fn contents(&self) -> MemoryContents {
        self.models.read().clone()
    }

    /// Returns how many upserts have been applied.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulates a dropped connection.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Reopens a closed store, keeping its contents.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    fn check_connected(&self) -> StoreResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

impl RecordStore for MemoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>> {
        self.check_connected()?;
        check_model_name(model)?;
        Ok(self
            .models
            .read()
            .get(model)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()> {
        self.check_connected()?;
        check_model_name(model)?;
        self.insert(model, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) -> StoreResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
