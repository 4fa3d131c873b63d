//! Record store trait definition.

use crate::error::StoreResult;
use crate::record::RecordSnapshot;
use std::sync::Arc;

/// A database handle as seen by the sync engine.
///
/// Stores expose exactly two data operations: read every record of a model,
/// and upsert one record by id. They know nothing about directions, diffs or
/// conflict resolution.
///
/// # Invariants
///
/// - `read_all` on a model with no rows returns an empty vector
/// - `upsert` creates the row if absent and overwrites it if present, so
///   repeating the same upsert leaves the same end state
/// - after `close`, every operation fails with a connection-loss error
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing and ephemeral runs
/// - [`super::SqliteStore`] - For SQLite database files
pub trait RecordStore: Send + Sync {
    /// Human-readable label used in log lines.
    fn label(&self) -> &str;

    /// Reads every record of `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist in this database or the
    /// read fails.
    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>>;

    /// Creates or overwrites the record with `record.id` in `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is refused or the connection fails.
    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()>;

    /// Returns true while the handle is usable.
    fn is_connected(&self) -> bool;

    /// Releases the connection. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to shut down cleanly.
    fn close(&self) -> StoreResult<()>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>> {
        (**self).read_all(model)
    }

    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()> {
        (**self).upsert(model, record)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    fn read_all(&self, model: &str) -> StoreResult<Vec<RecordSnapshot>> {
        (**self).read_all(model)
    }

    fn upsert(&self, model: &str, record: &RecordSnapshot) -> StoreResult<()> {
        (**self).upsert(model, record)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }
}
