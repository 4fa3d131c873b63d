//! Point-in-time reads of one model.

use crate::config::Side;
use dbsync_store::{RecordSnapshot, RecordStore, StoreResult};
use std::collections::HashMap;
use tracing::debug;

/// Every record of one model on one side, keyed by id.
///
/// A set is read once and never modified; resolution only looks at it.
#[derive(Debug, Clone)]
pub struct SnapshotSet {
    model: String,
    side: Side,
    records: HashMap<String, RecordSnapshot>,
}

impl SnapshotSet {
    /// Builds a set from records. A repeated id keeps the last record.
    pub fn new(model: impl Into<String>, side: Side, records: Vec<RecordSnapshot>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            model: model.into(),
            side,
            records,
        }
    }

    /// An empty set.
    pub fn empty(model: impl Into<String>, side: Side) -> Self {
        Self::new(model, side, Vec::new())
    }

    /// Model this set was read from.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Side this set was read from.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Looks up a record.
    pub fn get(&self, id: &str) -> Option<&RecordSnapshot> {
        self.records.get(id)
    }

    /// Returns true if the set holds `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the model had no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record ids in ascending order.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterates records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &RecordSnapshot> {
        self.records.values()
    }
}

/// The source and target snapshots of one model.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    /// Source side.
    pub source: SnapshotSet,
    /// Target side.
    pub target: SnapshotSet,
}

impl SnapshotPair {
    /// Pairs two snapshots of the same model.
    pub fn new(source: SnapshotSet, target: SnapshotSet) -> Self {
        debug_assert_eq!(source.model(), target.model());
        Self { source, target }
    }

    /// Returns the snapshot of one side.
    pub fn side(&self, side: Side) -> &SnapshotSet {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Model both snapshots were read from.
    pub fn model(&self) -> &str {
        self.source.model()
    }
}

/// Reads every record of `model` from `store`.
///
/// An empty model yields an empty set.
///
/// # Errors
///
/// Returns the store error unchanged; whether it skips the model or ends
/// the run is the caller's decision.
pub fn load(store: &dyn RecordStore, model: &str, side: Side) -> StoreResult<SnapshotSet> {
    let records = store.read_all(model)?;
    debug!(
        model,
        side = side.as_str(),
        store = store.label(),
        records = records.len(),
        "loaded snapshot"
    );
    Ok(SnapshotSet::new(model, side, records))
}
