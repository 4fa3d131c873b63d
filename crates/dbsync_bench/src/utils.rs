//! Benchmark utilities.

use dbsync_engine::{Side, SnapshotPair, SnapshotSet};
use dbsync_store::{MemoryStore, RecordSnapshot};
use rand::Rng;
use std::sync::Arc;

/// Generate a record with a random id, timestamp and a small payload.
pub fn random_record(rng: &mut impl Rng) -> RecordSnapshot {
    RecordSnapshot::new(uuid::Uuid::new_v4().to_string())
        .with_updated_at(rng.gen_range(0..1_000_000))
        .with_field("name", format!("user-{}", rng.gen::<u32>()))
        .with_field("active", rng.gen::<bool>())
}

/// Generate `count` records.
pub fn generate_records(count: usize) -> Vec<RecordSnapshot> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| random_record(&mut rng)).collect()
}

/// Generate two sides sharing roughly `overlap` (0.0 to 1.0) of their ids.
///
/// Shared records get fresh timestamps on the target, so a merge has
/// updates in both directions.
pub fn overlapping_sides(count: usize, overlap: f64) -> (Vec<RecordSnapshot>, Vec<RecordSnapshot>) {
    let mut rng = rand::thread_rng();
    let source = generate_records(count);
    let target = source
        .iter()
        .map(|record| {
            if rng.gen_bool(overlap) {
                record
                    .clone()
                    .with_updated_at(rng.gen_range(0..1_000_000))
            } else {
                random_record(&mut rng)
            }
        })
        .collect();
    (source, target)
}

/// Build a snapshot pair for one model.
pub fn snapshot_pair(model: &str, count: usize, overlap: f64) -> SnapshotPair {
    let (source, target) = overlapping_sides(count, overlap);
    SnapshotPair::new(
        SnapshotSet::new(model, Side::Source, source),
        SnapshotSet::new(model, Side::Target, target),
    )
}

/// Build a store holding `records` under `model`.
pub fn memory_store(label: &str, model: &str, records: &[RecordSnapshot]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(label));
    for record in records {
        store.insert(model, record.clone());
    }
    store
}
