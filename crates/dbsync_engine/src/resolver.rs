//! Turning snapshots into write actions.
//!
//! One-directional runs mirror the origin side blindly: every origin record
//! is written to the other side, even when the destination copy is newer.
//! Bidirectional runs reconcile: ids missing on one side are copied over,
//! ids present on both are decided by `updated_at`, and equal timestamps
//! leave both copies alone.

use crate::config::{Side, SyncDirection};
use crate::diff::diff;
use crate::snapshot::{SnapshotPair, SnapshotSet};
use dbsync_store::Timestamp;
use std::cmp::Ordering;
use std::fmt;

/// What an action does to its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// The destination has no record with this id.
    Create,
    /// The destination record is overwritten.
    Update,
    /// Both sides carry the same timestamp; nothing is written.
    NoopTie,
}

impl ActionKind {
    /// Lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::NoopTie => "tie",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved decision for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    /// Model the record belongs to.
    pub model: String,
    /// Record identifier.
    pub record_id: String,
    /// What to do.
    pub kind: ActionKind,
    /// Side that is written. For a tie this is the target by convention.
    pub destination: Side,
}

impl SyncAction {
    fn new(model: &str, record_id: &str, kind: ActionKind, destination: Side) -> Self {
        Self {
            model: model.to_string(),
            record_id: record_id.to_string(),
            kind,
            destination,
        }
    }

    /// Side whose copy of the record is written.
    pub fn origin(&self) -> Side {
        self.destination.opposite()
    }

    /// Returns true if applying the action writes to a store.
    pub fn is_write(&self) -> bool {
        self.kind != ActionKind::NoopTie
    }
}

/// Last-write-wins between two timestamps.
///
/// Returns the side holding the newer copy, or `None` on a tie. The result
/// depends only on the two values, never on argument order: swapping the
/// timestamps swaps the winner.
pub fn newer_side(source_time: Timestamp, target_time: Timestamp) -> Option<Side> {
    match source_time.cmp(&target_time) {
        Ordering::Greater => Some(Side::Source),
        Ordering::Less => Some(Side::Target),
        Ordering::Equal => None,
    }
}

/// Resolves every record of a model into actions for `direction`.
///
/// Actions come out in a deterministic order: sorted by id within each group.
pub fn resolve(direction: SyncDirection, pair: &SnapshotPair) -> Vec<SyncAction> {
    match direction.origin() {
        Some(origin) => mirror(pair.side(origin), pair.side(origin.opposite())),
        None => merge(pair),
    }
}

fn mirror(origin: &SnapshotSet, destination: &SnapshotSet) -> Vec<SyncAction> {
    let model = origin.model();
    origin
        .sorted_ids()
        .into_iter()
        .map(|id| {
            let kind = if destination.contains(id) {
                ActionKind::Update
            } else {
                ActionKind::Create
            };
            SyncAction::new(model, id, kind, destination.side())
        })
        .collect()
}

fn merge(pair: &SnapshotPair) -> Vec<SyncAction> {
    let model = pair.model();
    let ids = diff(&pair.source, &pair.target);
    let mut actions = Vec::with_capacity(ids.total());

    for id in &ids.only_in_source {
        actions.push(SyncAction::new(model, id, ActionKind::Create, Side::Target));
    }
    for id in &ids.only_in_target {
        actions.push(SyncAction::new(model, id, ActionKind::Create, Side::Source));
    }
    for id in &ids.in_both {
        let (Some(source), Some(target)) = (pair.source.get(id), pair.target.get(id)) else {
            continue;
        };
        let action = match newer_side(
            source.effective_updated_at(),
            target.effective_updated_at(),
        ) {
            Some(winner) => SyncAction::new(model, id, ActionKind::Update, winner.opposite()),
            None => SyncAction::new(model, id, ActionKind::NoopTie, Side::Target),
        };
        actions.push(action);
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbsync_store::RecordSnapshot;
    use proptest::prelude::*;

    fn record(id: &str, updated_at: Option<Timestamp>) -> RecordSnapshot {
        let record = RecordSnapshot::new(id);
        match updated_at {
            Some(ts) => record.with_updated_at(ts),
            None => record,
        }
    }

    fn pair(source: Vec<RecordSnapshot>, target: Vec<RecordSnapshot>) -> SnapshotPair {
        SnapshotPair::new(
            SnapshotSet::new("asset", Side::Source, source),
            SnapshotSet::new("asset", Side::Target, target),
        )
    }

    fn find<'a>(actions: &'a [SyncAction], id: &str) -> &'a SyncAction {
        actions.iter().find(|a| a.record_id == id).unwrap()
    }

    #[test]
    fn push_overwrites_newer_target() {
        let snapshots = pair(vec![record("a1", Some(1))], vec![record("a1", Some(100))]);
        let actions = resolve(SyncDirection::PushToTarget, &snapshots);

        assert_eq!(
            actions,
            vec![SyncAction::new("asset", "a1", ActionKind::Update, Side::Target)]
        );
    }

    #[test]
    fn push_creates_missing_and_ignores_target_only() {
        let snapshots = pair(
            vec![record("a1", None), record("a2", Some(5))],
            vec![record("a2", Some(5)), record("a9", Some(1))],
        );
        let actions = resolve(SyncDirection::PushToTarget, &snapshots);

        assert_eq!(actions.len(), 2);
        assert_eq!(find(&actions, "a1").kind, ActionKind::Create);
        assert_eq!(find(&actions, "a2").kind, ActionKind::Update);
        assert!(actions.iter().all(|a| a.destination == Side::Target));
    }

    #[test]
    fn pull_writes_into_source() {
        let snapshots = pair(vec![record("a1", Some(50))], vec![record("a1", Some(2)), record("a3", None)]);
        let actions = resolve(SyncDirection::PullFromSource, &snapshots);

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.destination == Side::Source));
        assert_eq!(find(&actions, "a1").kind, ActionKind::Update);
        assert_eq!(find(&actions, "a3").kind, ActionKind::Create);
        assert_eq!(find(&actions, "a1").origin(), Side::Target);
    }

    #[test]
    fn merge_newer_source_updates_target() {
        let snapshots = pair(vec![record("x", Some(50))], vec![record("x", Some(10))]);
        let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);
        assert_eq!(
            actions,
            vec![SyncAction::new("asset", "x", ActionKind::Update, Side::Target)]
        );
    }

    #[test]
    fn merge_newer_target_updates_source() {
        let snapshots = pair(vec![record("x", Some(10))], vec![record("x", Some(50))]);
        let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);
        assert_eq!(actions[0].destination, Side::Source);
        assert_eq!(actions[0].kind, ActionKind::Update);
    }

    #[test]
    fn merge_equal_timestamps_tie() {
        let source = record("y", Some(5)).with_field("title", "left");
        let target = record("y", Some(5)).with_field("title", "right");
        let actions = resolve(SyncDirection::BidirectionalMerge, &pair(vec![source], vec![target]));

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::NoopTie);
        assert!(!actions[0].is_write());
    }

    #[test]
    fn merge_missing_timestamp_is_epoch() {
        let snapshots = pair(vec![record("m", None)], vec![record("m", Some(1))]);
        let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);
        assert_eq!(actions[0].destination, Side::Source);

        let snapshots = pair(vec![record("m", None)], vec![record("m", Some(0))]);
        let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);
        assert_eq!(actions[0].kind, ActionKind::NoopTie);
    }

    #[test]
    fn merge_copies_one_sided_records() {
        let snapshots = pair(vec![record("s", Some(1))], vec![record("t", Some(1))]);
        let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);

        assert_eq!(actions.len(), 2);
        assert_eq!(
            find(&actions, "s"),
            &SyncAction::new("asset", "s", ActionKind::Create, Side::Target)
        );
        assert_eq!(
            find(&actions, "t"),
            &SyncAction::new("asset", "t", ActionKind::Create, Side::Source)
        );
    }

    #[test]
    fn empty_model_resolves_to_nothing() {
        for direction in SyncDirection::ALL {
            assert!(resolve(direction, &pair(vec![], vec![])).is_empty());
        }
    }

    proptest! {
        #[test]
        fn tie_break_is_side_independent(a in any::<i64>(), b in any::<i64>()) {
            let forward = newer_side(a, b);
            let backward = newer_side(b, a);
            prop_assert_eq!(forward.map(Side::opposite), backward);
            prop_assert_eq!(forward.is_none(), a == b);
        }

        #[test]
        fn merge_emits_one_action_per_id(
            source in prop::collection::btree_map("[a-h]", prop::option::of(0i64..4), 0..8),
            target in prop::collection::btree_map("[a-h]", prop::option::of(0i64..4), 0..8),
        ) {
            let snapshots = pair(
                source.iter().map(|(id, ts)| record(id, *ts)).collect(),
                target.iter().map(|(id, ts)| record(id, *ts)).collect(),
            );
            let actions = resolve(SyncDirection::BidirectionalMerge, &snapshots);

            let mut ids: Vec<&str> = source.keys().chain(target.keys()).map(String::as_str).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(actions.len(), ids.len());
        }
    }
}
