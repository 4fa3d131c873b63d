//! Applying actions to the stores.

use crate::config::Side;
use crate::error::{SyncError, SyncResult};
use crate::resolver::{ActionKind, SyncAction};
use crate::snapshot::SnapshotPair;
use dbsync_store::{RecordSnapshot, RecordStore, StoreResult};
use tracing::{debug, info, warn};

/// What happened to one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A record was created on the given side.
    Created(Side),
    /// A record was overwritten on the given side.
    Updated(Side),
    /// Nothing was written (timestamp tie).
    Skipped,
    /// The write failed and was logged.
    Failed,
}

/// Writes resolved actions to the destination stores.
///
/// In dry-run mode nothing is written; each action is logged as what would
/// have happened and reported as if it had succeeded.
pub struct SyncExecutor<'a> {
    source: &'a dyn RecordStore,
    target: &'a dyn RecordStore,
    dry_run: bool,
}

impl<'a> SyncExecutor<'a> {
    /// Creates an executor over the two stores.
    pub fn new(source: &'a dyn RecordStore, target: &'a dyn RecordStore, dry_run: bool) -> Self {
        Self {
            source,
            target,
            dry_run,
        }
    }

    /// Returns true if writes are simulated.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn store(&self, side: Side) -> &'a dyn RecordStore {
        match side {
            Side::Source => self.source,
            Side::Target => self.target,
        }
    }

    /// Upserts `record` on the action's destination.
    ///
    /// Writing the same record twice leaves the same end state. In dry-run
    /// mode this only logs and always succeeds. A tie is never written.
    ///
    /// # Errors
    ///
    /// Returns the store error if a live write fails.
    pub fn apply(&self, action: &SyncAction, record: &RecordSnapshot) -> StoreResult<()> {
        if !action.is_write() {
            return Ok(());
        }
        if self.dry_run {
            info!(
                model = %action.model,
                id = %action.record_id,
                kind = action.kind.as_str(),
                destination = action.destination.as_str(),
                "dry run: would {} {} record in {}",
                action.kind,
                action.model,
                action.destination,
            );
            return Ok(());
        }

        self.store(action.destination).upsert(&action.model, record)?;
        debug!(
            model = %action.model,
            id = %action.record_id,
            kind = action.kind.as_str(),
            destination = action.destination.as_str(),
            "record written"
        );
        Ok(())
    }

    /// Executes one action against the snapshots it was resolved from.
    ///
    /// A failed write is logged and reported as [`ActionOutcome::Failed`],
    /// so the caller can carry on with the next record.
    ///
    /// # Errors
    ///
    /// Only a lost connection is returned as an error; it ends the run.
    pub fn execute(&self, action: &SyncAction, pair: &SnapshotPair) -> SyncResult<ActionOutcome> {
        if action.kind == ActionKind::NoopTie {
            debug!(
                model = %action.model,
                id = %action.record_id,
                "timestamps equal on both sides, leaving record untouched"
            );
            return Ok(ActionOutcome::Skipped);
        }

        let Some(record) = pair.side(action.origin()).get(&action.record_id) else {
            warn!(
                model = %action.model,
                id = %action.record_id,
                side = action.origin().as_str(),
                "record missing from its own snapshot"
            );
            return Ok(ActionOutcome::Failed);
        };

        match self.apply(action, record) {
            Ok(()) => Ok(match action.kind {
                ActionKind::Create => ActionOutcome::Created(action.destination),
                _ => ActionOutcome::Updated(action.destination),
            }),
            Err(e) if e.is_connection_loss() => Err(SyncError::ConnectionLost {
                side: action.destination,
                model: action.model.clone(),
                source: e,
            }),
            Err(e) => {
                warn!(
                    model = %action.model,
                    id = %action.record_id,
                    destination = action.destination.as_str(),
                    error = %e,
                    "failed to write record"
                );
                Ok(ActionOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotSet;
    use dbsync_store::{MemoryStore, StoreError};

    fn action(id: &str, kind: ActionKind, destination: Side) -> SyncAction {
        SyncAction {
            model: "user".into(),
            record_id: id.into(),
            kind,
            destination,
        }
    }

    fn pair_with(source: Vec<RecordSnapshot>, target: Vec<RecordSnapshot>) -> SnapshotPair {
        SnapshotPair::new(
            SnapshotSet::new("user", Side::Source, source),
            SnapshotSet::new("user", Side::Target, target),
        )
    }

    #[test]
    fn live_create_writes_destination() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, false);
        let snapshots = pair_with(vec![RecordSnapshot::new("u1").with_updated_at(3)], vec![]);

        let outcome = executor
            .execute(&action("u1", ActionKind::Create, Side::Target), &snapshots)
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Created(Side::Target));
        assert_eq!(target.get("user", "u1").unwrap().updated_at, Some(3));
        assert_eq!(source.write_count(), 0);
    }

    #[test]
    fn live_update_writes_origin_copy() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        source.insert("user", RecordSnapshot::new("u1").with_updated_at(1));
        let executor = SyncExecutor::new(&source, &target, false);
        let snapshots = pair_with(
            vec![RecordSnapshot::new("u1").with_updated_at(1)],
            vec![RecordSnapshot::new("u1").with_updated_at(9).with_field("name", "newer")],
        );

        let outcome = executor
            .execute(&action("u1", ActionKind::Update, Side::Source), &snapshots)
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Updated(Side::Source));
        assert_eq!(source.get("user", "u1").unwrap().payload["name"], "newer");
    }

    #[test]
    fn dry_run_never_writes() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, true);
        let snapshots = pair_with(vec![RecordSnapshot::new("u1")], vec![]);

        let outcome = executor
            .execute(&action("u1", ActionKind::Create, Side::Target), &snapshots)
            .unwrap();

        assert!(executor.is_dry_run());
        assert_eq!(outcome, ActionOutcome::Created(Side::Target));
        assert!(target.is_empty("user"));
        assert_eq!(target.write_count(), 0);
    }

    #[test]
    fn dry_run_apply_succeeds_on_closed_store() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        target.close().unwrap();
        let executor = SyncExecutor::new(&source, &target, true);

        let result = executor.apply(
            &action("u1", ActionKind::Create, Side::Target),
            &RecordSnapshot::new("u1"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn tie_is_skipped_without_lookup() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, false);

        let outcome = executor
            .execute(&action("ghost", ActionKind::NoopTie, Side::Target), &pair_with(vec![], vec![]))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(target.write_count(), 0);
    }

    #[test]
    fn apply_never_writes_a_tie() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, false);

        executor
            .apply(
                &action("u1", ActionKind::NoopTie, Side::Target),
                &RecordSnapshot::new("u1").with_updated_at(4),
            )
            .unwrap();
        assert!(target.get("user", "u1").is_none());
        assert_eq!(target.write_count(), 0);
    }

    #[test]
    fn missing_origin_record_fails_softly() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, false);

        let outcome = executor
            .execute(&action("ghost", ActionKind::Create, Side::Target), &pair_with(vec![], vec![]))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Failed);
    }

    #[test]
    fn write_failure_is_counted_not_raised() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        let executor = SyncExecutor::new(&source, &target, false);
        // An invalid model name makes the store refuse the write.
        let bad = SyncAction {
            model: "not a table".into(),
            record_id: "u1".into(),
            kind: ActionKind::Create,
            destination: Side::Target,
        };
        let snapshots = SnapshotPair::new(
            SnapshotSet::new("not a table", Side::Source, vec![RecordSnapshot::new("u1")]),
            SnapshotSet::empty("not a table", Side::Target),
        );

        let outcome = executor.execute(&bad, &snapshots).unwrap();
        assert_eq!(outcome, ActionOutcome::Failed);
    }

    #[test]
    fn connection_loss_is_fatal() {
        let source = MemoryStore::new("neon");
        let target = MemoryStore::new("local");
        target.disconnect();
        let executor = SyncExecutor::new(&source, &target, false);
        let snapshots = pair_with(vec![RecordSnapshot::new("u1")], vec![]);

        let err = executor
            .execute(&action("u1", ActionKind::Create, Side::Target), &snapshots)
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::ConnectionLost {
                side: Side::Target,
                source: StoreError::Closed,
                ..
            }
        ));
    }
}
