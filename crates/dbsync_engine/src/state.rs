//! Sync run state machine.

use crate::config::{ConnectionConfig, Side, SyncConfig, SyncDirection};
use crate::connection::{ConnectionGuard, Connector};
use crate::error::{SyncError, SyncResult};
use crate::executor::SyncExecutor;
use crate::model::{ModelDescriptor, ModelOrder};
use crate::resolver::resolve;
use crate::snapshot::{load, SnapshotPair, SnapshotSet};
use crate::stats::{ModelReport, RunReport, SkippedModel, StatsAggregator, SyncStats};
use dbsync_store::RecordStore;
use parking_lot::RwLock;
use std::time::Instant;
use tracing::{info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Not started.
    Idle,
    /// Opening both databases.
    Connecting,
    /// Working on one model.
    ProcessingModel {
        /// Position in the model order.
        index: usize,
        /// Model name.
        model: String,
    },
    /// Releasing both databases.
    Disconnecting,
    /// Finished; a report was produced.
    Reported,
    /// Ended on a fatal error.
    Failed,
}

impl RunState {
    /// Returns true while the run holds connections.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Connecting | RunState::ProcessingModel { .. } | RunState::Disconnecting
        )
    }

    /// Returns true if a run can be started from this state.
    pub fn can_start(&self) -> bool {
        !self.is_active()
    }
}

/// What the operator is asked to approve before a live run.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan<'a> {
    /// Direction of the run.
    pub direction: SyncDirection,
    /// Whether writes are simulated.
    pub dry_run: bool,
    /// Models that will be processed.
    pub models: &'a ModelOrder,
}

impl RunPlan<'_> {
    /// Sides that will receive writes.
    pub fn written_sides(&self) -> Vec<Side> {
        match self.direction.origin() {
            Some(origin) => vec![origin.opposite()],
            None => vec![Side::Source, Side::Target],
        }
    }
}

/// Approves or declines a live run.
pub trait Confirm {
    /// Returns true to proceed.
    fn confirm(&self, plan: &RunPlan<'_>) -> bool;
}

/// Approves every run. Used for `--force` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _plan: &RunPlan<'_>) -> bool {
        true
    }
}

impl<F> Confirm for F
where
    F: Fn(&RunPlan<'_>) -> bool,
{
    fn confirm(&self, plan: &RunPlan<'_>) -> bool {
        self(plan)
    }
}

/// Result of processing one model.
enum ModelOutcome {
    Synced(ModelReport),
    Skipped(SkippedModel),
}

/// Runs a full synchronization between two databases.
///
/// Models are processed one at a time in the configured order. Within a
/// model, a failed record is counted and the next record is attempted; a
/// model whose snapshot cannot be read is skipped. Only configuration
/// problems and lost connections end the run early.
pub struct SyncEngine<C: Connector> {
    config: SyncConfig,
    connections: ConnectionConfig,
    connector: C,
    state: RwLock<RunState>,
}

impl<C: Connector> SyncEngine<C> {
    /// Creates a new engine.
    pub fn new(config: SyncConfig, connections: ConnectionConfig, connector: C) -> Self {
        Self {
            config,
            connections,
            connector,
            state: RwLock::new(RunState::Idle),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> RunState {
        self.state.read().clone()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn set_state(&self, state: RunState) {
        *self.state.write() = state;
    }

    /// The plan shown to the operator before a live run.
    pub fn plan(&self) -> RunPlan<'_> {
        RunPlan {
            direction: self.config.direction,
            dry_run: self.config.dry_run,
            models: &self.config.models,
        }
    }

    /// Runs without asking for confirmation.
    ///
    /// # Errors
    ///
    /// See [`SyncEngine::run_with_confirmation`].
    pub fn run(&self) -> SyncResult<RunReport> {
        self.run_with_confirmation(&AlwaysConfirm)
    }

    /// Runs after `confirm` approves the plan. Dry runs are never gated.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Config`] or [`SyncError::InvalidModelOrder`] before any I/O
    /// - [`SyncError::Cancelled`] if the plan was declined
    /// - [`SyncError::Connect`] if either database cannot be opened
    /// - [`SyncError::ConnectionLost`] if a connection drops mid-run
    pub fn run_with_confirmation(&self, confirm: &dyn Confirm) -> SyncResult<RunReport> {
        if !self.state().can_start() {
            return Err(SyncError::config(format!(
                "a run is already in progress ({:?})",
                self.state()
            )));
        }

        self.config.models.validate()?;
        self.connections.validate()?;

        if !self.config.dry_run && !confirm.confirm(&self.plan()) {
            info!("sync declined by operator");
            return Err(SyncError::Cancelled);
        }

        let start = Instant::now();
        info!(
            direction = %self.config.direction,
            dry_run = self.config.dry_run,
            models = self.config.models.len(),
            "starting sync"
        );

        self.set_state(RunState::Connecting);
        let (mut source, mut target) = match self.connect_both() {
            Ok(guards) => guards,
            Err(e) => {
                warn!(error = %e, "connection failed");
                self.set_state(RunState::Failed);
                return Err(e);
            }
        };

        let mut aggregator = StatsAggregator::new(self.config.direction, self.config.dry_run);
        let mut fatal = None;

        for (index, model) in self.config.models.iter().enumerate() {
            self.set_state(RunState::ProcessingModel {
                index,
                model: model.name().to_string(),
            });
            match self.sync_model(model, source.store(), target.store()) {
                Ok(ModelOutcome::Synced(report)) => aggregator.record_model(report),
                Ok(ModelOutcome::Skipped(skipped)) => aggregator.skip_model(skipped),
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            }
        }

        self.set_state(RunState::Disconnecting);
        source.disconnect();
        target.disconnect();

        if let Some(e) = fatal {
            warn!(error = %e, "sync aborted");
            self.set_state(RunState::Failed);
            return Err(e);
        }

        let report = aggregator.finish(start.elapsed());
        self.set_state(RunState::Reported);
        info!(
            created = report.totals.created,
            updated = report.totals.updated,
            skipped = report.totals.skipped,
            errors = report.totals.errors,
            "sync finished"
        );
        Ok(report)
    }

    fn connect_both(&self) -> SyncResult<(ConnectionGuard, ConnectionGuard)> {
        let source = ConnectionGuard::connect(
            &self.connector,
            Side::Source,
            self.connections.url(Side::Source),
        )?;
        // If this fails, dropping `source` closes it.
        let target = ConnectionGuard::connect(
            &self.connector,
            Side::Target,
            self.connections.url(Side::Target),
        )?;
        Ok((source, target))
    }

    fn load_side(
        &self,
        store: &dyn RecordStore,
        model: &str,
        side: Side,
    ) -> SyncResult<Result<SnapshotSet, SkippedModel>> {
        match load(store, model, side) {
            Ok(set) => Ok(Ok(set)),
            Err(e) if e.is_connection_loss() => Err(SyncError::ConnectionLost {
                side,
                model: model.to_string(),
                source: e,
            }),
            Err(e) => {
                warn!(model, side = side.as_str(), error = %e, "skipping model, snapshot read failed");
                Ok(Err(SkippedModel {
                    model: model.to_string(),
                    side,
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn sync_model(
        &self,
        model: &ModelDescriptor,
        source: &dyn RecordStore,
        target: &dyn RecordStore,
    ) -> SyncResult<ModelOutcome> {
        let name = model.name();

        let source_set = match self.load_side(source, name, Side::Source)? {
            Ok(set) => set,
            Err(skipped) => return Ok(ModelOutcome::Skipped(skipped)),
        };
        let target_set = match self.load_side(target, name, Side::Target)? {
            Ok(set) => set,
            Err(skipped) => return Ok(ModelOutcome::Skipped(skipped)),
        };
        info!(
            model = name,
            source_records = source_set.len(),
            target_records = target_set.len(),
            "records found"
        );

        let pair = SnapshotPair::new(source_set, target_set);
        let actions = resolve(self.config.direction, &pair);
        let executor = SyncExecutor::new(source, target, self.config.dry_run);

        let mut stats = SyncStats::default();
        for action in &actions {
            stats.record(executor.execute(action, &pair)?);
        }

        info!(
            model = name,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            errors = stats.errors,
            "model synced"
        );
        Ok(ModelOutcome::Synced(ModelReport {
            model: name.to_string(),
            source_records: pair.source.len(),
            target_records: pair.target.len(),
            stats,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::StaticConnector;
    use dbsync_store::{MemoryStore, RecordSnapshot, StoreError, StoreResult};
    use std::cell::Cell;
    use std::sync::Arc;

    struct Fixture {
        source: Arc<MemoryStore>,
        target: Arc<MemoryStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                source: Arc::new(MemoryStore::new("neon")),
                target: Arc::new(MemoryStore::new("local")),
            }
        }

        fn engine(&self, config: SyncConfig) -> SyncEngine<StaticConnector> {
            SyncEngine::new(
                config,
                ConnectionConfig::new("memory://neon", "memory://local"),
                StaticConnector::new(self.source.clone(), self.target.clone()),
            )
        }
    }

    struct RefuseTarget {
        source: Arc<MemoryStore>,
    }

    impl Connector for RefuseTarget {
        fn connect(&self, side: Side, url: &str) -> StoreResult<Box<dyn RecordStore>> {
            match side {
                Side::Source => Ok(Box::new(self.source.clone())),
                Side::Target => Err(StoreError::Connect {
                    target: url.to_string(),
                    message: "connection refused".into(),
                }),
            }
        }
    }

    #[test]
    fn run_state_checks() {
        assert!(RunState::Idle.can_start());
        assert!(RunState::Reported.can_start());
        assert!(RunState::Failed.can_start());
        assert!(!RunState::Connecting.can_start());
        assert!(RunState::ProcessingModel {
            index: 0,
            model: "user".into()
        }
        .is_active());
    }

    #[test]
    fn engine_initial_state() {
        let fixture = Fixture::new();
        let engine = fixture.engine(SyncConfig::new(SyncDirection::PushToTarget));
        assert_eq!(engine.state(), RunState::Idle);
    }

    #[test]
    fn successful_run_ends_reported_and_disconnected() {
        let fixture = Fixture::new();
        fixture
            .source
            .insert("user", RecordSnapshot::new("u1").with_updated_at(1));
        let engine = fixture.engine(SyncConfig::new(SyncDirection::PushToTarget));

        let report = engine.run().unwrap();

        assert_eq!(engine.state(), RunState::Reported);
        assert_eq!(report.totals.created, 1);
        assert_eq!(report.models.len(), 6);
        assert!(!fixture.source.is_connected());
        assert!(!fixture.target.is_connected());
    }

    #[test]
    fn connect_failure_is_fatal_and_releases_source() {
        let source = Arc::new(MemoryStore::new("neon"));
        let engine = SyncEngine::new(
            SyncConfig::new(SyncDirection::BidirectionalMerge),
            ConnectionConfig::new("memory://neon", "memory://local"),
            RefuseTarget {
                source: source.clone(),
            },
        );

        let err = engine.run().unwrap_err();
        assert!(matches!(err, SyncError::Connect { side: Side::Target, .. }));
        assert_eq!(engine.state(), RunState::Failed);
        assert!(!source.is_connected());
    }

    #[test]
    fn invalid_connection_config_fails_before_connecting() {
        let fixture = Fixture::new();
        let engine = SyncEngine::new(
            SyncConfig::new(SyncDirection::PushToTarget),
            ConnectionConfig::new("", "memory://"),
            StaticConnector::new(fixture.source.clone(), fixture.target.clone()),
        );

        let err = engine.run().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert_eq!(engine.state(), RunState::Idle);
        assert!(fixture.source.is_connected());
    }

    #[test]
    fn declined_confirmation_does_not_connect() {
        let fixture = Fixture::new();
        let engine = fixture.engine(SyncConfig::new(SyncDirection::PushToTarget));
        let asked = Cell::new(false);
        let decline = |plan: &RunPlan<'_>| {
            asked.set(true);
            assert_eq!(plan.written_sides(), vec![Side::Target]);
            false
        };

        let err = engine.run_with_confirmation(&decline).unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert!(asked.get());
        assert_eq!(engine.state(), RunState::Idle);
        assert!(fixture.source.is_connected());
    }

    #[test]
    fn dry_run_skips_confirmation() {
        let fixture = Fixture::new();
        let engine = fixture.engine(SyncConfig::new(SyncDirection::PushToTarget).with_dry_run(true));
        let never = |_: &RunPlan<'_>| -> bool { panic!("dry runs must not ask") };
        assert!(engine.run_with_confirmation(&never).is_ok());
    }

    #[test]
    fn connection_loss_mid_run_is_fatal() {
        let fixture = Fixture::new();
        fixture.source.insert("user", RecordSnapshot::new("u1"));
        fixture.target.disconnect();
        let engine = fixture.engine(SyncConfig::new(SyncDirection::PushToTarget));

        let err = engine.run().unwrap_err();
        assert!(matches!(
            err,
            SyncError::ConnectionLost {
                side: Side::Target,
                ..
            }
        ));
        assert_eq!(engine.state(), RunState::Failed);
        assert!(!fixture.source.is_connected());
    }

    #[test]
    fn merge_plan_writes_both_sides() {
        let fixture = Fixture::new();
        let engine = fixture.engine(SyncConfig::new(SyncDirection::BidirectionalMerge));
        assert_eq!(engine.plan().written_sides(), vec![Side::Source, Side::Target]);
    }
}
