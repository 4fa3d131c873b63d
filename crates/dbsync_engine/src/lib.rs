//! # dbsync engine
//!
//! Record-level synchronization between two databases holding the same
//! models.
//!
//! This crate provides:
//! - Direction and connection configuration
//! - Dependency-checked model ordering
//! - Snapshot loading and id diffing
//! - Conflict resolution (blind mirror or last-write-wins merge)
//! - Per-record execution with fault isolation
//! - Run statistics and the final summary
//!
//! ## Run lifecycle
//!
//! A run moves through `Idle → Connecting → ProcessingModel* →
//! Disconnecting → Reported`. Configuration problems fail before any
//! connection is opened. A lost connection moves the run to `Failed`, and
//! both handles are released on every path.
//!
//! ## Key Invariants
//!
//! - Models are processed in dependency order, one at a time
//! - A failed record never stops the rest of its model
//! - A failed snapshot read skips only that model
//! - Equal timestamps are never overwritten in a merge
//! - Dry runs never write

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod diff;
mod error;
mod executor;
mod model;
mod resolver;
mod snapshot;
mod state;
mod stats;

pub use config::{ConnectionConfig, Side, SyncConfig, SyncDirection};
pub use connection::{Connector, StaticConnector, UrlConnector};
pub use diff::{diff, Diff};
pub use error::{SyncError, SyncResult};
pub use executor::{ActionOutcome, SyncExecutor};
pub use model::{ModelDescriptor, ModelOrder, DEFAULT_MODELS};
pub use resolver::{newer_side, resolve, ActionKind, SyncAction};
pub use snapshot::{load, SnapshotPair, SnapshotSet};
pub use state::{AlwaysConfirm, Confirm, RunPlan, RunState, SyncEngine};
pub use stats::{ModelReport, RunReport, SkippedModel, StatsAggregator, SyncStats, WriteCounts};
