//! Configuration for sync runs.

use crate::error::{SyncError, SyncResult};
use crate::model::ModelOrder;
use dbsync_store::StoreUrl;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// One of the two databases in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// The source database.
    Source,
    /// The target database.
    Target,
}

impl Side {
    /// Returns the other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Source => Side::Target,
            Side::Target => Side::Source,
        }
    }

    /// Returns the lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How records flow during a run. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Mirror the source into the target.
    PushToTarget,
    /// Mirror the target back into the source.
    PullFromSource,
    /// Reconcile both sides, newer `updated_at` wins.
    BidirectionalMerge,
}

impl SyncDirection {
    /// All directions, in CLI order.
    pub const ALL: [SyncDirection; 3] = [
        SyncDirection::PushToTarget,
        SyncDirection::PullFromSource,
        SyncDirection::BidirectionalMerge,
    ];

    /// The name used on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            SyncDirection::PushToTarget => "neon-to-local",
            SyncDirection::PullFromSource => "local-to-neon",
            SyncDirection::BidirectionalMerge => "both-ways",
        }
    }

    /// The side records are copied from in a one-directional run.
    ///
    /// Returns `None` for a merge, where both sides are origins.
    pub fn origin(self) -> Option<Side> {
        match self {
            SyncDirection::PushToTarget => Some(Side::Source),
            SyncDirection::PullFromSource => Some(Side::Target),
            SyncDirection::BidirectionalMerge => None,
        }
    }

    /// Returns true for the one-directional mirror modes.
    pub fn is_one_way(self) -> bool {
        self.origin().is_some()
    }

    /// Short description for the run summary.
    pub fn describe(self) -> &'static str {
        match self {
            SyncDirection::PushToTarget => "source -> target",
            SyncDirection::PullFromSource => "target -> source",
            SyncDirection::BidirectionalMerge => "bidirectional merge",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for SyncDirection {
    type Err = SyncError;

    fn from_str(s: &str) -> SyncResult<Self> {
        SyncDirection::ALL
            .into_iter()
            .find(|direction| direction.cli_name() == s)
            .ok_or_else(|| {
                SyncError::config(format!(
                    "unknown direction {s:?}, expected one of neon-to-local, local-to-neon, both-ways"
                ))
            })
    }
}

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Direction of the run.
    pub direction: SyncDirection,
    /// Compute and log actions without writing.
    pub dry_run: bool,
    /// Models to process, in order.
    pub models: ModelOrder,
}

impl SyncConfig {
    /// Creates a live configuration over the default model order.
    pub fn new(direction: SyncDirection) -> Self {
        Self {
            direction,
            dry_run: false,
            models: ModelOrder::default_order(),
        }
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the model order.
    pub fn with_models(mut self, models: ModelOrder) -> Self {
        self.models = models;
        self
    }
}

/// Connection strings for the two databases.
///
/// The engine treats them as opaque; they are handed to a
/// [`Connector`](crate::Connector) when the run starts.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Source database connection string.
    pub source_url: String,
    /// Target database connection string.
    pub target_url: String,
}

impl ConnectionConfig {
    /// Creates a connection configuration.
    pub fn new(source_url: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            target_url: target_url.into(),
        }
    }

    /// Returns the connection string for one side.
    pub fn url(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source_url,
            Side::Target => &self.target_url,
        }
    }

    /// Checks both strings before any connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if either string is empty or malformed,
    /// or if both point at the same database.
    pub fn validate(&self) -> SyncResult<()> {
        let mut parsed = Vec::with_capacity(2);
        for side in [Side::Source, Side::Target] {
            let url = StoreUrl::parse(self.url(side))
                .map_err(|e| SyncError::config(format!("{side} database: {e}")))?;
            parsed.push(url);
        }
        if let [StoreUrl::Sqlite(source), StoreUrl::Sqlite(target)] = parsed.as_slice() {
            if normalized(source) == normalized(target) {
                return Err(SyncError::config(
                    "source and target point at the same database",
                ));
            }
        }
        Ok(())
    }
}

/// Resolves a database path for comparison; falls back to dropping `.`
/// components when the file does not exist yet.
fn normalized(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        path.components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect()
    })
}

// Connection strings may embed credentials.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("source_url", &"<redacted>")
            .field("target_url", &"<redacted>")
            .finish()
    }
}
