//! Error types for the sync engine.

use crate::config::Side;
use dbsync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that end a sync run.
///
/// Record-level and model-level failures never surface here; they are
/// counted in the run report instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configured model order is unusable.
    #[error("invalid model order: {0}")]
    InvalidModelOrder(String),

    /// A database could not be reached at the start of the run.
    #[error("failed to connect to {side} database: {source}")]
    Connect {
        /// Which database failed.
        side: Side,
        /// Driver error.
        source: StoreError,
    },

    /// A database connection dropped in the middle of the run.
    #[error("lost connection to {side} database while syncing {model}: {source}")]
    ConnectionLost {
        /// Which database dropped.
        side: Side,
        /// Model being processed at the time.
        model: String,
        /// Driver error.
        source: StoreError,
    },

    /// The operator declined to start a live run.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a model order error.
    pub fn model_order(message: impl Into<String>) -> Self {
        Self::InvalidModelOrder(message.into())
    }

    /// Returns true if the run never got past setup.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_) | SyncError::InvalidModelOrder(_) | SyncError::Connect { .. }
        )
    }
}
