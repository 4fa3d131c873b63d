//! Error types for record store operations.

use thiserror::Error;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection string could not be understood.
    #[error("invalid connection string: {0}")]
    InvalidUrl(String),

    /// The database could not be reached or opened.
    #[error("failed to connect to {target}: {message}")]
    Connect {
        /// The database that was being opened.
        target: String,
        /// Driver message.
        message: String,
    },

    /// The connection dropped while the store was in use.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// The model name is not a plain identifier.
    #[error("invalid model name: {0:?}")]
    InvalidModelName(String),

    /// The database has no table for the model.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The store refused a write (constraint violation, injected fault, ...).
    #[error("write rejected for {model}/{id}: {reason}")]
    Rejected {
        /// Model name.
        model: String,
        /// Record identifier.
        id: String,
        /// Why the write was refused.
        reason: String,
    },

    /// A stored payload is not a JSON object.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// An SQLite driver error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Returns true if the error means the handle is no longer usable.
    ///
    /// The sync engine treats these as fatal for the whole run; every other
    /// error stays local to the record or model that produced it.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            StoreError::ConnectionLost(_) | StoreError::Closed => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::SystemIoFailure
                    | rusqlite::ErrorCode::NotADatabase
            ),
            _ => false,
        }
    }

    /// Creates a rejected-write error.
    pub fn rejected(model: &str, id: &str, reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            model: model.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
