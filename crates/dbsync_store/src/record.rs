//! Record types shared by every store.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque column values of a record, excluding `id` and `updated_at`.
///
/// Key order and the exact text of numbers are kept as read, so a payload
/// is written back as the same JSON it was loaded from.
pub type Payload = serde_json::Map<String, Value>;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// One row of one model, as read from a store.
///
/// Only `id` and `updated_at` carry meaning for synchronization. The payload
/// is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Record identifier, unique within its model.
    pub id: String,
    /// Last modification time, if the row has one.
    pub updated_at: Option<Timestamp>,
    /// Remaining columns.
    #[serde(default)]
    pub payload: Payload,
}

impl RecordSnapshot {
    /// Creates a record with no timestamp and an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            updated_at: None,
            payload: Payload::new(),
        }
    }

    /// Sets the modification timestamp.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Sets one payload column.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// The timestamp used for last-write-wins comparison.
    ///
    /// A missing timestamp counts as the epoch.
    pub fn effective_updated_at(&self) -> Timestamp {
        self.updated_at.unwrap_or(0)
    }
}

/// Returns true if `name` can be used as a model (table) name.
///
/// Model names are plain identifiers: an ASCII letter or underscore followed
/// by letters, digits or underscores.
pub fn is_valid_model_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a model name, returning it unchanged.
pub fn check_model_name(name: &str) -> StoreResult<&str> {
    if is_valid_model_name(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidModelName(name.to_string()))
    }
}
