//! # dbsync Store
//!
//! Database handles for dbsync.
//!
//! This crate provides the boundary between the sync engine and the
//! databases it reconciles. A store is an **opaque record container** with
//! two data operations: read every record of a model, and upsert one record
//! by id.
//!
//! ## Design Principles
//!
//! - Stores only interpret `id` and `updated_at`; payloads pass through
//! - Upserts are idempotent (create if absent, overwrite if present)
//! - Must be `Send + Sync`
//! - No knowledge of sync directions, diffs or statistics
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral runs
//! - [`SqliteStore`] - For SQLite database files
//!
//! ## Example
//!
//! ```rust
//! use dbsync_store::{MemoryStore, RecordSnapshot, RecordStore};
//!
//! let store = MemoryStore::new("local");
//! store.upsert("ticket", &RecordSnapshot::new("t1").with_field("title", "Printer jam")).unwrap();
//! let records = store.read_all("ticket").unwrap();
//! assert_eq!(records[0].payload["title"], "Printer jam");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod record;
mod sqlite;
mod store;
mod url;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryContents, MemoryStore};
pub use record::{check_model_name, is_valid_model_name, Payload, RecordSnapshot, Timestamp};
pub use sqlite::SqliteStore;
pub use store::RecordStore;
pub use url::{open, StoreUrl};
