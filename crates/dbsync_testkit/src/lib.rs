//! # dbsync testkit
//!
//! Test utilities for dbsync.
//!
//! This crate provides:
//! - Seeded in-memory stores and temporary SQLite databases
//! - A fault-injecting store for failure-path tests
//! - Property-based generators for records and snapshots
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dbsync_testkit::prelude::*;
//!
//! #[test]
//! fn merge_copies_missing_rows() {
//!     let source = seeded_store("neon", "user", &[record("u1", 10)]);
//!     // ... run a sync against `source`
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
