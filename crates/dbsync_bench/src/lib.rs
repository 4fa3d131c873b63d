//! Benchmark support for dbsync.

pub mod utils;
