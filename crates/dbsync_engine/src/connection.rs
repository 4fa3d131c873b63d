//! Opening and releasing the two database handles.

use crate::config::Side;
use crate::error::{SyncError, SyncResult};
use dbsync_store::{RecordStore, StoreResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens a database handle from a connection string.
///
/// This trait keeps the engine independent of drivers, allowing the CLI to
/// open real databases and tests to hand in prepared stores.
pub trait Connector {
    /// Opens the database for `side`.
    fn connect(&self, side: Side, url: &str) -> StoreResult<Box<dyn RecordStore>>;
}

/// Opens databases with the drivers bundled in `dbsync_store`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlConnector;

impl Connector for UrlConnector {
    fn connect(&self, _side: Side, url: &str) -> StoreResult<Box<dyn RecordStore>> {
        dbsync_store::open(url)
    }
}

/// A connector that hands out pre-built stores, ignoring the urls.
///
/// The stores stay shared with the caller, who can inspect them after a run.
#[derive(Clone)]
pub struct StaticConnector {
    source: Arc<dyn RecordStore>,
    target: Arc<dyn RecordStore>,
}

impl StaticConnector {
    /// Creates a connector over two shared stores.
    pub fn new(source: Arc<dyn RecordStore>, target: Arc<dyn RecordStore>) -> Self {
        Self { source, target }
    }
}

impl Connector for StaticConnector {
    fn connect(&self, side: Side, _url: &str) -> StoreResult<Box<dyn RecordStore>> {
        let store = match side {
            Side::Source => Arc::clone(&self.source),
            Side::Target => Arc::clone(&self.target),
        };
        Ok(Box::new(store))
    }
}

/// An open handle that is closed when dropped.
///
/// Every exit path of a run, including early returns on fatal errors,
/// releases the connection.
pub(crate) struct ConnectionGuard {
    side: Side,
    store: Box<dyn RecordStore>,
    open: bool,
}

impl ConnectionGuard {
    /// Connects one side.
    pub(crate) fn connect(connector: &dyn Connector, side: Side, url: &str) -> SyncResult<Self> {
        let store = connector
            .connect(side, url)
            .map_err(|source| SyncError::Connect { side, source })?;
        debug!(side = side.as_str(), store = store.label(), "connected");
        Ok(Self {
            side,
            store,
            open: true,
        })
    }

    pub(crate) fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Closes the handle. Failures are logged, never raised.
    pub(crate) fn disconnect(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.store.close() {
            Ok(()) => debug!(side = self.side.as_str(), "disconnected"),
            Err(e) => warn!(side = self.side.as_str(), error = %e, "error while disconnecting"),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.disconnect();
    }
}
