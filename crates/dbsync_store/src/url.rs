//! Connection strings.

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;
use crate::store::RecordStore;
use std::fmt;
use std::path::PathBuf;

/// A parsed connection string.
///
/// Accepted forms:
/// - `memory://` or `memory://<label>` - a fresh, empty in-memory store
/// - `sqlite://<path>` or `file:<path>` - an existing SQLite database
/// - any other string without a scheme - treated as an SQLite file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    /// An ephemeral in-memory store.
    Memory {
        /// Label used in logs.
        label: String,
    },
    /// An SQLite database file.
    Sqlite(PathBuf),
}

impl StoreUrl {
    /// Parses a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] for empty strings, empty paths and
    /// schemes no bundled driver understands.
    pub fn parse(url: &str) -> StoreResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::InvalidUrl("connection string is empty".into()));
        }

        if let Some(rest) = url.strip_prefix("memory://") {
            let label = if rest.is_empty() { "memory" } else { rest };
            return Ok(StoreUrl::Memory {
                label: label.to_string(),
            });
        }

        let path = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("file:") {
            rest
        } else if let Some((scheme, _)) = url.split_once("://") {
            return Err(StoreError::InvalidUrl(format!(
                "unsupported scheme {scheme:?}"
            )));
        } else {
            url
        };

        if path.is_empty() {
            return Err(StoreError::InvalidUrl(format!("{url:?} has no path")));
        }
        Ok(StoreUrl::Sqlite(PathBuf::from(path)))
    }

    /// Opens a handle to the database this string points at.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the database cannot be opened.
    pub fn connect(&self) -> StoreResult<Box<dyn RecordStore>> {
        match self {
            StoreUrl::Memory { label } => Ok(Box::new(MemoryStore::new(label.clone()))),
            StoreUrl::Sqlite(path) => Ok(Box::new(SqliteStore::open(path)?)),
        }
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUrl::Memory { label } => write!(f, "memory://{label}"),
            StoreUrl::Sqlite(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

/// Parses `url` and opens the database it points at.
///
/// # Errors
///
/// Returns an error if the string is invalid or the connection fails.
pub fn open(url: &str) -> StoreResult<Box<dyn RecordStore>> {
    StoreUrl::parse(url)?.connect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_memory() {
        assert_eq!(
            StoreUrl::parse("memory://").unwrap(),
            StoreUrl::Memory {
                label: "memory".into()
            }
        );
        assert_eq!(
            StoreUrl::parse("memory://neon").unwrap(),
            StoreUrl::Memory {
                label: "neon".into()
            }
        );
    }

    #[test]
    fn parse_sqlite_forms() {
        let expected = StoreUrl::Sqlite(PathBuf::from("/var/lib/app.db"));
        assert_eq!(StoreUrl::parse("sqlite:///var/lib/app.db").unwrap(), expected);
        assert_eq!(StoreUrl::parse("file:/var/lib/app.db").unwrap(), expected);
        assert_eq!(StoreUrl::parse("/var/lib/app.db").unwrap(), expected);
        assert_eq!(StoreUrl::parse("  /var/lib/app.db\n").unwrap(), expected);
    }

    #[test]
    fn parse_rejects_bad_strings() {
        assert!(matches!(StoreUrl::parse(""), Err(StoreError::InvalidUrl(_))));
        assert!(matches!(StoreUrl::parse("   "), Err(StoreError::InvalidUrl(_))));
        assert!(matches!(
            StoreUrl::parse("sqlite://"),
            Err(StoreError::InvalidUrl(_))
        ));
        assert!(matches!(
            StoreUrl::parse("mysql://user@host/db"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn display_is_normalized() {
        let url = StoreUrl::parse("file:data/local.db").unwrap();
        assert_eq!(url.to_string(), "sqlite://data/local.db");
    }

    #[test]
    fn open_memory_and_missing_sqlite() {
        let store = open("memory://scratch").unwrap();
        assert_eq!(store.label(), "scratch");
        assert!(store.is_connected());

        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.db");
        let result = open(missing.to_str().unwrap());
        assert!(matches!(result, Err(StoreError::Connect { .. })));
    }
}
