//! Persistent route store.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteTable entries
//!     → load_entries (open → replace_all in one write txn → close)
//!
//! Per request:
//!     known paths
//!     → RouteStore::lookup (one read txn)
//!     → path → destination ("" when absent)
//! ```
//!
//! # Design Decisions
//! - Single-file redb database, one table named "MyBucket"
//! - A load replaces the whole table atomically, never upserts
//! - Every error is returned to the caller; nothing is discarded here
//! - The database file is created owner read/write only

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, TableDefinition, TableError};
use thiserror::Error;

/// The single bucket holding path → destination records.
pub const ROUTES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("MyBucket");

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("open store file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("open store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: redb::DatabaseError,
    },

    #[error("begin transaction: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("create bucket: {0}")]
    CreateBucket(#[source] TableError),

    #[error("open bucket: {0}")]
    OpenBucket(#[source] TableError),

    #[error("put key {key}: {source}")]
    Put {
        key: String,
        #[source]
        source: redb::StorageError,
    },

    #[error("get key {key}: {source}")]
    Get {
        key: String,
        #[source]
        source: redb::StorageError,
    },

    #[error("commit: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle to the route database.
///
/// Cloning is cheap; all clones share the same open database.
#[derive(Clone)]
pub struct RouteStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RouteStore {
    /// Open the database at `path`, creating the file if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(&path).map_err(|source| StoreError::OpenFile {
            path: path.clone(),
            source,
        })?;

        let db = Database::builder()
            .create_file(file)
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "Route store opened");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the entire bucket with `entries` in a single write transaction.
    ///
    /// Prior records are dropped; if any put fails nothing is committed.
    pub fn replace_all<'a, I>(&self, entries: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            txn.delete_table(ROUTES_TABLE)
                .map_err(StoreError::CreateBucket)?;
            let mut table = txn
                .open_table(ROUTES_TABLE)
                .map_err(StoreError::CreateBucket)?;

            for (key, value) in entries {
                table.insert(key, value).map_err(|source| StoreError::Put {
                    key: key.to_string(),
                    source,
                })?;
                written += 1;
            }
        }
        txn.commit()?;

        Ok(written)
    }

    /// Read the current destination for each path.
    ///
    /// Paths without a record map to an empty string, as do all paths when
    /// the bucket has never been written.
    pub fn lookup<'a, I>(&self, paths: I) -> Result<HashMap<String, String>, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(ROUTES_TABLE) {
            Ok(table) => Some(table),
            Err(TableError::TableDoesNotExist(_)) => None,
            Err(e) => return Err(StoreError::OpenBucket(e)),
        };

        let mut values = HashMap::new();
        for path in paths {
            let destination = match &table {
                Some(table) => table
                    .get(path)
                    .map_err(|source| StoreError::Get {
                        key: path.to_string(),
                        source,
                    })?
                    .map(|guard| guard.value().to_string())
                    .unwrap_or_default(),
                None => String::new(),
            };
            values.insert(path.to_string(), destination);
        }

        Ok(values)
    }
}

/// Write `entries` into the store at `path`, replacing whatever was there.
///
/// The database is opened for the duration of the call and closed before
/// returning, whether or not the write succeeded.
pub fn load_entries<'a, I>(path: impl AsRef<Path>, entries: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let store = RouteStore::open(path)?;
    let written = store.replace_all(entries)?;

    metrics::counter!("store_loads_total").increment(1);
    tracing::info!(
        path = %store.path().display(),
        entries = written,
        "Route entries loaded into store"
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [(&str, &str); 2] = [
        ("/dbpathname", "https://google.com"),
        ("/otherdbpath", "https://google.com/robots.txt"),
    ];

    #[test]
    fn test_load_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.db");

        assert_eq!(load_entries(&path, SEED).unwrap(), 2);

        let store = RouteStore::open(&path).unwrap();
        let values = store.lookup(["/dbpathname", "/otherdbpath"]).unwrap();
        assert_eq!(values["/dbpathname"], "https://google.com");
        assert_eq!(values["/otherdbpath"], "https://google.com/robots.txt");
    }

    #[test]
    fn test_missing_record_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::open(dir.path().join("routes.db")).unwrap();
        store.replace_all(SEED).unwrap();

        let values = store.lookup(["/dbpathname", "/unknown"]).unwrap();
        assert_eq!(values["/unknown"], "");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_lookup_before_any_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::open(dir.path().join("fresh.db")).unwrap();

        let values = store.lookup(["/dbpathname"]).unwrap();
        assert_eq!(values["/dbpathname"], "");
    }

    #[test]
    fn test_reload_replaces_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.db");

        load_entries(&path, SEED).unwrap();
        load_entries(&path, [("/dbpathname", "https://example.com")]).unwrap();

        let store = RouteStore::open(&path).unwrap();
        let values = store.lookup(["/dbpathname", "/otherdbpath"]).unwrap();
        assert_eq!(values["/dbpathname"], "https://example.com");
        assert_eq!(values["/otherdbpath"], "");
    }

    #[test]
    fn test_loading_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.db");

        load_entries(&path, SEED).unwrap();
        let first = RouteStore::open(&path)
            .unwrap()
            .lookup(SEED.iter().map(|(k, _)| *k))
            .unwrap();

        load_entries(&path, SEED).unwrap();
        let second = RouteStore::open(&path)
            .unwrap()
            .lookup(SEED.iter().map(|(k, _)| *k))
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().join("routes.db");

        let err = load_entries(&path, SEED).unwrap_err();
        assert!(matches!(err, StoreError::OpenFile { .. }));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.db");
        load_entries(&path, SEED).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
