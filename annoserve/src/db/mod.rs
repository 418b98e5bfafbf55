//! Store adapter for the local credential/permission database.
//!
//! The store is a single SQLite file. SQLite happily (and silently) creates a
//! fresh empty database when asked to open a missing file, so every operation
//! goes through [`Store::acquire`], which checks that the configured file
//! actually exists first. A missing store fails the request, never the
//! process.

pub mod errors;
pub mod handlers;

use std::path::{Path, PathBuf};

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;

use crate::errors::{Error, Result};

/// Handle on the credential/permission store.
///
/// Each operation acquires a scoped connection, performs its statements, and
/// releases the connection on every exit path. No connection is held across
/// requests.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Store {
    /// Open the store backing file lazily. The pool never creates the file:
    /// a missing store must surface as [`Error::StoreUnavailable`], not as a
    /// silently created empty database.
    pub fn open(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().max_connections(5).connect_lazy_with(options);

        Self {
            pool,
            path: Some(path.to_path_buf()),
        }
    }

    /// Wrap an existing pool (in-memory databases, test harness pools).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, path: None }
    }

    /// Whether the store backing file is present. Pools without a backing
    /// file (in-memory) are always considered available.
    pub fn is_available(&self) -> bool {
        self.path.as_deref().is_none_or(Path::is_file)
    }

    /// Acquire a scoped connection, failing closed when the store is missing.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        if !self.is_available() {
            return Err(Error::StoreUnavailable);
        }
        self.pool.acquire().await.map_err(|e| {
            tracing::error!("failed to acquire store connection: {e}");
            Error::StoreUnavailable
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
