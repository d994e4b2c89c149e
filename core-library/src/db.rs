//! # Artifact Store Connection
//!
//! Opens the SQLite database behind the subtitle cache and applies the
//! embedded migrations.
//!
//! File-backed stores run in WAL mode with `synchronous = NORMAL`. In-memory
//! stores are pinned to a single connection, because every SQLite
//! `:memory:` connection is its own database.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("subtitles.db")).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Where the artifact database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Connection settings for the artifact store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: StoreLocation,
    pub max_connections: u32,
    /// How long to wait for a free pooled connection
    pub acquire_timeout: Duration,
    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// A file-backed store, created on first use.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(database_path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A private store that disappears with the pool.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Ignored for in-memory stores.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = match &self.location {
            StoreLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            StoreLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };
        Ok(options.busy_timeout(self.busy_timeout))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        match self.location {
            StoreLocation::File(_) => SqlitePoolOptions::new()
                .max_connections(self.max_connections.max(1))
                .acquire_timeout(self.acquire_timeout),
            // The single connection must never be recycled or the data goes with it
            StoreLocation::Memory => SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .acquire_timeout(self.acquire_timeout)
                .max_lifetime(None)
                .idle_timeout(None),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Open the store, apply migrations and confirm the artifact table exists.
///
/// # Errors
///
/// - [`LibraryError::Database`] if the database cannot be opened
/// - [`LibraryError::Migration`] if a migration fails or the schema is missing
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(location = ?config.location, "Opening subtitle artifact store");

    let pool = config
        .pool_options()
        .connect_with(config.connect_options()?)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open artifact store");
            LibraryError::Database(e)
        })?;

    MIGRATOR.run(&pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        LibraryError::Migration(e.to_string())
    })?;
    debug!("Artifact store migrations applied");

    verify_schema(&pool).await?;

    info!(connections = pool.size(), "Subtitle artifact store ready");
    Ok(pool)
}

/// An in-memory store with migrations applied.
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let (tables,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'subtitle_artifacts'",
    )
    .fetch_one(pool)
    .await?;

    if tables == 0 {
        return Err(LibraryError::Migration(
            "subtitle_artifacts table missing after migration".to_string(),
        ));
    }
    Ok(())
}
