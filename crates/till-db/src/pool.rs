//! # Store Handle
//!
//! Opens the SQLite file behind the catalog and the sales ledger.
//!
//! ## Write Path of a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    What "appended" means                                │
//! │                                                                         │
//! │  SaleRepository::append                                                │
//! │       │  BEGIN; INSERT sales; INSERT sale_lines ...; COMMIT             │
//! │       ▼                                                                 │
//! │  WAL file (journal_mode = WAL, always)                                 │
//! │       │                                                                 │
//! │       ├── Durability::Full   → fsync before COMMIT returns             │
//! │       │                        (append Ok = survives power loss)       │
//! │       │                                                                 │
//! │       └── Durability::Normal → fsync at checkpoint only                │
//! │                                (append Ok = survives a crash,          │
//! │                                 may roll back on power loss)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A register only ever has one writer, so the pool stays small.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

/// Path that selects a private in-memory store.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Durability
// =============================================================================

/// How hard SQLite works to keep an acknowledged commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// `synchronous = FULL`.
    #[default]
    Full,
    /// `synchronous = NORMAL`.
    Normal,
}

impl Durability {
    pub fn from_flag(durable: bool) -> Self {
        if durable {
            Durability::Full
        } else {
            Durability::Normal
        }
    }

    fn synchronous(self) -> SqliteSynchronous {
        match self {
            Durability::Full => SqliteSynchronous::Full,
            Durability::Normal => SqliteSynchronous::Normal,
        }
    }

    /// Value `PRAGMA synchronous` reports for this setting.
    pub const fn pragma_value(self) -> i64 {
        match self {
            Durability::Full => 2,
            Durability::Normal => 1,
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives and how it is opened.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/till/till.db")
///     .max_connections(2)
///     .durable_writes(true);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open, or [`IN_MEMORY_PATH`].
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// How long a query waits for a free connection.
    pub acquire_timeout: Duration,

    pub durability: Durability,

    /// Apply pending migrations on open.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            durability: Durability::Full,
            migrate: true,
        }
    }

    /// A private store that disappears with the pool. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            durability: Durability::Normal,
            ..DbConfig::new(IN_MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// Shorthand for `durability(Durability::from_flag(durable))`.
    pub fn durable_writes(self, durable: bool) -> Self {
        self.durability(Durability::from_flag(durable))
    }

    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(self.durability.synchronous())
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout);

        if self.is_in_memory() {
            // The database lives only as long as its single connection.
            options.min_connections(1).max_lifetime(None).idle_timeout(None)
        } else {
            options
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            durability = ?config.durability,
            "Opening till store"
        );

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool connected");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Escape hatch for queries the repositories don't cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// The `synchronous` level a connection actually runs with.
    pub async fn durability(&self) -> DbResult<Durability> {
        let level: i64 = sqlx::query_scalar("PRAGMA synchronous")
            .fetch_one(&self.pool)
            .await?;
        Ok(if level >= Durability::Full.pragma_value() {
            Durability::Full
        } else {
            Durability::Normal
        })
    }

    /// Closes every connection. Later calls fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing till store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
