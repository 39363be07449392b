//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary, so
//! a register never needs the source tree to create or upgrade its store.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, sales, sale_lines
//! ```
//!
//! Applied versions are tracked by sqlx in `_sqlx_migrations`. Files are
//! append-only: a shipped migration is never edited, a new one is added
//! with the next number.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a store's schema is behind the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migrations compiled into this binary.
    pub embedded: usize,
    /// Migrations recorded as applied in the store.
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies every pending migration. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking schema version");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// Reads the applied count. A store that was never migrated reports zero.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: Option<i64> = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_optional(pool)
        .await
        .unwrap_or(None);

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied.and_then(|n| usize::try_from(n).ok()).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_unmigrated_store_reports_behind() {
        let db = Database::new(DbConfig::in_memory().skip_migrations()).await.unwrap();
        let status = migration_status(db.pool()).await.unwrap();
        assert_eq!(status.applied, 0);
        assert!(!status.is_current());

        run_migrations(db.pool()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        assert!(migration_status(db.pool()).await.unwrap().is_current());
    }
}
