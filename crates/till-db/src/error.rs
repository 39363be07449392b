//! # Store Errors
//!
//! `DbError` is what the repositories return. It narrows to the core's
//! [`StoreError`] when a failure has to reach the checkout, and the register
//! turns either one into an error code for the operator.
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError (Duplicate / Unavailable / Backend)
//!                    └──────► RegisterError ("error [DATABASE_ERROR]: ...")
//! ```

use thiserror::Error;
use till_core::StoreError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second product with the same SKU, or a sale id/receipt number
    /// that was already appended.
    #[error("{field} '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The file could not be opened, or the pool was closed.
    #[error("Store unavailable: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored row no longer decodes into a domain value.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },

    #[error("Timed out waiting for a store connection")]
    PoolExhausted,

    #[error("Store error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(table: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::CorruptRow {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Retrying the same operation later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_) | DbError::PoolExhausted)
    }
}

/// SQLite reports constraint failures only through the message text:
/// `UNIQUE constraint failed: sales.receipt_number`,
/// `FOREIGN KEY constraint failed`.
fn from_constraint_message(message: &str) -> DbError {
    if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
        return DbError::duplicate(columns, "(existing row)");
    }
    if message.starts_with("FOREIGN KEY constraint failed") {
        return DbError::ForeignKeyViolation {
            message: message.to_string(),
        };
    }
    DbError::QueryFailed(message.to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => from_constraint_message(db_err.message()),
            sqlx::Error::RowNotFound => DbError::not_found("Row", "(query)"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("store is closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::corrupt("(row)", format!("column {index}: {source}"))
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// ```text
/// UniqueViolation                     → Duplicate    (retry won't help)
/// ConnectionFailed / PoolExhausted    → Unavailable  (retry may help)
/// everything else                     → Backend
/// ```
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, .. } => StoreError::Duplicate(field),
            other if other.is_transient() => StoreError::Unavailable(other.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_messages() {
        assert!(matches!(
            from_constraint_message("UNIQUE constraint failed: sales.receipt_number"),
            DbError::UniqueViolation { field, .. } if field == "sales.receipt_number"
        ));
        assert!(matches!(
            from_constraint_message("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            from_constraint_message("no such table: salez"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            StoreError::from(DbError::duplicate("sales.id", "abc")),
            StoreError::Duplicate("sales.id".to_string())
        );
        assert!(matches!(
            StoreError::from(DbError::PoolExhausted),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(DbError::corrupt("sales", "bad method")),
            StoreError::Backend(_)
        ));
    }
}
