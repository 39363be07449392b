//! # Register Error Type
//!
//! Unified error type for register commands and startup.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Operator                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  > add JACDA001 2                                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Session::execute                                                │  │
//! │  │  Result<String, RegisterError>                                   │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Checkout Error? ─── CoreError::NotReady ───── RegisterError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  error [NOT_READY]: Sale not ready to complete: $24.23 still owed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed command never ends the session; only startup errors do.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use till_core::{CoreError, StoreError, ValidationError};
use till_db::DbError;

/// Errors surfaced by the register.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// The config file parsed but a value is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    /// A known command with missing or malformed arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("No line {0} in the cart")]
    NoSuchLine(usize),
}

pub type RegisterResult<T> = Result<T, RegisterError>;

/// Machine-readable error codes, printed in front of every error message.
///
/// ## Example
/// ```text
/// error [VALIDATION_ERROR]: Invalid format for amount: ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,

    ValidationError,

    DatabaseError,

    /// Completion gate refused the sale.
    NotReady,

    CartError,

    PaymentError,

    /// The sale changed between prepare and commit.
    Conflict,

    ConfigError,

    IoError,

    UnknownCommand,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::NotReady => "NOT_READY",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::PaymentError => "PAYMENT_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RegisterError {
    pub fn config(message: impl Into<String>) -> Self {
        RegisterError::Config(message.into())
    }

    /// The code shown to the operator.
    pub fn code(&self) -> ErrorCode {
        match self {
            RegisterError::Core(err) => core_code(err),
            RegisterError::Db(DbError::NotFound { .. }) => ErrorCode::NotFound,
            RegisterError::Db(DbError::UniqueViolation { .. }) => ErrorCode::ValidationError,
            RegisterError::Db(_) => ErrorCode::DatabaseError,
            RegisterError::Config(_) | RegisterError::ConfigParse(_) => ErrorCode::ConfigError,
            RegisterError::Io(_) => ErrorCode::IoError,
            RegisterError::UnknownCommand(_) => ErrorCode::UnknownCommand,
            RegisterError::Usage(_) => ErrorCode::ValidationError,
            RegisterError::NoSuchLine(_) => ErrorCode::NotFound,
        }
    }
}

fn core_code(err: &CoreError) -> ErrorCode {
    match err {
        CoreError::ProductNotFound(_)
        | CoreError::SaleNotFound(_)
        | CoreError::LineItemNotFound(_) => ErrorCode::NotFound,
        CoreError::InvalidQuantity { .. }
        | CoreError::InvalidDiscount { .. }
        | CoreError::QuantityTooLarge { .. }
        | CoreError::Validation(_) => ErrorCode::ValidationError,
        CoreError::InactiveProduct(_)
        | CoreError::CartTooLarge { .. }
        | CoreError::AmountTooLarge { .. } => ErrorCode::CartError,
        CoreError::InvalidAmount { .. } | CoreError::CashNotAccepted => ErrorCode::PaymentError,
        CoreError::NotReady(_) => ErrorCode::NotReady,
        CoreError::StaleSale { .. } => ErrorCode::Conflict,
        CoreError::Store(StoreError::Duplicate(_)) => ErrorCode::Conflict,
        CoreError::Store(_) => ErrorCode::DatabaseError,
    }
}

impl From<ValidationError> for RegisterError {
    fn from(err: ValidationError) -> Self {
        RegisterError::Core(CoreError::Validation(err))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
