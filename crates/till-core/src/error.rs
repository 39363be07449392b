//! # Error Types
//!
//! What can go wrong while ringing up a sale.
//!
//! ```text
//! ValidationError ──┐
//! NotReadyReason ───┼──► CoreError ──► RegisterError ──► "error [CODE]: ..."
//! StoreError ───────┘        ▲
//!      ▲                     │
//!      └── DbError (till-db) ┘
//! ```
//!
//! Messages carry the offending value (SKU, id, amount). Any operation that
//! returns an error has left the cart and the tender as they were.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Rejections from the cart, the tender and the checkout state machine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A quantity below 1 was set directly on a line item.
    ///
    /// ## When This Occurs
    /// - `LineItem::set_quantity(0)`
    /// - `Cart::add_item(product, 0)`
    ///
    /// Increment/decrement clamp at 1 and never raise this.
    #[error("Invalid quantity {requested}: must be at least 1")]
    InvalidQuantity { requested: i64 },

    /// Discount rejected at construction or when attached.
    ///
    /// ## When This Occurs
    /// - Flat amount ≤ 0
    /// - Percentage outside (0, 100]
    /// - Discount attached to a cart or line whose base is already 0
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// Non-positive cash tender amount.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// `complete()` called while the checkout cannot complete.
    #[error("Sale not ready to complete: {0}")]
    NotReady(NotReadyReason),

    /// The sales ledger refused the append. Cart and tender are unchanged.
    #[error("Sales ledger error: {0}")]
    Store(#[from] StoreError),

    #[error("No product matches {0}")]
    ProductNotFound(String),

    /// Product exists but is not for sale.
    #[error("Product {0} is inactive")]
    InactiveProduct(String),

    #[error("No recorded sale matches {0}")]
    SaleNotFound(String),

    /// No line item with this id in the cart.
    #[error("Line item not found: {0}")]
    LineItemNotFound(String),

    #[error("Cart is full ({max} lines)")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} is above the per-line limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The cart's gross would pass the largest amount a sale may carry.
    #[error("Cart total would pass the {limit} limit")]
    AmountTooLarge { limit: Money },

    /// Cash applied while Card is the selected method.
    #[error("Cash cannot be applied while card payment is selected")]
    CashNotAccepted,

    /// A prepared sale no longer matches the cart it was built from.
    #[error("Pending sale {sale_id} is stale: the cart changed after it was prepared")]
    StaleSale { sale_id: String },

    #[error("Bad input: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_discount(reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscount {
            reason: reason.into(),
        }
    }

    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Not Ready Reason
// =============================================================================

/// Why `can_complete()` is false.
///
/// Checked in this order, so the first failing condition is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotReadyReason {
    #[error("cart is empty")]
    EmptyCart,

    #[error("no payment method selected")]
    NoPaymentMethod,

    #[error("{remaining} still owed")]
    InsufficientCash { remaining: Money },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`SalesLedger`](crate::ledger::SalesLedger) backend.
///
/// Surfaced verbatim to the caller. The core never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Persistence is temporarily unreachable (disk, pool, network).
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A record with this id is already in the ledger.
    #[error("sale {0} already recorded")]
    Duplicate(String),

    /// Any other backend failure.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Operator or config input that could not be turned into a domain value.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Required { field: String },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    /// Inclusive bounds.
    #[error("{field} must lie in {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Unparseable amount, percentage, date or id.
    #[error("{field} could not be read: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
