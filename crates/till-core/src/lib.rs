//! # till-core: Pure Pricing and Checkout Logic for Till
//!
//! This crate is the **heart** of Till. It prices carts, tracks tender and
//! turns a paid cart into an immutable sale record, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/register (operator console)                │   │
//! │  │    search ──► add/qty/discount ──► pay/enter/apply ──► complete │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  money  │ │ discount │ │  cart   │ │  tender  │ │checkout│ │   │
//! │  │   │  Money  │ │ Discount │ │  Cart   │ │  Tender  │ │ state  │ │   │
//! │  │   │ TaxRate │ │  resolve │ │ Totals  │ │  Session │ │machine │ │   │
//! │  │   └─────────┘ └──────────┘ └─────────┘ └──────────┘ └────────┘ │   │
//! │  │   ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌──────────┐            │   │
//! │  │   │  sale   │ │  ledger  │ │ catalog │ │  report  │            │   │
//! │  │   └─────────┘ └──────────┘ └─────────┘ └──────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO ASYNC                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │          SQLite catalog + sales ledger, migrations              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and half-up rounding
//! - [`discount`] - Flat and percentage discounts
//! - [`cart`] - Line items, cart limits and eagerly recomputed totals
//! - [`tender`] - Cash/card tender bookkeeping
//! - [`checkout`] - The checkout state machine
//! - [`sale`] - Immutable sale records and receipt numbers
//! - [`ledger`] - The sales ledger trait and an in-memory ledger
//! - [`catalog`] - Product lookup
//! - [`quick_cash`] - Cash keypad suggestions
//! - [`report`] - Sales summaries
//! - [`config`] - Checkout configuration
//! - [`error`] - Domain error types
//!
//! ## Ground Rules
//!
//! - Amounts are whole cents in an `i64`. Floats never touch money.
//! - A division rounds exactly once, half away from zero.
//! - Persistence is reached only through the [`SalesLedger`] and [`Catalog`] traits.
//!
//! ```rust
//! use till_core::{Money, TaxRate};
//!
//! // $10.99 at 8.25% is 90.6675 cents of tax
//! let tax = Money::from_cents(1099).calculate_tax(TaxRate::from_bps(825));
//! assert_eq!(tax.cents(), 91);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod discount;
pub mod error;
pub mod ledger;
pub mod money;
pub mod quick_cash;
pub mod report;
pub mod sale;
pub mod tender;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, CartLimits, CartTotals, LineItem};
pub use catalog::{Catalog, InMemoryCatalog};
pub use checkout::{Checkout, CheckoutState, PendingSale};
pub use config::CheckoutConfig;
pub use discount::{Discount, DiscountKind};
pub use error::{CoreError, CoreResult, NotReadyReason, StoreError, ValidationError};
pub use ledger::{DateRange, InMemoryLedger, SalesLedger};
pub use money::{CurrencyFormat, Money};
pub use report::{SalesSummary, TopProduct};
pub use sale::{ReceiptSequence, SaleLine, SaleRecord};
pub use tender::TenderSession;
pub use types::*;

// =============================================================================
// Limits
// =============================================================================

/// Default line limit per cart, overridable through
/// `CheckoutConfig::max_cart_lines`.
pub const MAX_CART_ITEMS: usize = 100;

/// Upper bound on one line's quantity. Catches 1000 keyed for 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
