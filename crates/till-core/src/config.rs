//! # Checkout Configuration
//!
//! Per-register settings the core needs: tax rate, who is on the till,
//! cart limits, quick-cash denominations, and the display currency.
//!
//! The struct is plain serde so the register app can embed it as the
//! `[checkout]` table of its TOML file:
//!
//! ```toml
//! [checkout]
//! tax_rate_bps = 850          # 8.5%
//! cashier_id = "CASHIER-001"
//! terminal_id = "01"
//! max_cart_lines = 100
//! max_item_quantity = 999
//! cash_denominations = [1, 2, 5, 10, 20, 50, 100, 200, 500]
//! currency_code = "USD"
//! locale = "en-US"
//! ```

use serde::{Deserialize, Serialize};

use crate::cart::CartLimits;
use crate::error::ValidationError;
use crate::money::{CurrencyFormat, Money};
use crate::types::TaxRate;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Standard bills, in whole currency units.
pub const DEFAULT_CASH_DENOMINATIONS: [u32; 9] = [1, 2, 5, 10, 20, 50, 100, 200, 500];

/// Settings for one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Sales tax in basis points (850 = 8.5%).
    pub tax_rate_bps: u32,

    /// Stamped on every sale record. Not validated against any user store.
    pub cashier_id: String,

    /// Short terminal code used in receipt numbers (`YYYYMMDD-<terminal>-NNNN`).
    pub terminal_id: String,

    pub max_cart_lines: usize,

    pub max_item_quantity: i64,

    /// Bills offered by the quick-cash helper, in whole currency units.
    pub cash_denominations: Vec<u32>,

    pub currency_code: String,

    pub locale: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            tax_rate_bps: 850,
            cashier_id: "CASHIER-001".to_string(),
            terminal_id: "01".to_string(),
            max_cart_lines: MAX_CART_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
            cash_denominations: DEFAULT_CASH_DENOMINATIONS.to_vec(),
            currency_code: "USD".to_string(),
            locale: "en-US".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Checks every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tax_rate_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate_bps".to_string(),
                min: 0,
                max: 10_000,
            });
        }

        if self.cashier_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cashier_id".to_string(),
            });
        }

        let terminal = self.terminal_id.trim();
        if terminal.is_empty() {
            return Err(ValidationError::Required {
                field: "terminal_id".to_string(),
            });
        }
        if terminal.len() > 8 {
            return Err(ValidationError::TooLong {
                field: "terminal_id".to_string(),
                max: 8,
            });
        }
        if !terminal.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::invalid_format(
                "terminal_id",
                "only letters and digits are allowed",
            ));
        }

        if self.max_cart_lines == 0 {
            return Err(ValidationError::OutOfRange {
                field: "max_cart_lines".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }
        if self.max_item_quantity < 1 {
            return Err(ValidationError::OutOfRange {
                field: "max_item_quantity".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }

        if self.cash_denominations.is_empty() || self.cash_denominations.contains(&0) {
            return Err(ValidationError::invalid_format(
                "cash_denominations",
                "must be a non-empty list of positive amounts",
            ));
        }

        if self.currency_code.len() != 3 || !self.currency_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency_code",
                format!("'{}' is not an ISO 4217 code", self.currency_code),
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    pub fn limits(&self) -> CartLimits {
        CartLimits {
            max_lines: self.max_cart_lines,
            max_quantity: self.max_item_quantity,
        }
    }

    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::for_locale(&self.currency_code, &self.locale)
    }

    /// Denominations as Money, ascending, deduplicated.
    pub fn denominations(&self) -> Vec<Money> {
        let mut bills: Vec<Money> = self
            .cash_denominations
            .iter()
            .map(|d| Money::from_major_minor(*d as i64, 0))
            .collect();
        bills.sort();
        bills.dedup();
        bills
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
