//! # Tender Session
//!
//! Tracks how the customer is paying for the current cart.
//!
//! ## Typed vs Applied
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  keypad "20" ──► pending_entry = $20.00      (nothing paid yet)        │
//! │                        │                                                │
//! │                        │ apply_pending()  ← explicit operator action   │
//! │                        ▼                                                │
//! │                  cash_applied += $20.00                                │
//! │                  pending_entry = None                                  │
//! │                                                                         │
//! │  remaining_balance = max(0, total − cash_applied)                      │
//! │  change_due        = max(0, cash_applied − total)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Typing never commits funds. Only `apply_cash` and `apply_pending` grow
//! `cash_applied`.
//!
//! ## One Method Per Sale
//! A sale is paid by Cash or by Card, never both. Selecting Card discards
//! any cash applied so far, since the card terminal authorizes the full
//! total.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

/// Payment state for the sale in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderSession {
    method: Option<PaymentMethod>,
    cash_applied: Money,
    pending_entry: Option<Money>,
}

impl TenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    #[inline]
    pub fn cash_applied(&self) -> Money {
        self.cash_applied
    }

    #[inline]
    pub fn pending_entry(&self) -> Option<Money> {
        self.pending_entry
    }

    /// Selects the payment method.
    ///
    /// Switching to Card resets `cash_applied` to zero. Switching to Cash
    /// keeps whatever was already applied.
    pub fn select_method(&mut self, method: PaymentMethod) {
        if method == PaymentMethod::Card && !self.cash_applied.is_zero() {
            debug!(discarded = %self.cash_applied, "Card selected, discarding applied cash");
            self.cash_applied = Money::zero();
        }
        self.method = Some(method);
    }

    /// Commits `amount` of cash toward the total.
    ///
    /// ## Errors
    /// - `InvalidAmount` if `amount ≤ 0`
    /// - `CashNotAccepted` while Card is selected
    pub fn apply_cash(&mut self, amount: Money) -> CoreResult<Money> {
        if !amount.is_positive() {
            return Err(CoreError::invalid_amount(format!(
                "cash tender must be positive, got {amount}"
            )));
        }
        if self.method == Some(PaymentMethod::Card) {
            return Err(CoreError::CashNotAccepted);
        }
        let applied = self
            .cash_applied
            .checked_add(amount)
            .filter(Money::within_limit)
            .ok_or_else(|| {
                CoreError::invalid_amount(format!(
                    "{amount} would take cash tendered past {}",
                    Money::MAX_AMOUNT
                ))
            })?;
        self.cash_applied = applied;
        self.pending_entry = None;
        debug!(amount = %amount, applied = %self.cash_applied, "Applied cash");
        Ok(self.cash_applied)
    }

    /// Records a typed amount without applying it.
    ///
    /// Blank input clears the entry. Unparseable input leaves the previous
    /// entry untouched and returns the parse error.
    pub fn set_pending_entry(&mut self, typed: &str) -> CoreResult<Option<Money>> {
        if typed.trim().is_empty() {
            self.pending_entry = None;
            return Ok(None);
        }
        let amount = Money::from_decimal_str(typed)?;
        self.pending_entry = Some(amount);
        Ok(self.pending_entry)
    }

    pub fn clear_pending_entry(&mut self) {
        self.pending_entry = None;
    }

    /// Applies the typed amount, as if the operator pressed "Apply".
    ///
    /// ## Errors
    /// `InvalidAmount` when nothing (or a non-positive amount) is pending.
    pub fn apply_pending(&mut self) -> CoreResult<Money> {
        let amount = self
            .pending_entry
            .ok_or_else(|| CoreError::invalid_amount("no amount entered"))?;
        self.apply_cash(amount)
    }

    /// Resets `cash_applied` to zero. The method stays selected.
    pub fn clear_applied_cash(&mut self) {
        self.cash_applied = Money::zero();
    }

    /// `max(0, total − cash_applied)`
    pub fn remaining_balance(&self, total: Money) -> Money {
        (total - self.cash_applied).non_negative()
    }

    /// `max(0, cash_applied − total)`
    pub fn change_due(&self, total: Money) -> Money {
        (self.cash_applied - total).non_negative()
    }

    /// True when the selected method covers `total`.
    ///
    /// Card always covers; Cash covers once nothing remains.
    pub fn covers(&self, total: Money) -> bool {
        match self.method {
            Some(PaymentMethod::Card) => true,
            Some(PaymentMethod::Cash) => self.remaining_balance(total).is_zero(),
            None => false,
        }
    }

    /// Back to no method, nothing applied, nothing typed.
    pub fn reset(&mut self) {
        *self = TenderSession::default();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
