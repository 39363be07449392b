//! # Checkout State Machine
//!
//! Owns the cart and the tender session for one register and is the only
//! thing allowed to mint a [`SaleRecord`].
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              begin_payment / select_method / apply_cash                 │
//! │   ┌──────────┐  (cart non-empty)   ┌──────────────────┐                │
//! │   │ Building │ ──────────────────► │ AwaitingPayment  │                │
//! │   └──────────┘ ◄────────────────── └──────────────────┘                │
//! │        ▲         cart emptied           │          │                    │
//! │        │         (tender reset)         │          │                    │
//! │        │                      complete()│          │cancel()            │
//! │        │                                ▼          ▼                    │
//! │        │                         ┌───────────┐ ┌───────────┐           │
//! │        └──── fresh cart ──────── │ Completed │ │ Cancelled │           │
//! │              + fresh tender      └───────────┘ └───────────┘           │
//! │                                                                         │
//! │  Completed and Cancelled are passed through, never rested in.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completing Against An Async Store
//! `complete()` works with any synchronous [`SalesLedger`]. When the store
//! is async (SQLite, network), split it in two so the durable write can be
//! awaited outside the core:
//!
//! ```rust,ignore
//! let pending = checkout.prepare_sale()?;           // pure, nothing changes
//! store.append(pending.record()).await?;            // durable write
//! let record = checkout.commit(pending)?;           // reset for next sale
//! ```
//!
//! If the append fails the checkout is untouched and the operator can
//! retry. If the cart or tender changed between prepare and commit, the
//! commit is refused with `StaleSale`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cart::{Cart, CartTotals};
use crate::config::CheckoutConfig;
use crate::discount::Discount;
use crate::error::{CoreError, CoreResult, NotReadyReason};
use crate::ledger::SalesLedger;
use crate::money::Money;
use crate::quick_cash::suggest_cash_amounts;
use crate::sale::{ReceiptSequence, SaleContext, SaleRecord};
use crate::tender::TenderSession;
use crate::types::{PaymentMethod, Product};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Items are being scanned; no payment activity yet.
    Building,
    /// A payment method was chosen or cash was applied.
    AwaitingPayment,
    /// Transient: a sale was recorded.
    Completed,
    /// Transient: the sale was abandoned.
    Cancelled,
}

/// A sale built from the current checkout, waiting for the store to
/// acknowledge it.
#[derive(Debug, Clone)]
pub struct PendingSale {
    record: SaleRecord,
    revision: u64,
}

impl PendingSale {
    #[inline]
    pub fn record(&self) -> &SaleRecord {
        &self.record
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One register's in-progress sale.
#[derive(Debug, Clone)]
pub struct Checkout {
    config: CheckoutConfig,
    cart: Cart,
    tender: TenderSession,
    state: CheckoutState,
    receipts: ReceiptSequence,
    /// Bumped on every successful cart or tender mutation.
    revision: u64,
}

impl Checkout {
    /// Creates a checkout in the `Building` state.
    ///
    /// ## Errors
    /// `Validation` if the config is invalid.
    pub fn new(config: CheckoutConfig) -> CoreResult<Self> {
        config.validate()?;
        let cart = Cart::new(config.tax_rate(), config.limits());
        Ok(Checkout {
            config,
            cart,
            tender: TenderSession::new(),
            state: CheckoutState::Building,
            receipts: ReceiptSequence::new(),
            revision: 0,
        })
    }

    /// Continues receipt numbering from an existing sequence.
    pub fn with_receipt_sequence(mut self, receipts: ReceiptSequence) -> Self {
        self.receipts = receipts;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    #[inline]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    #[inline]
    pub fn tender(&self) -> &TenderSession {
        &self.tender
    }

    #[inline]
    pub fn totals(&self) -> &CartTotals {
        self.cart.totals()
    }

    #[inline]
    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn remaining_balance(&self) -> Money {
        self.tender.remaining_balance(self.cart.totals().total)
    }

    pub fn change_due(&self) -> Money {
        self.tender.change_due(self.cart.totals().total)
    }

    /// Candidate cash amounts for the remaining balance.
    pub fn quick_cash(&self) -> Vec<Money> {
        suggest_cash_amounts(self.remaining_balance(), &self.config.denominations())
    }

    /// The first reason completion is blocked, if any.
    pub fn readiness(&self) -> Result<(), NotReadyReason> {
        if self.cart.is_empty() {
            return Err(NotReadyReason::EmptyCart);
        }
        match self.tender.method() {
            None => Err(NotReadyReason::NoPaymentMethod),
            Some(PaymentMethod::Card) => Ok(()),
            Some(PaymentMethod::Cash) => {
                let remaining = self.remaining_balance();
                if remaining.is_zero() {
                    Ok(())
                } else {
                    Err(NotReadyReason::InsufficientCash { remaining })
                }
            }
        }
    }

    /// `cart non-empty ∧ method selected ∧ (Card ∨ remaining == 0)`
    pub fn can_complete(&self) -> bool {
        self.readiness().is_ok()
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<String> {
        let id = self.cart.add_item(product, quantity)?;
        self.touched();
        Ok(id)
    }

    /// Silent no-op for unknown ids.
    pub fn remove_item(&mut self, item_id: &str) {
        if self.cart.remove_item(item_id).is_some() {
            self.touched();
        }
    }

    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        let before = self.cart.revision();
        self.cart.set_quantity(item_id, quantity)?;
        if self.cart.revision() != before {
            self.touched();
        }
        Ok(())
    }

    pub fn increment(&mut self, item_id: &str) -> CoreResult<i64> {
        let quantity = self.cart.increment(item_id)?;
        self.touched();
        Ok(quantity)
    }

    /// Decrementing a line already at 1 changes nothing, so an outstanding
    /// `PendingSale` stays valid.
    pub fn decrement(&mut self, item_id: &str) -> CoreResult<i64> {
        let before = self.cart.revision();
        let quantity = self.cart.decrement(item_id)?;
        if self.cart.revision() != before {
            self.touched();
        }
        Ok(quantity)
    }

    pub fn set_item_discount(&mut self, item_id: &str, discount: Option<Discount>) -> CoreResult<()> {
        self.cart.set_item_discount(item_id, discount)?;
        self.touched();
        Ok(())
    }

    pub fn set_cart_discount(&mut self, discount: Option<Discount>) -> CoreResult<()> {
        self.cart.set_cart_discount(discount)?;
        self.touched();
        Ok(())
    }

    /// Empties the cart without cancelling the checkout.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.touched();
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Moves to `AwaitingPayment` if the cart has items. No-op otherwise.
    pub fn begin_payment(&mut self) -> CheckoutState {
        if self.state == CheckoutState::Building && !self.cart.is_empty() {
            self.transition(CheckoutState::AwaitingPayment);
        }
        self.state
    }

    pub fn select_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.require_items()?;
        self.begin_payment();
        self.tender.select_method(method);
        debug!(%method, "Payment method selected");
        self.touched();
        Ok(())
    }

    /// Applies cash, returning the cumulative amount applied.
    pub fn apply_cash(&mut self, amount: Money) -> CoreResult<Money> {
        self.require_items()?;
        let applied = self.tender.apply_cash(amount)?;
        self.begin_payment();
        self.touched();
        Ok(applied)
    }

    /// Records typed input without committing it.
    pub fn set_pending_entry(&mut self, typed: &str) -> CoreResult<Option<Money>> {
        self.tender.set_pending_entry(typed)
    }

    pub fn apply_pending(&mut self) -> CoreResult<Money> {
        self.require_items()?;
        let applied = self.tender.apply_pending()?;
        self.begin_payment();
        self.touched();
        Ok(applied)
    }

    pub fn clear_applied_cash(&mut self) {
        self.tender.clear_applied_cash();
        self.touched();
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Builds the sale record for the current cart without changing anything.
    ///
    /// ## Errors
    /// `NotReady` unless `can_complete()`.
    pub fn prepare_sale(&self) -> CoreResult<PendingSale> {
        self.prepare_sale_at(Utc::now())
    }

    /// Same as [`prepare_sale`](Self::prepare_sale) with an explicit clock.
    pub fn prepare_sale_at(&self, now: DateTime<Utc>) -> CoreResult<PendingSale> {
        if let Err(reason) = self.readiness() {
            warn!(%reason, "Completion rejected");
            return Err(CoreError::NotReady(reason));
        }
        let method = match self.tender.method() {
            Some(method) => method,
            None => return Err(CoreError::NotReady(NotReadyReason::NoPaymentMethod)),
        };

        let receipt_number = self.receipts.peek(&self.config.terminal_id, now);
        let record = SaleRecord::snapshot(
            &self.cart,
            &self.tender,
            method,
            SaleContext {
                cashier_id: &self.config.cashier_id,
                terminal_id: &self.config.terminal_id,
                receipt_number: &receipt_number,
                created_at: now,
            },
        );

        Ok(PendingSale {
            record,
            revision: self.revision,
        })
    }

    /// Finalizes a prepared sale once the store has acknowledged it.
    ///
    /// ## Errors
    /// `StaleSale` if the checkout changed since `prepare_sale`.
    pub fn commit(&mut self, pending: PendingSale) -> CoreResult<SaleRecord> {
        if pending.revision != self.revision {
            return Err(CoreError::StaleSale {
                sale_id: pending.record.id,
            });
        }

        let record = pending.record;
        self.receipts
            .issue(&self.config.terminal_id, record.created_at);

        self.transition(CheckoutState::Completed);
        info!(
            id = %record.id,
            receipt = %record.receipt_number,
            total = %record.total,
            method = %record.payment_method,
            change = %record.change_given,
            "Sale completed"
        );
        self.reset();
        Ok(record)
    }

    /// Records the sale in `ledger` and resets for the next customer.
    ///
    /// ## Errors
    /// - `NotReady` unless `can_complete()`; nothing changes
    /// - `Store` if the ledger refuses the append; nothing changes
    pub fn complete<L: SalesLedger + ?Sized>(&mut self, ledger: &mut L) -> CoreResult<SaleRecord> {
        let pending = self.prepare_sale()?;
        if let Err(e) = ledger.append(pending.record()) {
            warn!(error = %e, id = %pending.record.id, "Ledger append failed, sale kept open");
            return Err(e.into());
        }
        self.commit(pending)
    }

    /// Abandons the sale. No record is written.
    ///
    /// Cancelling a fresh checkout changes nothing.
    pub fn cancel(&mut self) {
        if self.cart.is_empty()
            && self.cart.cart_discount().is_none()
            && self.tender == TenderSession::default()
            && self.state == CheckoutState::Building
        {
            return;
        }
        self.transition(CheckoutState::Cancelled);
        info!(lines = self.cart.items().len(), "Sale cancelled");
        self.reset();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_items(&self) -> CoreResult<()> {
        if self.cart.is_empty() {
            return Err(CoreError::NotReady(NotReadyReason::EmptyCart));
        }
        Ok(())
    }

    /// Called after every successful mutation.
    fn touched(&mut self) {
        self.revision += 1;
        if self.state == CheckoutState::AwaitingPayment && self.cart.is_empty() {
            self.tender.reset();
            self.transition(CheckoutState::Building);
        }
    }

    fn reset(&mut self) {
        self.cart = Cart::new(self.config.tax_rate(), self.config.limits());
        self.tender.reset();
        self.revision += 1;
        self.transition(CheckoutState::Building);
    }

    fn transition(&mut self, to: CheckoutState) {
        if self.state != to {
            debug!(from = ?self.state, to = ?to, "Checkout state change");
            self.state = to;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
