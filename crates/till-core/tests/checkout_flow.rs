//! End-to-end checkout flows through the public API only.

use std::sync::Arc;

use tokio::sync::Mutex;

use till_core::{
    Catalog, Checkout, CheckoutConfig, CheckoutState, CoreError, Discount, InMemoryCatalog,
    InMemoryLedger, Money, NotReadyReason, PaymentMethod, Product, SaleRecord, SalesLedger,
    SalesSummary, StoreError,
};

// =============================================================================
// Fixtures
// =============================================================================

fn product(id: &str, name: &str, cents: i64) -> Product {
    Product {
        id: id.to_string(),
        sku: format!("SKU-{id}"),
        barcode: None,
        name: name.to_string(),
        brand: "House".to_string(),
        category: "Spirits".to_string(),
        price: Money::from_cents(cents),
        cost: Some(Money::from_cents(cents / 2)),
        is_active: true,
    }
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        product("jd", "Jack Daniel's Old No. 7", 2499),
        product("bv", "Buffalo Trace", 5000),
        product("ice", "Party Ice 7lb", 299),
    ])
}

/// 8.5% tax, the default config.
fn checkout() -> Checkout {
    Checkout::new(CheckoutConfig::default()).unwrap()
}

// =============================================================================
// Worked Examples
// =============================================================================

#[test]
fn two_bottles_with_tax() {
    let catalog = catalog();
    let mut checkout = checkout();
    let jd = catalog.get("jd").unwrap();
    checkout.add_item(&jd, 2).unwrap();

    let totals = checkout.totals();
    assert_eq!(totals.subtotal.cents(), 4998);
    assert_eq!(totals.tax.cents(), 425);
    assert_eq!(totals.total.cents(), 5423);
}

#[test]
fn ten_percent_cart_discount() {
    let mut checkout = checkout();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout
        .set_cart_discount(Some(Discount::parse("percent", "10").unwrap()))
        .unwrap();

    let totals = checkout.totals();
    assert_eq!(totals.cart_discount.cents(), 500);
    assert_eq!(totals.taxable.cents(), 4498);
    assert_eq!(totals.tax.cents(), 382);
    assert_eq!(totals.total.cents(), 4880);
}

#[test]
fn flat_discount_capped_at_line() {
    let mut checkout = checkout();
    let id = checkout.add_item(&product("bv", "BT", 5000), 1).unwrap();
    checkout
        .set_item_discount(&id, Some(Discount::flat(Money::from_cents(7500)).unwrap()))
        .unwrap();

    let line = checkout.cart().find(&id).unwrap();
    assert_eq!(line.discount_amount().cents(), 5000);
    assert_eq!(line.net_total(), Money::zero());
    assert_eq!(checkout.totals().total, Money::zero());
}

#[test]
fn split_cash_tender_makes_change() {
    let mut checkout = checkout();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout.select_method(PaymentMethod::Cash).unwrap();

    checkout.apply_cash(Money::from_cents(2000)).unwrap();
    checkout.apply_cash(Money::from_cents(4000)).unwrap();

    assert_eq!(checkout.tender().cash_applied().cents(), 6000);
    assert_eq!(checkout.remaining_balance(), Money::zero());
    assert_eq!(checkout.change_due().cents(), 577);
    assert!(checkout.can_complete());
}

#[test]
fn card_completes_without_cash() {
    let mut checkout = checkout();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout.select_method(PaymentMethod::Card).unwrap();
    assert!(checkout.can_complete());
}

#[test]
fn short_cash_is_not_ready_and_cart_survives() {
    let mut checkout = checkout();
    let mut ledger = InMemoryLedger::new();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout.select_method(PaymentMethod::Cash).unwrap();
    checkout.apply_cash(Money::from_cents(3000)).unwrap();

    let err = checkout.complete(&mut ledger).unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotReady(NotReadyReason::InsufficientCash { remaining }) if remaining.cents() == 2423
    ));
    assert!(ledger.is_empty());
    assert_eq!(checkout.totals().total.cents(), 5423);

    checkout.add_item(&product("ice", "Ice", 299), 1).unwrap();
    assert_eq!(checkout.cart().items().len(), 2);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn completion_gate_matches_definition() {
    let methods = [None, Some(PaymentMethod::Cash), Some(PaymentMethod::Card)];
    let cash_amounts = [0, 1000, 5423, 9000];

    for with_items in [false, true] {
        for method in methods {
            for cash in cash_amounts {
                let mut checkout = checkout();
                if with_items {
                    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
                }
                if cash > 0 {
                    let _ = checkout.apply_cash(Money::from_cents(cash));
                }
                if let Some(method) = method {
                    let _ = checkout.select_method(method);
                }

                let expected = with_items
                    && match method {
                        None => false,
                        Some(PaymentMethod::Card) => true,
                        Some(PaymentMethod::Cash) => checkout.remaining_balance().is_zero(),
                    };
                assert_eq!(
                    checkout.can_complete(),
                    expected,
                    "items={with_items} method={method:?} cash={cash}"
                );
            }
        }
    }
}

#[test]
fn totals_never_negative() {
    let mut checkout = checkout();
    let a = checkout.add_item(&product("a", "A", 1), 3).unwrap();
    checkout
        .set_item_discount(&a, Some(Discount::flat(Money::from_cents(1_000_000)).unwrap()))
        .unwrap();
    checkout.add_item(&product("b", "B", 7), 1).unwrap();
    checkout
        .set_cart_discount(Some(Discount::percentage_bps(10_000).unwrap()))
        .unwrap();

    let totals = checkout.totals();
    assert!(!totals.total.is_negative());
    assert!(!totals.tax.is_negative());
    assert_eq!(totals.total, Money::zero());
}

#[test]
fn cancel_on_fresh_checkout_is_noop() {
    let mut checkout = checkout();
    checkout.cancel();
    assert!(checkout.cart().is_empty());
    assert_eq!(checkout.state(), CheckoutState::Building);
}

#[test]
fn completed_sales_feed_the_report() {
    let catalog = catalog();
    let mut checkout = checkout();
    let mut ledger = InMemoryLedger::new();

    checkout.add_item(&catalog.get("jd").unwrap(), 2).unwrap();
    checkout.select_method(PaymentMethod::Card).unwrap();
    let first = checkout.complete(&mut ledger).unwrap();

    let hits = catalog.search("buffalo");
    checkout.add_item(&hits[0], 1).unwrap();
    checkout.select_method(PaymentMethod::Cash).unwrap();
    checkout.apply_cash(Money::from_cents(6000)).unwrap();
    let second = checkout.complete(&mut ledger).unwrap();

    assert_ne!(first.receipt_number, second.receipt_number);

    let summary = SalesSummary::for_day(&ledger, first.sale_date(), 3);
    assert_eq!(summary.sale_count, 2);
    assert_eq!(summary.gross_sales, first.total + second.total);
    assert_eq!(summary.card_count, 1);
    assert_eq!(summary.cash_count, 1);
    assert_eq!(summary.top_products[0].product_id, "jd");
}

// =============================================================================
// Two-Phase Completion Against An Async Store
// =============================================================================

/// Async store double that can be told to fail.
#[derive(Clone, Default)]
struct AsyncStore {
    inner: Arc<Mutex<InMemoryLedger>>,
    offline: Arc<Mutex<bool>>,
}

impl AsyncStore {
    async fn append(&self, record: &SaleRecord) -> Result<(), StoreError> {
        if *self.offline.lock().await {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        tokio::task::yield_now().await;
        self.inner.lock().await.append(record)
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[tokio::test]
async fn two_phase_commit_after_durable_append() {
    let store = AsyncStore::default();
    let mut checkout = checkout();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout.select_method(PaymentMethod::Card).unwrap();

    let pending = checkout.prepare_sale().unwrap();
    // Nothing changes until commit
    assert_eq!(checkout.state(), CheckoutState::AwaitingPayment);

    store.append(pending.record()).await.unwrap();
    let record = checkout.commit(pending).unwrap();

    assert_eq!(store.len().await, 1);
    assert_eq!(store.inner.lock().await.get(&record.id).unwrap(), record);
    assert!(checkout.cart().is_empty());
}

#[tokio::test]
async fn failed_append_keeps_sale_open_for_retry() {
    let store = AsyncStore::default();
    let mut checkout = checkout();
    checkout.add_item(&product("jd", "JD", 2499), 2).unwrap();
    checkout.select_method(PaymentMethod::Card).unwrap();

    *store.offline.lock().await = true;
    let pending = checkout.prepare_sale().unwrap();
    assert!(store.append(pending.record()).await.is_err());
    assert_eq!(checkout.cart().items().len(), 1);
    assert_eq!(store.len().await, 0);

    *store.offline.lock().await = false;
    let pending = checkout.prepare_sale().unwrap();
    store.append(pending.record()).await.unwrap();
    let record = checkout.commit(pending).unwrap();
    assert!(record.receipt_number.ends_with("-0001"));
    assert_eq!(store.len().await, 1);
}
