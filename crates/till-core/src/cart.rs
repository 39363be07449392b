//! # Cart Module
//!
//! Line items, the cart that owns them, and the derived totals.
//!
//! ## Recompute On Every Mutation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Totals Pipeline                                 │
//! │                                                                         │
//! │  LineItem: gross = unit_price × qty                                    │
//! │            net   = gross − resolve(item discount, gross)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal        = Σ net                                               │
//! │  cart discount   = resolve(cart discount, subtotal)   (≤ subtotal)     │
//! │  taxable         = subtotal − cart discount                            │
//! │  tax             = round_half_up(taxable × rate)                       │
//! │  total           = max(0, taxable + tax)                               │
//! │                                                                         │
//! │  add / remove / set qty / discount / clear ──► recompute() ──► totals  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating method validates first and mutates second, so an `Err`
//! always means the cart is exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::Discount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// ## Snapshot Pattern
/// SKU, name, unit price and unit cost are frozen when the product is first
/// added. Later catalog edits never change an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: String,
    product_id: String,
    sku: String,
    name: String,
    unit_price: Money,
    unit_cost: Option<Money>,
    quantity: i64,
    discount: Option<Discount>,
}

impl LineItem {
    /// Creates a line for `quantity` units of `product`.
    ///
    /// ## Errors
    /// `InvalidQuantity` if `quantity < 1`.
    pub fn new(product: &Product, quantity: i64) -> CoreResult<Self> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { requested: quantity });
        }
        Ok(LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            unit_cost: product.cost,
            quantity,
            discount: None,
        })
    }

    /// Sets the quantity directly.
    ///
    /// Removal on zero is the cart's job, so zero is an error here.
    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { requested: quantity });
        }
        self.quantity = quantity;
        Ok(())
    }

    pub fn set_discount(&mut self, discount: Option<Discount>) {
        self.discount = discount;
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    #[inline]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    #[inline]
    pub fn unit_cost(&self) -> Option<Money> {
        self.unit_cost
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    #[inline]
    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// `unit_price × quantity`
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.mul_by_int(self.quantity)
    }

    /// The item discount resolved against `gross`.
    pub fn discount_amount(&self) -> Money {
        self.discount
            .as_ref()
            .map(|d| d.resolve(self.gross()))
            .unwrap_or_default()
    }

    /// `gross − discount_amount`, never negative.
    pub fn net_total(&self) -> Money {
        self.gross() - self.discount_amount()
    }
}

// =============================================================================
// Limits & Totals
// =============================================================================

/// Guard rails against runaway carts (typing 1000 instead of 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLimits {
    pub max_lines: usize,
    pub max_quantity: i64,
}

impl Default for CartLimits {
    fn default() -> Self {
        CartLimits {
            max_lines: MAX_CART_ITEMS,
            max_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

/// Derived amounts, recomputed after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Number of distinct lines.
    pub item_count: usize,
    /// Sum of quantities across lines.
    pub total_quantity: i64,
    /// Σ gross, before any discount.
    pub gross: Money,
    /// Σ item discount amounts.
    pub line_discount_total: Money,
    /// Σ net.
    pub subtotal: Money,
    /// Cart discount resolved against the subtotal.
    pub cart_discount: Money,
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The order being built.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product merges)
/// - Every quantity is in `1..=limits.max_quantity`
/// - `totals` always reflects the current items and discounts
/// - `totals.cart_discount ≤ totals.subtotal` and `totals.total ≥ 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
    cart_discount: Option<Discount>,
    tax_rate: TaxRate,
    limits: CartLimits,
    totals: CartTotals,
    /// Bumped on every successful mutation.
    revision: u64,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new(tax_rate: TaxRate, limits: CartLimits) -> Self {
        Cart {
            items: Vec::new(),
            cart_discount: None,
            tax_rate,
            limits,
            totals: CartTotals::default(),
            revision: 0,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lines in insertion (display) order.
    #[inline]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn find(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_by_product(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    #[inline]
    pub fn cart_discount(&self) -> Option<&Discount> {
        self.cart_discount.as_ref()
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    #[inline]
    pub fn limits(&self) -> CartLimits {
        self.limits
    }

    #[inline]
    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// Returns the id of the line that now holds the product.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `InactiveProduct` for a product that is not for sale
    /// - `QuantityTooLarge` if the merged quantity exceeds the limit
    /// - `CartTooLarge` if a new line would exceed the line limit
    /// - `AmountTooLarge` if the cart gross would pass `Money::MAX_AMOUNT`
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<String> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { requested: quantity });
        }
        if !product.is_active {
            return Err(CoreError::InactiveProduct(product.id.clone()));
        }
        if product.price.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "price".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let max_quantity = self.limits.max_quantity;

        if let Some(index) = self.items.iter().position(|i| i.product_id == product.id) {
            let merged = self.items[index].quantity.saturating_add(quantity);
            if merged > max_quantity {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: max_quantity,
                });
            }
            let id = self.items[index].id.clone();
            self.check_gross(Some(&id), self.items[index].unit_price, merged)?;
            self.items[index].quantity = merged;
            debug!(item_id = %id, sku = %product.sku, quantity = merged, "Merged into existing line");
            self.touch();
            return Ok(id);
        }

        if quantity > max_quantity {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: max_quantity,
            });
        }
        if self.items.len() >= self.limits.max_lines {
            return Err(CoreError::CartTooLarge {
                max: self.limits.max_lines,
            });
        }
        self.check_gross(None, product.price, quantity)?;

        let item = LineItem::new(product, quantity)?;
        let id = item.id.clone();
        debug!(item_id = %id, sku = %product.sku, quantity, "Added line");
        self.items.push(item);
        self.touch();
        Ok(id)
    }

    /// Removes a line. Unknown ids are a silent no-op.
    ///
    /// The cart discount is kept even if this empties the cart, so items
    /// added afterwards get the same discount.
    pub fn remove_item(&mut self, item_id: &str) -> Option<LineItem> {
        let index = self.items.iter().position(|i| i.id == item_id)?;
        let removed = self.items.remove(index);
        debug!(item_id, sku = %removed.sku, "Removed line");
        self.touch();
        Some(removed)
    }

    /// Sets a line's quantity. `quantity < 1` removes the line instead.
    ///
    /// ## Errors
    /// - `LineItemNotFound` for an unknown id (when not removing)
    /// - `QuantityTooLarge` above the limit
    /// - `AmountTooLarge` if the cart gross would pass `Money::MAX_AMOUNT`
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            self.remove_item(item_id);
            return Ok(());
        }
        if quantity > self.limits.max_quantity {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: self.limits.max_quantity,
            });
        }
        let unit_price = self.line(item_id)?.unit_price;
        self.check_gross(Some(item_id), unit_price, quantity)?;
        self.item_mut(item_id)?.set_quantity(quantity)?;
        debug!(item_id, quantity, "Set line quantity");
        self.touch();
        Ok(())
    }

    /// Adds one unit to a line.
    pub fn increment(&mut self, item_id: &str) -> CoreResult<i64> {
        let max = self.limits.max_quantity;
        let (unit_price, current) = {
            let item = self.line(item_id)?;
            (item.unit_price, item.quantity)
        };
        if current >= max {
            return Err(CoreError::QuantityTooLarge {
                requested: current.saturating_add(1),
                max,
            });
        }
        self.check_gross(Some(item_id), unit_price, current + 1)?;

        let item = self.item_mut(item_id)?;
        item.quantity = current + 1;
        self.touch();
        Ok(current + 1)
    }

    /// Takes one unit off a line, stopping at 1.
    pub fn decrement(&mut self, item_id: &str) -> CoreResult<i64> {
        let item = self.item_mut(item_id)?;
        if item.quantity > 1 {
            item.quantity -= 1;
            let quantity = item.quantity;
            self.touch();
            return Ok(quantity);
        }
        Ok(item.quantity)
    }

    /// Attaches or detaches a discount on one line.
    ///
    /// ## Errors
    /// - `LineItemNotFound` for an unknown id
    /// - `InvalidDiscount` when attaching to a line whose gross is 0
    pub fn set_item_discount(&mut self, item_id: &str, discount: Option<Discount>) -> CoreResult<()> {
        let item = self.item_mut(item_id)?;
        if discount.is_some() && !item.gross().is_positive() {
            return Err(CoreError::invalid_discount(format!(
                "line {} has nothing to discount",
                item.sku
            )));
        }
        debug!(item_id, discount = ?discount, "Set line discount");
        item.set_discount(discount);
        self.touch();
        Ok(())
    }

    /// Attaches or detaches the cart-wide discount.
    ///
    /// ## Errors
    /// `InvalidDiscount` when attaching while the subtotal is 0.
    pub fn set_cart_discount(&mut self, discount: Option<Discount>) -> CoreResult<()> {
        if discount.is_some() && !self.totals.subtotal.is_positive() {
            return Err(CoreError::invalid_discount("cart subtotal is zero"));
        }
        debug!(discount = ?discount, "Set cart discount");
        self.cart_discount = discount;
        self.touch();
        Ok(())
    }

    /// Empties the cart and drops the cart discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cart_discount = None;
        self.touch();
    }

    fn line(&self, item_id: &str) -> CoreResult<&LineItem> {
        self.find(item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(item_id.to_string()))
    }

    /// Refuses a change that would push the cart gross past
    /// `Money::MAX_AMOUNT`. `line_id` is the line being resized, `None` for
    /// a new line.
    fn check_gross(&self, line_id: Option<&str>, unit_price: Money, quantity: i64) -> CoreResult<()> {
        let others = self
            .items
            .iter()
            .filter(|i| Some(i.id.as_str()) != line_id)
            .try_fold(Money::zero(), |acc, i| acc.checked_add(i.gross()));

        others
            .zip(unit_price.checked_mul_by_int(quantity))
            .and_then(|(others, line)| others.checked_add(line))
            .filter(Money::within_limit)
            .map(|_| ())
            .ok_or(CoreError::AmountTooLarge {
                limit: Money::MAX_AMOUNT,
            })
    }

    fn item_mut(&mut self, item_id: &str) -> CoreResult<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(item_id.to_string()))
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.recompute();
    }

    fn recompute(&mut self) {
        let gross: Money = self.items.iter().map(LineItem::gross).sum();
        let line_discount_total: Money = self.items.iter().map(LineItem::discount_amount).sum();
        let subtotal: Money = self.items.iter().map(LineItem::net_total).sum();

        let cart_discount = self
            .cart_discount
            .as_ref()
            .map(|d| d.resolve(subtotal))
            .unwrap_or_default();

        let taxable = subtotal - cart_discount;
        let tax = taxable.calculate_tax(self.tax_rate);
        let total = (taxable + tax).non_negative();

        self.totals = CartTotals {
            item_count: self.items.len(),
            total_quantity: self.items.iter().map(|i| i.quantity).sum(),
            gross,
            line_discount_total,
            subtotal,
            cart_discount,
            taxable,
            tax,
            total,
        };
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(TaxRate::zero(), CartLimits::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: None,
            name: format!("Product {}", id),
            brand: "House".to_string(),
            category: "Misc".to_string(),
            price: Money::from_cents(price_cents),
            cost: Some(Money::from_cents(price_cents / 2)),
            is_active: true,
        }
    }

    fn taxed_cart() -> Cart {
        Cart::new(TaxRate::from_bps(850), CartLimits::default())
    }

    #[test]
    fn test_line_item_rejects_zero_quantity() {
        let product = test_product("1", 999);
        assert!(matches!(
            LineItem::new(&product, 0),
            Err(CoreError::InvalidQuantity { requested: 0 })
        ));

        let mut item = LineItem::new(&product, 1).unwrap();
        assert!(item.set_quantity(0).is_err());
        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn test_two_of_same_product_with_tax() {
        let mut cart = taxed_cart();
        let product = test_product("1", 2499);

        cart.add_item(&product, 2).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal.cents(), 4998);
        assert_eq!(totals.tax.cents(), 425);
        assert_eq!(totals.total.cents(), 5423);
    }

    #[test]
    fn test_percentage_cart_discount() {
        let mut cart = taxed_cart();
        cart.add_item(&test_product("1", 2499), 2).unwrap();
        cart.set_cart_discount(Some(Discount::percentage_bps(1000).unwrap()))
            .unwrap();

        let totals = cart.totals();
        assert_eq!(totals.cart_discount.cents(), 500);
        assert_eq!(totals.taxable.cents(), 4498);
        assert_eq!(totals.tax.cents(), 382);
        assert_eq!(totals.total.cents(), 4880);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::default();
        let product = test_product("1", 999);

        let first = cart.add_item(&product, 2).unwrap();
        let second = cart.add_item(&product, 3).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.totals().item_count, 1);
        assert_eq!(cart.totals().total_quantity, 5);
    }

    #[test]
    fn test_unit_price_is_snapshotted() {
        let mut cart = Cart::default();
        let mut product = test_product("1", 1000);
        cart.add_item(&product, 1).unwrap();

        product.price = Money::from_cents(5000);
        cart.add_item(&product, 1).unwrap();

        assert_eq!(cart.items()[0].unit_price().cents(), 1000);
        assert_eq!(cart.totals().subtotal.cents(), 2000);
    }

    #[test]
    fn test_flat_item_discount_larger_than_line() {
        let mut cart = taxed_cart();
        let id = cart.add_item(&test_product("1", 5000), 1).unwrap();

        cart.set_item_discount(&id, Some(Discount::flat(Money::from_cents(7500)).unwrap()))
            .unwrap();

        let item = cart.find(&id).unwrap();
        assert_eq!(item.discount_amount().cents(), 5000);
        assert_eq!(item.net_total(), Money::zero());
        assert_eq!(cart.totals().total, Money::zero());
    }

    #[test]
    fn test_item_and_cart_discounts_stack() {
        let mut cart = Cart::default();
        let a = cart.add_item(&test_product("a", 1000), 1).unwrap();
        cart.add_item(&test_product("b", 1000), 1).unwrap();

        cart.set_item_discount(&a, Some(Discount::flat(Money::from_cents(200)).unwrap()))
            .unwrap();
        cart.set_cart_discount(Some(Discount::percentage_bps(5000).unwrap()))
            .unwrap();

        let totals = cart.totals();
        assert_eq!(totals.gross.cents(), 2000);
        assert_eq!(totals.line_discount_total.cents(), 200);
        assert_eq!(totals.subtotal.cents(), 1800);
        assert_eq!(totals.cart_discount.cents(), 900);
        assert_eq!(totals.total.cents(), 900);
    }

    #[test]
    fn test_set_quantity_below_one_removes() {
        let mut cart = Cart::default();
        let id = cart.add_item(&test_product("1", 999), 2).unwrap();

        cart.set_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.totals().total, Money::zero());
    }

    #[test]
    fn test_set_quantity_unknown_id() {
        let mut cart = Cart::default();
        assert!(matches!(
            cart.set_quantity("nope", 3),
            Err(CoreError::LineItemNotFound(_))
        ));
        assert!(cart.set_quantity("nope", 0).is_ok());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut cart = Cart::default();
        cart.add_item(&test_product("1", 999), 1).unwrap();
        let revision = cart.revision();

        assert!(cart.remove_item("missing").is_none());
        assert_eq!(cart.revision(), revision);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_increment_decrement_clamp() {
        let mut cart = Cart::new(
            TaxRate::zero(),
            CartLimits {
                max_lines: 10,
                max_quantity: 3,
            },
        );
        let id = cart.add_item(&test_product("1", 100), 1).unwrap();

        assert_eq!(cart.decrement(&id).unwrap(), 1);
        assert_eq!(cart.increment(&id).unwrap(), 2);
        assert_eq!(cart.increment(&id).unwrap(), 3);
        assert!(matches!(
            cart.increment(&id),
            Err(CoreError::QuantityTooLarge { requested: 4, max: 3 })
        ));
        assert_eq!(cart.totals().subtotal.cents(), 300);
    }

    #[test]
    fn test_limits_checked_before_mutation() {
        let mut cart = Cart::new(
            TaxRate::zero(),
            CartLimits {
                max_lines: 1,
                max_quantity: 5,
            },
        );
        let p1 = test_product("1", 100);
        cart.add_item(&p1, 4).unwrap();

        assert!(matches!(
            cart.add_item(&p1, 2),
            Err(CoreError::QuantityTooLarge { requested: 6, max: 5 })
        ));
        assert!(matches!(
            cart.add_item(&test_product("2", 100), 1),
            Err(CoreError::CartTooLarge { max: 1 })
        ));
        assert_eq!(cart.totals().total_quantity, 4);
    }

    #[test]
    fn test_gross_past_limit_is_refused() {
        let mut cart = Cart::new(
            TaxRate::from_bps(850),
            CartLimits {
                max_lines: 10,
                max_quantity: 999,
            },
        );
        let whale = test_product("whale", i64::MAX / 2);
        assert!(matches!(
            cart.add_item(&whale, 3),
            Err(CoreError::AmountTooLarge { .. })
        ));
        assert!(cart.is_empty());

        let half = Money::MAX_AMOUNT.cents() / 2;
        let id = cart.add_item(&test_product("a", half), 1).unwrap();
        let revision = cart.revision();

        assert!(matches!(
            cart.add_item(&test_product("b", half + 1), 1),
            Err(CoreError::AmountTooLarge { .. })
        ));
        assert!(cart.set_quantity(&id, 3).is_err());
        assert_eq!(cart.increment(&id).unwrap(), 2);
        assert!(matches!(
            cart.increment(&id),
            Err(CoreError::AmountTooLarge { .. })
        ));
        assert!(cart.add_item(&test_product("a", half), 1).is_err());

        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(cart.revision(), revision + 1);
        assert_eq!(cart.totals().gross, Money::MAX_AMOUNT);
        assert!(cart.totals().total > cart.totals().gross);
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut cart = Cart::default();
        let mut product = test_product("1", 100);
        product.is_active = false;
        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::InactiveProduct(_))
        ));
    }

    #[test]
    fn test_cart_discount_survives_emptying() {
        let mut cart = taxed_cart();
        let product = test_product("1", 2499);
        let id = cart.add_item(&product, 2).unwrap();
        cart.set_cart_discount(Some(Discount::percentage_bps(1000).unwrap()))
            .unwrap();

        cart.remove_item(&id);
        assert!(cart.cart_discount().is_some());
        assert_eq!(cart.totals().total, Money::zero());

        cart.add_item(&product, 2).unwrap();
        assert_eq!(cart.totals().cart_discount.cents(), 500);
        assert_eq!(cart.totals().total.cents(), 4880);
    }

    #[test]
    fn test_discount_on_zero_base_rejected() {
        let mut cart = Cart::default();
        assert!(matches!(
            cart.set_cart_discount(Some(Discount::percentage_bps(1000).unwrap())),
            Err(CoreError::InvalidDiscount { .. })
        ));
        // Clearing is always allowed
        assert!(cart.set_cart_discount(None).is_ok());

        let id = cart.add_item(&test_product("free", 0), 1).unwrap();
        assert!(matches!(
            cart.set_item_discount(&id, Some(Discount::flat(Money::from_cents(1)).unwrap())),
            Err(CoreError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn test_clear_drops_discount() {
        let mut cart = Cart::default();
        cart.add_item(&test_product("1", 999), 1).unwrap();
        cart.set_cart_discount(Some(Discount::flat(Money::from_cents(100)).unwrap()))
            .unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.cart_discount().is_none());
        assert_eq!(*cart.totals(), CartTotals::default());
    }

    #[test]
    fn test_subtotal_exact_over_many_lines() {
        let mut cart = Cart::new(
            TaxRate::zero(),
            CartLimits {
                max_lines: 500,
                max_quantity: 999,
            },
        );
        let mut expected = 0i64;
        for i in 0..300i64 {
            let price = 1 + (i * 7919) % 100_000;
            let qty = 1 + i % 17;
            let id = cart.add_item(&test_product(&i.to_string(), price), qty).unwrap();
            expected += price * qty;
            if i % 3 == 0 {
                let d = Discount::percentage_bps(333).unwrap();
                let gross = Money::from_cents(price * qty);
                expected -= d.resolve(gross).cents();
                cart.set_item_discount(&id, Some(d)).unwrap();
            }
        }
        assert_eq!(cart.totals().subtotal.cents(), expected);
    }
}
