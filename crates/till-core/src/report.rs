//! # Sales Reporting
//!
//! Aggregates over finalized [`SaleRecord`]s. Reports only read records;
//! they never feed back into pricing.

use std::collections::HashMap;
use std::num::NonZeroU64;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::{DateRange, SalesLedger};
use crate::money::Money;
use crate::sale::SaleRecord;
use crate::types::PaymentMethod;

/// Default number of products listed in a summary.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// A best-selling product within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity_sold: i64,
    /// Σ line totals (after item discounts, before cart discount and tax).
    pub revenue: Money,
}

/// Totals for a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: usize,
    /// Σ totals, tax included.
    pub gross_sales: Money,
    /// Σ (subtotal − cart discount), tax excluded.
    pub net_sales: Money,
    pub tax_collected: Money,
    pub line_discounts: Money,
    pub cart_discounts: Money,
    pub cash_total: Money,
    pub cash_count: usize,
    pub card_total: Money,
    pub card_count: usize,
    /// `gross_sales / sale_count`, rounded half-up.
    pub average_sale: Money,
    /// Cost of lines with a known unit cost.
    pub total_cost: Money,
    /// Net revenue of those same lines: their line totals less their
    /// proportional share of the cart discount.
    pub costed_sales: Money,
    /// `costed_sales − total_cost`. Lines without a cost count on neither side.
    pub gross_margin: Money,
    pub top_products: Vec<TopProduct>,
}

impl SalesSummary {
    /// Summarizes `records`, listing up to `top_n` products.
    ///
    /// Products rank by quantity sold, then revenue, then name.
    pub fn from_records(records: &[SaleRecord], top_n: usize) -> Self {
        let mut summary = SalesSummary {
            sale_count: records.len(),
            ..Default::default()
        };
        let mut products: HashMap<&str, TopProduct> = HashMap::new();

        for record in records {
            summary.gross_sales += record.total;
            summary.net_sales += record.subtotal - record.discount;
            summary.tax_collected += record.tax;
            summary.line_discounts += record.line_discount_total;
            summary.cart_discounts += record.discount;
            summary.total_cost += record.total_cost();
            summary.costed_sales += costed_net(record);

            match record.payment_method {
                PaymentMethod::Cash => {
                    summary.cash_total += record.total;
                    summary.cash_count += 1;
                }
                PaymentMethod::Card => {
                    summary.card_total += record.total;
                    summary.card_count += 1;
                }
            }

            for line in &record.lines {
                let entry = products
                    .entry(line.product_id.as_str())
                    .or_insert_with(|| TopProduct {
                        product_id: line.product_id.clone(),
                        name: line.name.clone(),
                        quantity_sold: 0,
                        revenue: Money::zero(),
                    });
                entry.quantity_sold += line.quantity;
                entry.revenue += line.line_total;
            }
        }

        summary.gross_margin = summary.costed_sales - summary.total_cost;
        summary.average_sale = NonZeroU64::new(records.len() as u64)
            .map(|count| summary.gross_sales.mul_by_rational(1, count))
            .unwrap_or_else(Money::zero);

        let mut ranked: Vec<TopProduct> = products.into_values().collect();
        ranked.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then_with(|| b.revenue.cmp(&a.revenue))
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(top_n);
        summary.top_products = ranked;

        summary
    }

    /// Summary of everything `ledger` holds within `range`.
    pub fn for_range<L: SalesLedger + ?Sized>(ledger: &L, range: &DateRange, top_n: usize) -> Self {
        Self::from_records(&ledger.query(range), top_n)
    }

    /// Summary of one calendar day (UTC).
    pub fn for_day<L: SalesLedger + ?Sized>(ledger: &L, day: NaiveDate, top_n: usize) -> Self {
        Self::for_range(ledger, &DateRange::day(day), top_n)
    }
}

/// Line totals of the lines that carry a cost, less their share of the cart
/// discount (`discount × costed / subtotal`, half-up).
fn costed_net(record: &SaleRecord) -> Money {
    let costed: Money = record
        .lines
        .iter()
        .filter(|line| line.unit_cost.is_some())
        .map(|line| line.line_total)
        .sum();

    match u64::try_from(record.subtotal.cents()).ok().and_then(NonZeroU64::new) {
        Some(subtotal) => costed - record.discount.mul_by_rational(costed.cents(), subtotal),
        None => costed,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
