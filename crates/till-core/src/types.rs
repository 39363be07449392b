//! # Domain Types
//!
//! ```text
//! Product         id, sku, barcode, name, brand, category, price, cost
//! TaxRate         basis points: 850 = 8.5%
//! PaymentMethod   Cash | Card
//! ```
//!
//! Products are owned by the catalog. The core only ever copies them into
//! line items; it never mutates one.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Sales tax rate in hundredths of a percent.
///
/// 850 means 8.5%, so tax is always
/// `round_half_up(taxable × bps / 10000)` with no float anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `8.25`.
    ///
    /// Sub-basis-point precision is rounded half-up. Negative rates and
    /// rates above 100% are rejected.
    pub fn from_percentage(pct: Decimal) -> Result<Self, ValidationError> {
        let bps = pct
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|bps| bps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|bps| bps.to_u32())
            .filter(|bps| *bps <= 10_000)
            .ok_or(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 100,
            })?;
        Ok(TaxRate(bps))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact percentage (for display).
    #[inline]
    pub fn percentage(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Parses a percentage as an operator writes it: `8.25` or `8.25%`.
impl FromStr for TaxRate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let pct = Decimal::from_str(number)
            .map_err(|e| ValidationError::invalid_format("tax_rate", format!("'{s}': {e}")))?;
        TaxRate::from_percentage(pct)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage().normalize())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale, as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog key (UUID v4 for seeded rows).
    pub id: String,

    /// What the operator types, e.g. `JACDA001`.
    pub sku: String,

    pub barcode: Option<String>,

    pub name: String,

    pub brand: String,

    pub category: String,

    pub price: Money,

    /// Unit cost, used only for margin reporting.
    pub cost: Option<Money>,

    /// False once soft-deleted. Inactive products cannot be added.
    pub is_active: bool,
}

impl Product {
    /// Case-insensitive haystack the catalog searches over.
    pub fn search_fields(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.sku.as_str(),
            self.brand.as_str(),
            self.category.as_str(),
            self.barcode.as_deref().unwrap_or(""),
        ]
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
///
/// A sale carries exactly one method. Card is authorized for the exact
/// total by an external terminal, so no tendered amount is tracked for it.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_display() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert_eq!(rate.percentage(), Decimal::new(825, 2));
        assert_eq!(rate.to_string(), "8.25%");
    }

    #[test]
    fn test_percentage_rounds_to_whole_bps() {
        assert_eq!(TaxRate::from_percentage(Decimal::new(85, 1)).unwrap().bps(), 850);
        assert_eq!(TaxRate::from_percentage(Decimal::new(8255, 3)).unwrap().bps(), 826);
        assert!(TaxRate::from_percentage(Decimal::new(-1, 0)).is_err());
        assert!(TaxRate::from_percentage(Decimal::new(101, 0)).is_err());
        assert!(TaxRate::from_percentage(Decimal::MAX).is_err());
    }

    #[test]
    fn test_tax_rate_parses_percent_text() {
        assert_eq!("8.25".parse::<TaxRate>().unwrap().bps(), 825);
        assert_eq!(" 7.5% ".parse::<TaxRate>().unwrap().bps(), 750);
        assert!(matches!(
            "eight".parse::<TaxRate>(),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "150%".parse::<TaxRate>(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" Card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"card\"");
    }
}
