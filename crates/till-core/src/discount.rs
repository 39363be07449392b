//! # Discount Module
//!
//! A discount is a tagged value: a flat amount or a percentage, plus an
//! optional free-text reason.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     resolve(discount, base)                             │
//! │                                                                         │
//! │  Flat { amount }        → min(amount, base)                            │
//! │  Percentage { bps }     → round_half_up(base × bps / 10000)            │
//! │                                                                         │
//! │  base ≤ 0               → 0                                            │
//! │                                                                         │
//! │  Always: 0 ≤ resolved ≤ base                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation happens at construction. A flat discount larger than the base
//! is legal (it is capped when resolved); a percentage above 100 is not.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// 100% in basis points.
pub const MAX_PERCENTAGE_BPS: u32 = 10_000;

/// Longest reason text kept on a discount.
pub const MAX_REASON_LEN: usize = 120;

// =============================================================================
// Discount
// =============================================================================

/// The two ways a discount can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Fixed amount off, capped at the base when resolved.
    Flat { amount: Money },
    /// Proportional amount off, in basis points (1000 = 10%).
    Percentage { bps: u32 },
}

/// A validated discount.
///
/// Fields are private so every instance went through a constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    kind: DiscountKind,
    reason: Option<String>,
}

impl Discount {
    /// A flat amount off.
    ///
    /// ## Errors
    /// `InvalidDiscount` if `amount ≤ 0`.
    pub fn flat(amount: Money) -> CoreResult<Self> {
        if !amount.is_positive() {
            return Err(CoreError::invalid_discount(format!(
                "flat amount must be positive, got {amount}"
            )));
        }
        Ok(Discount {
            kind: DiscountKind::Flat { amount },
            reason: None,
        })
    }

    /// A percentage off, in basis points.
    ///
    /// ## Errors
    /// `InvalidDiscount` if `bps` is 0 or above 10000 (100%).
    pub fn percentage_bps(bps: u32) -> CoreResult<Self> {
        if bps == 0 || bps > MAX_PERCENTAGE_BPS {
            return Err(CoreError::invalid_discount(format!(
                "percentage must be in (0, 100], got {}",
                Decimal::new(bps as i64, 2).normalize()
            )));
        }
        Ok(Discount {
            kind: DiscountKind::Percentage { bps },
            reason: None,
        })
    }

    /// A percentage off, such as `10` or `12.5`.
    ///
    /// The value is rounded half-up to a whole basis point before the range
    /// check, so `0.001` is rejected as zero.
    pub fn percentage(pct: Decimal) -> CoreResult<Self> {
        if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(CoreError::invalid_discount(format!(
                "percentage must be in (0, 100], got {pct}"
            )));
        }
        let bps = (pct * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0);
        Self::percentage_bps(bps)
    }

    /// Parses operator input: `kind` is `flat`/`$` or `percent`/`%`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::discount::Discount;
    /// use till_core::money::Money;
    ///
    /// let d = Discount::parse("%", "10").unwrap();
    /// assert_eq!(d.resolve(Money::from_cents(4998)).cents(), 500);
    /// ```
    pub fn parse(kind: &str, value: &str) -> CoreResult<Self> {
        match kind.trim().to_lowercase().as_str() {
            "flat" | "$" | "amount" => Self::flat(Money::from_decimal_str(value)?),
            "percent" | "percentage" | "%" | "pct" => {
                let pct = Decimal::from_str(value.trim().trim_end_matches('%')).map_err(|e| {
                    CoreError::invalid_discount(format!("'{value}' is not a percentage: {e}"))
                })?;
                Self::percentage(pct)
            }
            other => Err(CoreError::invalid_discount(format!(
                "unknown discount type '{other}', expected flat or percent"
            ))),
        }
    }

    /// Attaches a free-text reason (manager override, promo name).
    ///
    /// Blank reasons are dropped and long ones truncated.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        let reason = reason.trim();
        self.reason = if reason.is_empty() {
            None
        } else {
            Some(reason.chars().take(MAX_REASON_LEN).collect())
        };
        self
    }

    #[inline]
    pub fn kind(&self) -> DiscountKind {
        self.kind
    }

    #[inline]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    #[inline]
    pub fn is_percentage(&self) -> bool {
        matches!(self.kind, DiscountKind::Percentage { .. })
    }

    /// Effective deduction against `base`, always within `[0, base]`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::discount::Discount;
    /// use till_core::money::Money;
    ///
    /// // A $75 flat discount on a $50 line takes exactly $50
    /// let d = Discount::flat(Money::from_cents(7500)).unwrap();
    /// assert_eq!(d.resolve(Money::from_cents(5000)).cents(), 5000);
    /// ```
    pub fn resolve(&self, base: Money) -> Money {
        if !base.is_positive() {
            return Money::zero();
        }
        let amount = match self.kind {
            DiscountKind::Flat { amount } => amount,
            DiscountKind::Percentage { bps } => base.mul_bps(bps),
        };
        amount.min(base).non_negative()
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiscountKind::Flat { amount } => write!(f, "{amount} off")?,
            DiscountKind::Percentage { bps } => {
                write!(f, "{}% off", Decimal::new(bps as i64, 2).normalize())?
            }
        }
        if let Some(reason) = &self.reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_rejects_non_positive() {
        assert!(matches!(
            Discount::flat(Money::zero()),
            Err(CoreError::InvalidDiscount { .. })
        ));
        assert!(Discount::flat(Money::from_cents(-100)).is_err());
        assert!(Discount::flat(Money::from_cents(1)).is_ok());
    }

    #[test]
    fn test_percentage_range() {
        assert!(Discount::percentage_bps(0).is_err());
        assert!(Discount::percentage_bps(10_001).is_err());
        assert!(Discount::percentage_bps(10_000).is_ok());
        assert!(Discount::percentage(Decimal::new(1001, 1)).is_err()); // 100.1
        assert!(Discount::percentage(Decimal::new(-5, 0)).is_err());
        assert!(Discount::percentage(Decimal::new(1, 3)).is_err()); // 0.001 → 0 bps
        assert_eq!(
            Discount::percentage(Decimal::new(125, 1)).unwrap().kind(),
            DiscountKind::Percentage { bps: 1250 }
        );
    }

    #[test]
    fn test_flat_is_capped_at_base() {
        let d = Discount::flat(Money::from_cents(7500)).unwrap();
        assert_eq!(d.resolve(Money::from_cents(5000)).cents(), 5000);
        assert_eq!(d.resolve(Money::from_cents(9000)).cents(), 7500);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let ten = Discount::percentage_bps(1000).unwrap();
        // 4998 × 10% = 499.8 → 500
        assert_eq!(ten.resolve(Money::from_cents(4998)).cents(), 500);
        // 5 × 10% = 0.5 → 1
        assert_eq!(ten.resolve(Money::from_cents(5)).cents(), 1);
        let all = Discount::percentage_bps(10_000).unwrap();
        assert_eq!(all.resolve(Money::from_cents(1234)).cents(), 1234);
    }

    #[test]
    fn test_resolve_never_exceeds_base() {
        let discounts = [
            Discount::flat(Money::from_cents(1)).unwrap(),
            Discount::flat(Money::from_cents(1_000_000)).unwrap(),
            Discount::percentage_bps(1).unwrap(),
            Discount::percentage_bps(3333).unwrap(),
            Discount::percentage_bps(9999).unwrap(),
            Discount::percentage_bps(10_000).unwrap(),
        ];
        for base in [0, 1, 2, 3, 99, 100, 4998, 123_457, 10_000_001] {
            let base = Money::from_cents(base);
            for d in &discounts {
                let resolved = d.resolve(base);
                assert!(resolved >= Money::zero(), "{d} on {base}");
                assert!(resolved <= base, "{d} on {base}");
            }
        }
    }

    #[test]
    fn test_zero_or_negative_base_resolves_to_zero() {
        let d = Discount::flat(Money::from_cents(500)).unwrap();
        assert_eq!(d.resolve(Money::zero()), Money::zero());
        assert_eq!(d.resolve(Money::from_cents(-100)), Money::zero());
    }

    #[test]
    fn test_parse_operator_input() {
        let d = Discount::parse("flat", "5.00").unwrap();
        assert_eq!(d.kind(), DiscountKind::Flat { amount: Money::from_cents(500) });

        let d = Discount::parse("%", "10%").unwrap();
        assert_eq!(d.kind(), DiscountKind::Percentage { bps: 1000 });

        assert!(Discount::parse("percent", "150").is_err());
        assert!(Discount::parse("bogo", "1").is_err());
        assert!(Discount::parse("flat", "0").is_err());
    }

    #[test]
    fn test_reason_and_display() {
        let d = Discount::percentage_bps(1000).unwrap().with_reason("  loyalty ");
        assert_eq!(d.reason(), Some("loyalty"));
        assert_eq!(d.to_string(), "10% off (loyalty)");

        let d = Discount::flat(Money::from_cents(250)).unwrap().with_reason("   ");
        assert_eq!(d.reason(), None);
        assert_eq!(d.to_string(), "$2.50 off");
    }

    #[test]
    fn test_serde_shape() {
        let d = Discount::percentage_bps(1000).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"]["type"], "percentage");
        assert_eq!(json["kind"]["bps"], 1000);

        let back: Discount = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
