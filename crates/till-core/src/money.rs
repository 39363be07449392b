//! # Money
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operator types "24.995"                                                │
//! │        │  rust_decimal, exact                                           │
//! │        ▼                                                                │
//! │  round half-up to cents ──► Money(2500)                                 │
//! │        │                                                                │
//! │        ▼  from here on: i64 add / sub / mul, never a float              │
//! │  line totals, subtotal, tax, balance, change                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Rule
//! One rule everywhere: **round half-up** on the magnitude (half away from
//! zero). `0.825 → 0.83`, `-0.825 → -0.83`. Input parsing, tax, and
//! percentage discounts all use it, so re-running a calculation always
//! yields the same cents.
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(2499);
//! let typed = Money::from_decimal_str("24.995").unwrap();
//! assert_eq!(typed.cents(), 2500);
//!
//! let doubled = price * 2;                      // $49.98
//! let total = doubled + Money::from_cents(425); // $54.23
//! assert_eq!(total.cents(), 5423);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::num::NonZeroU64;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Denominator for basis-point rates (10000 bps = 100%).
pub const BPS_DENOMINATOR: NonZeroU64 = match NonZeroU64::new(10_000) {
    Some(d) => d,
    None => unreachable!(),
};

// =============================================================================
// Money Type
// =============================================================================

/// An amount in cents. Signed, so `a - b` may go below zero before a
/// caller clamps it. Serializes as a bare integer.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price ──► LineItem.unit_price ──► gross ──► net (− discount)  │
/// │                                                                         │
/// │  Cart.subtotal ──► − cart discount ──► tax ──► Cart.total              │
/// │                                                                         │
/// │  Tender.cash_applied ──► remaining balance / change due                │
/// │                                                                         │
/// │  SaleRecord: every amount is Money, frozen at completion               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Largest magnitude accepted from input, as a tender, or as a cart's
    /// gross: $1,000,000,000.00. Every derived amount stays far inside i64.
    pub const MAX_AMOUNT: Money = Money(100_000_000_000);

    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// `from_major_minor(12, 5)` is $12.05. The sign comes from `major`
    /// alone, so `(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal value into Money, rounding half-up to whole cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use till_core::money::Money;
    ///
    /// let m = Money::from_decimal(Decimal::new(10825, 3)).unwrap(); // 10.825
    /// assert_eq!(m.cents(), 1083);
    /// ```
    ///
    /// Magnitudes above [`Money::MAX_AMOUNT`] are rejected.
    pub fn from_decimal(value: Decimal) -> Result<Self, ValidationError> {
        let out_of_range =
            || ValidationError::invalid_format("amount", format!("{value} is out of range"));

        let cents = value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or_else(out_of_range)?;

        if cents.unsigned_abs() > Self::MAX_AMOUNT.0.unsigned_abs() {
            return Err(out_of_range());
        }
        Ok(Money(cents))
    }

    /// Parses operator input such as `"24.99"`, `"$24.99"` or `"5"`.
    ///
    /// A single leading `$` and surrounding whitespace are accepted.
    /// Anything else that is not a plain decimal number is rejected.
    pub fn from_decimal_str(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let value = Decimal::from_str(trimmed)
            .map_err(|e| ValidationError::invalid_format("amount", format!("'{input}': {e}")))?;

        Self::from_decimal(value)
    }

    /// Converts a float at the input boundary.
    ///
    /// The float's shortest decimal representation is used, so `24.995`
    /// rounds to 2500 cents rather than to whatever its binary value is
    /// closest to.
    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("{value} is not a finite number"),
            ));
        }
        Self::from_decimal_str(&format!("{value}"))
    }

    /// Returns the exact decimal value (two decimal places).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(5423).to_decimal().to_string(), "54.23");
    /// ```
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole dollars, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// The 0..=99 cents after the dollars.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the value at zero.
    ///
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-25).non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity (exact).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2499);
    /// assert_eq!(unit_price.mul_by_int(2).cents(), 4998);
    /// ```
    ///
    /// Saturates at the i64 bounds. Callers that can see large operands use
    /// [`Money::checked_mul_by_int`].
    #[inline]
    pub const fn mul_by_int(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` on i64 overflow.
    #[inline]
    pub const fn checked_mul_by_int(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on i64 overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// True when the magnitude is within [`Money::MAX_AMOUNT`].
    #[inline]
    pub const fn within_limit(&self) -> bool {
        self.0.unsigned_abs() <= Self::MAX_AMOUNT.0.unsigned_abs()
    }

    /// Multiplies by `numer / denom`, rounding half-up to whole cents.
    ///
    /// The product is formed in i128, so no intermediate overflow for any
    /// realistic amount.
    ///
    /// ## Example
    /// ```rust
    /// use std::num::NonZeroU64;
    /// use till_core::money::Money;
    ///
    /// let third = Money::from_cents(1000).mul_by_rational(1, NonZeroU64::new(3).unwrap());
    /// assert_eq!(third.cents(), 333);
    /// ```
    pub fn mul_by_rational(&self, numer: i64, denom: NonZeroU64) -> Money {
        let product = self.0 as i128 * numer as i128;
        Money(round_half_up_div(product, denom.get() as i128) as i64)
    }

    /// Multiplies by a basis-point rate (`bps / 10000`), rounding half-up.
    #[inline]
    pub fn mul_bps(&self, bps: u32) -> Money {
        self.mul_by_rational(bps as i64, BPS_DENOMINATOR)
    }

    /// Calculates tax on this amount, rounding half-up.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// let taxable = Money::from_cents(4998);
    /// let rate = TaxRate::from_bps(850); // 8.5%
    ///
    /// // 4998 × 0.085 = 424.83 → 425
    /// assert_eq!(taxable.calculate_tax(rate).cents(), 425);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.mul_bps(rate.bps())
    }

    /// Formats using an explicit currency/locale convention.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{CurrencyFormat, Money};
    ///
    /// let m = Money::from_cents(123456);
    /// assert_eq!(m.format(&CurrencyFormat::for_locale("USD", "en-US")), "$1,234.56");
    /// assert_eq!(m.format(&CurrencyFormat::for_locale("EUR", "de-DE")), "1.234,56 €");
    /// ```
    pub fn format(&self, fmt: &CurrencyFormat) -> String {
        let major = group_digits(self.dollars().unsigned_abs(), fmt.group_separator);
        let number = format!("{}{}{:02}", major, fmt.decimal_separator, self.cents_part());
        let sign = if self.0 < 0 { "-" } else { "" };

        match fmt.symbol_position {
            SymbolPosition::Before => format!("{sign}{}{number}", fmt.symbol),
            SymbolPosition::BeforeSpaced => format!("{sign}{} {number}", fmt.symbol),
            SymbolPosition::AfterSpaced => format!("{sign}{number} {}", fmt.symbol),
        }
    }
}

/// Integer division rounding half away from zero.
fn round_half_up_div(n: i128, d: i128) -> i128 {
    let half = d / 2;
    if n >= 0 {
        (n + half) / d
    } else {
        -((-n + half) / d)
    }
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Currency Format
// =============================================================================

/// Where the currency symbol goes relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    /// `$1,234.56`
    Before,
    /// `€ 1.234,56`
    BeforeSpaced,
    /// `1.234,56 €`
    AfterSpaced,
}

/// Display conventions for one currency in one locale.
///
/// Only the handful of locales a register is likely to run in are known;
/// anything else falls back to en-US separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub code: String,
    pub symbol: String,
    pub decimal_separator: char,
    pub group_separator: char,
    pub symbol_position: SymbolPosition,
}

impl CurrencyFormat {
    /// Builds the format for an ISO currency code and a BCP-47 locale tag.
    pub fn for_locale(currency_code: &str, locale: &str) -> Self {
        let code = currency_code.to_ascii_uppercase();
        let symbol = match code.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" | "MXN" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" => "¥",
            "INR" => "₹",
            other => other,
        }
        .to_string();

        let (decimal_separator, group_separator, symbol_position) = match locale {
            "de-DE" | "es-ES" | "it-IT" => (',', '.', SymbolPosition::AfterSpaced),
            "fr-FR" => (',', ' ', SymbolPosition::AfterSpaced),
            "nl-NL" => (',', '.', SymbolPosition::BeforeSpaced),
            _ => ('.', ',', SymbolPosition::Before),
        };

        CurrencyFormat {
            code,
            symbol,
            decimal_separator,
            group_separator,
            symbol_position,
        }
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat::for_locale("USD", "en-US")
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money as en-US dollars.
///
/// ## Note
/// For receipts in other locales use [`Money::format`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_decimal_str(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.mul_by_int(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!(Money::from_decimal_str("24.99").unwrap().cents(), 2499);
        assert_eq!(Money::from_decimal_str("24.995").unwrap().cents(), 2500);
        assert_eq!(Money::from_decimal_str("24.994").unwrap().cents(), 2499);
        assert_eq!(Money::from_decimal_str("0.005").unwrap().cents(), 1);
        assert_eq!(Money::from_decimal_str("-0.005").unwrap().cents(), -1);
        assert_eq!(Money::from_decimal_str(" $5 ").unwrap().cents(), 500);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::from_decimal_str(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Money::from_decimal_str("12.3.4"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_parse_rejects_amounts_past_the_limit() {
        // Decimal::MAX: scaling to cents overflows the decimal itself
        assert!(matches!(
            Money::from_decimal_str("79228162514264337593543950335"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        // i64::MAX cents
        assert!(Money::from_decimal_str("92233720368547758.07").is_err());
        assert!(Money::from_decimal_str("-1000000000.01").is_err());

        assert_eq!(
            Money::from_decimal_str("1000000000.00").unwrap(),
            Money::MAX_AMOUNT
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(max.checked_mul_by_int(2), None);
        assert_eq!(
            Money::from_cents(2499).checked_mul_by_int(2),
            Some(Money::from_cents(4998))
        );
        assert_eq!(max.mul_by_int(2), max);
        assert!(Money::MAX_AMOUNT.within_limit());
        assert!(!Money::MAX_AMOUNT.checked_add(Money::from_cents(1)).unwrap().within_limit());
    }

    #[test]
    fn test_from_f64_uses_shortest_repr() {
        assert_eq!(Money::from_f64(24.995).unwrap().cents(), 2500);
        assert_eq!(Money::from_f64(0.1 + 0.2).unwrap().cents(), 30);
        assert!(Money::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_to_decimal_is_exact() {
        assert_eq!(Money::from_cents(5423).to_decimal(), Decimal::new(5423, 2));
        assert_eq!(Money::from_cents(-7).to_decimal().to_string(), "-0.07");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum_is_exact_for_many_dimes() {
        let total: Money = std::iter::repeat(Money::from_cents(10)).take(1000).sum();
        assert_eq!(total.cents(), 10_000);
    }

    #[test]
    fn test_tax_half_up() {
        // 1000 × 8.25% = 82.5 → 83
        assert_eq!(
            Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825)).cents(),
            83
        );
        // 4998 × 8.5% = 424.83 → 425
        assert_eq!(
            Money::from_cents(4998).calculate_tax(TaxRate::from_bps(850)).cents(),
            425
        );
        // 4498 × 8.5% = 382.33 → 382
        assert_eq!(
            Money::from_cents(4498).calculate_tax(TaxRate::from_bps(850)).cents(),
            382
        );
    }

    #[test]
    fn test_mul_by_rational_rounds_symmetrically() {
        let two = NonZeroU64::new(2).unwrap();
        assert_eq!(Money::from_cents(5).mul_by_rational(1, two).cents(), 3);
        assert_eq!(Money::from_cents(-5).mul_by_rational(1, two).cents(), -3);
        assert_eq!(Money::from_cents(4998).mul_bps(1000).cents(), 500);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(7).non_negative().cents(), 7);
    }

    #[test]
    fn test_locale_formatting() {
        let m = Money::from_cents(123456);
        assert_eq!(m.format(&CurrencyFormat::default()), "$1,234.56");
        assert_eq!(m.format(&CurrencyFormat::for_locale("GBP", "en-GB")), "£1,234.56");
        assert_eq!(m.format(&CurrencyFormat::for_locale("EUR", "de-DE")), "1.234,56 €");
        assert_eq!(m.format(&CurrencyFormat::for_locale("EUR", "fr-FR")), "1 234,56 €");
        assert_eq!(m.format(&CurrencyFormat::for_locale("EUR", "nl-NL")), "€ 1.234,56");
        assert_eq!(
            Money::from_cents(-99).format(&CurrencyFormat::default()),
            "-$0.99"
        );
        assert_eq!(
            Money::from_cents(100_000_000).format(&CurrencyFormat::default()),
            "$1,000,000.00"
        );
    }
}
