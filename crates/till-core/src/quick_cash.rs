//! # Quick-Cash Suggestions
//!
//! Candidate amounts for the cash keypad. Pure helper: nothing here touches
//! the tender.
//!
//! ```text
//! remaining $54.23
//!   exact ............ 54.23
//!   bills ≥ balance .. 100, 200, 500
//!   round-ups ........ 55, 60, 100
//!   fillers .......... 75, 150, 250, ...
//!   ─────────────────────────────────────────
//!   sorted, deduped, exactly 9:
//!   54.23 55 60 75 100 150 200 250 300
//! ```

use crate::money::Money;

/// Number of suggestions always returned.
pub const SUGGESTION_COUNT: usize = 9;

/// Round up to the next multiple of each step (major units).
const ROUND_UP_STEPS: [i64; 5] = [5, 10, 20, 50, 100];

/// Common over-tender amounts (major units).
const FILLER_AMOUNTS: [i64; 11] = [25, 30, 40, 75, 150, 250, 300, 400, 600, 750, 1000];

const CENTS_PER_UNIT: i64 = 100;

/// Suggests exactly [`SUGGESTION_COUNT`] ascending, distinct amounts for
/// paying `remaining`.
///
/// A zero (or negative) balance yields the plain denomination list.
pub fn suggest_cash_amounts(remaining: Money, denominations: &[Money]) -> Vec<Money> {
    let remaining = remaining.non_negative();

    let mut amounts: Vec<Money> = if remaining.is_zero() {
        denominations.iter().copied().filter(Money::is_positive).collect()
    } else {
        let mut amounts = vec![remaining];
        amounts.extend(denominations.iter().copied().filter(|d| *d >= remaining));
        amounts.extend(
            ROUND_UP_STEPS
                .iter()
                .map(|step| round_up(remaining, Money::from_cents(step * CENTS_PER_UNIT))),
        );
        amounts.extend(
            FILLER_AMOUNTS
                .iter()
                .map(|units| Money::from_cents(units * CENTS_PER_UNIT))
                .filter(|f| *f >= remaining),
        );
        amounts
    };

    amounts.sort();
    amounts.dedup();

    while amounts.len() < SUGGESTION_COUNT {
        let last = amounts.last().copied().unwrap_or_else(Money::zero);
        amounts.push(last + padding_step(last));
    }
    amounts.truncate(SUGGESTION_COUNT);
    amounts
}

/// Smallest multiple of `step` that is ≥ `amount`.
fn round_up(amount: Money, step: Money) -> Money {
    let step = step.cents();
    let cents = amount.cents();
    let rounded = cents.saturating_add(step - 1) / step * step;
    Money::from_cents(rounded)
}

fn padding_step(last: Money) -> Money {
    let units = if last.dollars() >= 100 {
        100
    } else if last.dollars() >= 50 {
        50
    } else {
        10
    };
    Money::from_cents(units * CENTS_PER_UNIT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;

    fn denominations() -> Vec<Money> {
        CheckoutConfig::default().denominations()
    }

    fn assert_contract(amounts: &[Money]) {
        assert_eq!(amounts.len(), SUGGESTION_COUNT);
        assert!(amounts.iter().all(|a| !a.is_negative()));
        assert!(amounts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_typical_balance() {
        let amounts = suggest_cash_amounts(Money::from_cents(5423), &denominations());
        assert_contract(&amounts);

        let cents: Vec<i64> = amounts.iter().map(Money::cents).collect();
        assert_eq!(
            cents,
            vec![5423, 5500, 6000, 7500, 10_000, 15_000, 20_000, 25_000, 30_000]
        );
    }

    #[test]
    fn test_exact_round_amount_deduplicated() {
        let amounts = suggest_cash_amounts(Money::from_cents(2000), &denominations());
        assert_contract(&amounts);
        assert_eq!(amounts[0].cents(), 2000);
        assert_eq!(amounts.iter().filter(|a| a.cents() == 2000).count(), 1);
    }

    #[test]
    fn test_zero_balance_lists_denominations() {
        let amounts = suggest_cash_amounts(Money::zero(), &denominations());
        assert_contract(&amounts);
        assert_eq!(amounts[0].cents(), 100);
        assert_eq!(amounts[8].cents(), 50_000);
    }

    #[test]
    fn test_large_balance_pads_by_hundreds() {
        let amounts = suggest_cash_amounts(Money::from_cents(123_456), &denominations());
        assert_contract(&amounts);
        assert_eq!(amounts[0].cents(), 123_456);
        // 1235, 1240, 1240(dup), 1250, 1300 then +100 padding
        assert_eq!(amounts[1].cents(), 123_500);
        assert_eq!(amounts[8].cents(), 170_000);
    }

    #[test]
    fn test_no_denominations_still_nine() {
        let amounts = suggest_cash_amounts(Money::zero(), &[]);
        assert_contract(&amounts);
        assert_eq!(amounts[0].cents(), 1000);
    }
}
