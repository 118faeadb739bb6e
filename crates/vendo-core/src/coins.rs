//! # Coin Ledger
//!
//! Converts integer balances into coin denomination counts and validates
//! deposited coins against the configured denomination set.
//!
//! ## Greedy Decomposition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  decompose(80) with coins {5, 10, 20, 50, 100}                      │
//! │                                                                     │
//! │  remaining = 80 → largest coin ≤ 80 is 50 → (50 × 1), remaining 30 │
//! │  remaining = 30 → largest coin ≤ 30 is 20 → (20 × 1), remaining 10 │
//! │  remaining = 10 → largest coin ≤ 10 is 10 → (10 × 1), remaining  0 │
//! │                                                                     │
//! │  result: [{50,1}, {20,1}, {10,1}]                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Termination: the remainder strictly decreases each round. Deposits
//! are restricted to supported denominations, and a purchase whose
//! remaining balance would not decompose is rolled back before it
//! commits, so every balance the system actually keeps is
//! representable; an unrepresentable remainder is reported as
//! [`CoreError::UnrepresentableAmount`] and treated as internal upstream.
//!
//! The same function renders a user's current balance as coins and
//! computes the change returned by a purchase.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::DEFAULT_COIN_VALUES;

// =============================================================================
// Coin Count
// =============================================================================

/// A denomination together with how many coins of it to hand out.
///
/// Serializes as `{"value": 50, "count": 1}`, the wire shape used by
/// change lists and balance queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCount {
    /// Coin face value in the smallest currency unit.
    pub value: i64,
    /// Number of coins of this value.
    pub count: i64,
}

impl CoinCount {
    /// Weighted value of this entry (value × count).
    #[inline]
    pub const fn total(&self) -> i64 {
        self.value * self.count
    }
}

// =============================================================================
// Coin Set
// =============================================================================

/// The fixed set of coin denominations the marketplace accepts.
///
/// Injected at startup and immutable thereafter. Denominations are kept
/// sorted highest-first, the order both `decompose` and callers rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSet {
    /// Supported denominations, descending.
    values: Vec<i64>,
}

impl CoinSet {
    /// Creates a coin set from the given denominations.
    ///
    /// Values are deduplicated and sorted highest-first.
    ///
    /// ## Errors
    /// - [`ValidationError::Required`] if no denomination is given
    /// - [`ValidationError::MustBePositive`] for zero or negative values
    pub fn new(values: impl IntoIterator<Item = i64>) -> CoreResult<Self> {
        let mut values: Vec<i64> = values.into_iter().collect();

        if values.is_empty() {
            return Err(ValidationError::Required {
                field: "coin denominations".to_string(),
            }
            .into());
        }

        if values.iter().any(|v| *v <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "coin denomination".to_string(),
            }
            .into());
        }

        values.sort_unstable_by(|a, b| b.cmp(a));
        values.dedup();

        Ok(CoinSet { values })
    }

    /// Returns the supported denominations, highest-first.
    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Checks whether a value is a supported denomination.
    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.values.contains(&value)
    }

    /// Validates a deposited coin value.
    ///
    /// ## Errors
    /// [`CoreError::UnsupportedDenomination`] if the value is not in the
    /// set, carrying the supported list for the caller-visible message.
    pub fn ensure_supported(&self, value: i64) -> CoreResult<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(CoreError::UnsupportedDenomination {
                value,
                supported: self.values.clone(),
            })
        }
    }

    /// Decomposes an amount into coin counts, largest denomination first.
    ///
    /// `decompose(0)` is the empty list. Each round picks the largest
    /// denomination not exceeding the remainder and takes as many of it
    /// as fit; the weighted sum of the result always equals the input.
    ///
    /// ## Errors
    /// [`CoreError::UnrepresentableAmount`] when no denomination fits the
    /// remainder (including negative inputs, which no coin can express).
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::coins::CoinSet;
    /// use vendo_core::money::Money;
    ///
    /// let coins = CoinSet::default();
    /// let change = coins.decompose(Money::from_cents(80)).unwrap();
    /// let rendered: Vec<(i64, i64)> = change.iter().map(|c| (c.value, c.count)).collect();
    /// assert_eq!(rendered, vec![(50, 1), (20, 1), (10, 1)]);
    /// ```
    pub fn decompose(&self, amount: Money) -> CoreResult<Vec<CoinCount>> {
        let amount = amount.cents();
        let mut remaining = amount;
        let mut counts = Vec::new();

        if remaining < 0 {
            return Err(self.unrepresentable(amount, remaining));
        }

        while remaining > 0 {
            // values is sorted descending, so the first fit is the largest.
            let coin = match self.values.iter().copied().find(|v| *v <= remaining) {
                Some(coin) => coin,
                None => return Err(self.unrepresentable(amount, remaining)),
            };

            counts.push(CoinCount {
                value: coin,
                count: remaining / coin,
            });
            remaining %= coin;
        }

        Ok(counts)
    }

    fn unrepresentable(&self, amount: i64, remainder: i64) -> CoreError {
        CoreError::UnrepresentableAmount {
            amount,
            remainder,
            coins: self.values.clone(),
        }
    }
}

/// Default set is the configured marketplace denominations.
impl Default for CoinSet {
    fn default() -> Self {
        // DEFAULT_COIN_VALUES is non-empty and positive, so new() cannot fail.
        CoinSet {
            values: {
                let mut values = DEFAULT_COIN_VALUES.to_vec();
                values.sort_unstable_by(|a, b| b.cmp(a));
                values
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(change: &[CoinCount]) -> Vec<(i64, i64)> {
        change.iter().map(|c| (c.value, c.count)).collect()
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let set = CoinSet::new([10, 5, 100, 50, 20, 10]).unwrap();
        assert_eq!(set.values(), &[100, 50, 20, 10, 5]);
    }

    #[test]
    fn test_new_rejects_empty_and_non_positive() {
        assert!(CoinSet::new([]).is_err());
        assert!(CoinSet::new([5, 0]).is_err());
        assert!(CoinSet::new([-5, 10]).is_err());
    }

    #[test]
    fn test_contains() {
        let set = CoinSet::default();
        assert!(set.contains(5));
        assert!(set.contains(100));
        assert!(!set.contains(7));
        assert!(!set.contains(0));
    }

    #[test]
    fn test_ensure_supported() {
        let set = CoinSet::default();
        assert!(set.ensure_supported(50).is_ok());

        let err = set.ensure_supported(7).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedDenomination { value: 7, .. }
        ));
    }

    #[test]
    fn test_decompose_zero_is_empty() {
        let set = CoinSet::default();
        assert_eq!(set.decompose(Money::zero()).unwrap(), vec![]);
    }

    #[test]
    fn test_decompose_eighty() {
        let set = CoinSet::default();
        let change = set.decompose(Money::from_cents(80)).unwrap();
        assert_eq!(counts(&change), vec![(50, 1), (20, 1), (10, 1)]);
    }

    #[test]
    fn test_decompose_takes_multiple_of_one_denomination() {
        let set = CoinSet::default();
        let change = set.decompose(Money::from_cents(300)).unwrap();
        assert_eq!(counts(&change), vec![(100, 3)]);

        let change = set.decompose(Money::from_cents(265)).unwrap();
        assert_eq!(counts(&change), vec![(100, 2), (50, 1), (10, 1), (5, 1)]);
    }

    #[test]
    fn test_decompose_weighted_sum_matches_amount() {
        let set = CoinSet::default();
        for amount in (0..=500).step_by(5) {
            let change = set.decompose(Money::from_cents(amount)).unwrap();
            let sum: i64 = change.iter().map(CoinCount::total).sum();
            assert_eq!(sum, amount, "amount {amount} round-trips");
        }
    }

    #[test]
    fn test_decompose_is_greedy_optimal_for_canonical_set() {
        // {5,10,20,50,100} is a canonical system: greedy is optimal.
        // Spot-check that no denomination count exceeds what greedy picks.
        let set = CoinSet::default();
        let change = set.decompose(Money::from_cents(185)).unwrap();
        assert_eq!(counts(&change), vec![(100, 1), (50, 1), (20, 1), (10, 1), (5, 1)]);
    }

    #[test]
    fn test_decompose_unrepresentable() {
        let set = CoinSet::default();

        // 7 = 5 + 2, and nothing expresses the remainder 2.
        let err = set.decompose(Money::from_cents(7)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnrepresentableAmount {
                amount: 7,
                remainder: 2,
                ..
            }
        ));

        // 3 is below the smallest coin entirely.
        let err = set.decompose(Money::from_cents(3)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnrepresentableAmount { remainder: 3, .. }
        ));
    }

    #[test]
    fn test_decompose_negative_is_unrepresentable() {
        let set = CoinSet::default();
        let err = set.decompose(Money::from_cents(-5)).unwrap_err();
        assert!(matches!(err, CoreError::UnrepresentableAmount { .. }));
    }

    #[test]
    fn test_coin_count_wire_shape() {
        let entry = CoinCount { value: 50, count: 2 };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"value": 50, "count": 2}));
    }
}
