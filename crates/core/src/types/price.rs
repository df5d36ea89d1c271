//! Decimal money amounts.
//!
//! The remote catalog is single-currency and sends prices as bare JSON
//! numbers, so [`Price`] carries no currency code. All arithmetic is decimal;
//! binary floating point never touches an amount.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A non-currency-tagged money amount.
///
/// Deserializes from either a JSON number (`12.5`) or a string (`"12.50"`).
/// Serializes as a string so persisted snapshots round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        // `Decimal::new` is not `const`; build the same value from its parts.
        let abs = cents.unsigned_abs();
        Self(Decimal::from_parts(
            abs as u32,
            (abs >> 32) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to cents, halves away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.round_cents().0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(2999).amount(), Decimal::new(2999, 2));
        assert_eq!(Price::from_cents(-150).amount(), Decimal::new(-150, 2));
    }

    #[test]
    fn test_round_cents_midpoint_away_from_zero() {
        let price = Price::new(Decimal::new(10_005, 3));
        assert_eq!(price.round_cents(), Price::from_cents(1001));
    }

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::new(Decimal::new(5, 0)).to_string(), "$5.00");
        assert_eq!(Price::from_cents(14_999).to_string(), "$149.99");
    }

    #[test]
    fn test_line_arithmetic() {
        let total: Price = [Price::from_cents(5000) * 2, Price::from_cents(6000)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(16_000));
    }

    #[test]
    fn test_deserializes_number_and_string() {
        let from_number: Price = serde_json::from_str("1139.76").unwrap();
        let from_string: Price = serde_json::from_str("\"1139.76\"").unwrap();
        assert_eq!(from_number, Price::from_cents(113_976));
        assert_eq!(from_string, from_number);
    }
}
