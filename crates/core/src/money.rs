//! Money value object.

use core::iter::Sum;
use core::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// An amount of money in cents.
///
/// Signed so that differences (cash surplus / shortfall, net results) are
/// representable. JSON carries the raw number of cents; spreadsheets store
/// the decimal amount (`12.50`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Convert a decimal amount (as stored in a spreadsheet cell) to cents,
    /// rounding half away from zero.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Decimal amount for spreadsheet cells.
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// `self × numerator / denominator`, rounded half-up to the cent.
    ///
    /// Used for per-kilogram prices applied to gram quantities.
    pub fn scaled(self, numerator: i64, denominator: i64) -> Option<Money> {
        if denominator <= 0 {
            return None;
        }
        let product = (self.0 as i128).checked_mul(numerator as i128)?;
        let half = denominator as i128 / 2;
        let rounded = if product >= 0 {
            (product + half) / denominator as i128
        } else {
            (product - half) / denominator as i128
        };
        i64::try_from(rounded).ok().map(Money)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_decimals_with_sign() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-730).to_string(), "-7.30");
    }

    #[test]
    fn decimal_conversion_rounds_to_the_cent() {
        assert_eq!(Money::from_decimal(12.5), Some(Money::from_cents(1250)));
        assert_eq!(Money::from_decimal(0.1 + 0.2), Some(Money::from_cents(30)));
        assert_eq!(Money::from_decimal(f64::NAN), None);
        assert_eq!(Money::from_cents(1999).to_decimal(), 19.99);
    }

    #[test]
    fn scaled_rounds_half_up() {
        // 29.90 per kg, 250 g => 7.475 => 7.48
        let price = Money::from_cents(2990);
        assert_eq!(price.scaled(250, 1000), Some(Money::from_cents(748)));
        // 10.00 per kg, 333 g => 3.33
        assert_eq!(Money::from_cents(1000).scaled(333, 1000), Some(Money::from_cents(333)));
        assert_eq!(price.scaled(1, 0), None);
    }

    #[test]
    fn sums_money() {
        let total: Money = [100, 250, -50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(300));
    }
}
