//! Exact fixed-point money arithmetic on top of `rust_decimal`.
//!
//! Prices, totals and fees carry 2 decimal places, traded quantities up to 8.
//! Multiplication keeps full precision; only division and explicit rescaling
//! round, always half-up.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`Money`] construction and division.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid decimal value: {0}")]
    Parse(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Signed decimal amount with an explicit scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE_HUNDRED: Money = Money(Decimal::ONE_HUNDRED);

    /// Scale used for prices, totals and fees.
    pub const CURRENCY_SCALE: u32 = 2;
    /// Scale used for traded quantities.
    pub const QUANTITY_SCALE: u32 = 8;
    /// Scale of a ratio before it is turned into a percentage.
    pub const RATIO_SCALE: u32 = 4;

    /// Build from an integer-scaled representation, e.g. `Money::new(12345, 2)` is 123.45.
    pub fn new(units: i64, scale: u32) -> Self {
        Self(Decimal::new(units, scale))
    }

    pub const fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn checked_mul(self, rhs: Money) -> Option<Money> {
        self.0.checked_mul(rhs.0).map(Money)
    }

    /// Divide and round half-up to `scale` decimal places.
    pub fn checked_div(self, rhs: Money, scale: u32) -> Result<Money, MoneyError> {
        if rhs.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        let quotient = self.0.checked_div(rhs.0).ok_or(MoneyError::Overflow)?;
        Ok(Money(quotient).rescale(scale))
    }

    /// Round half-up to `scale` places and pad so the result carries exactly that scale.
    pub fn rescale(self, scale: u32) -> Money {
        let mut value = self
            .0
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(scale);
        Money(value)
    }

    pub fn round_currency(self) -> Money {
        self.rescale(Self::CURRENCY_SCALE)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Money)
            .map_err(|_| MoneyError::Parse(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul for Money {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
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
    use rust_decimal_macros::dec;

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_construction() {
        assert_eq!(Money::new(12345, 2), m("123.45"));
        assert_eq!(Money::new(12345, 2).scale(), 2);
        assert_eq!(Money::from(dec!(0.5)), m("0.50"));
        assert_eq!(m(" 42 "), Money::from(42_i64));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Parse(_))));
    }

    #[test]
    fn test_multiplication_keeps_precision() {
        let qty = m("0.12345678");
        let price = m("100.01");
        let product = qty * price;
        assert_eq!(product.amount(), dec!(12.3469125678));
        assert_eq!(product.scale(), 10);
    }

    #[test]
    fn test_division_rounds_half_up() {
        assert_eq!(m("2").checked_div(m("3"), 4).unwrap(), m("0.6667"));
        assert_eq!(m("1").checked_div(m("8"), 2).unwrap(), m("0.13")); // 0.125
        assert_eq!(m("-1").checked_div(m("8"), 2).unwrap(), m("-0.13"));
        assert_eq!(m("1").checked_div(m("4"), 4).unwrap().scale(), 4);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            m("10").checked_div(Money::ZERO, 4),
            Err(MoneyError::DivisionByZero)
        );
        assert_eq!(
            m("10").checked_div(m("0.00"), 2),
            Err(MoneyError::DivisionByZero)
        );
    }

    #[test]
    fn test_rescale_pads_and_rounds() {
        assert_eq!(m("100").round_currency().to_string(), "100.00");
        assert_eq!(m("1.005").round_currency(), m("1.01"));
        assert_eq!(m("1.004").round_currency(), m("1.00"));
        assert_eq!(m("2.5").rescale(0), m("3"));
    }

    #[test]
    fn test_exact_comparison() {
        assert_eq!(m("1.0"), m("1.00"));
        assert!(m("0.30") > m("0.29999999"));
        assert_ne!(m("0.1") + m("0.2"), m("0.30000001"));
        assert_eq!(m("0.1") + m("0.2"), m("0.3"));
    }

    #[test]
    fn test_checked_overflow() {
        let big = Money::from(Decimal::MAX);
        assert!(big.checked_mul(m("2")).is_none());
        assert!(big.checked_add(big).is_none());
        assert_eq!(m("3").checked_sub(m("5")), Some(m("-2")));
    }

    #[test]
    fn test_sum() {
        let values = vec![m("1.10"), m("2.20"), m("-0.30")];
        assert_eq!(values.iter().sum::<Money>(), m("3.00"));
        assert_eq!(Vec::<Money>::new().into_iter().sum::<Money>(), Money::ZERO);
    }
}
