use crate::error::{PaymentError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of decimal places carried by every monetary value (cents).
pub const SCALE: u32 = 2;

/// Represents a monetary value with 2 decimal places precision.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for financial calculations. Every constructor normalises
/// the value to [`SCALE`], truncating extra digits toward zero, so the value can be
/// stored losslessly as integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, SCALE));

    pub fn new(value: Decimal) -> Self {
        let mut value = value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero);
        value.rescale(SCALE);
        Self(value)
    }

    pub fn from_minor_units(units: i64) -> Self {
        Self(Decimal::new(units, SCALE))
    }

    /// Returns the value in cents.
    pub fn minor_units(&self) -> Result<i64> {
        i64::try_from(self.0.mantissa())
            .map_err(|_| PaymentError::ValidationError("Amount out of range".to_string()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Multiplies by `ratio`, truncating the result to whole cents.
    pub fn portion(&self, ratio: Decimal) -> Self {
        Self::new(self.0 * ratio)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Represents a positive monetary amount requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Money);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        let money = Money::new(value);
        if money.is_positive() {
            Ok(Self(money))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn money(&self) -> Money {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
