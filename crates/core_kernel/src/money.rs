//! Money with exact minor-unit arithmetic
//!
//! Amounts are stored as integer cents in a single implicit currency.
//! `rust_decimal` appears only at the I/O boundary (parsing, display,
//! serialization); no floating point is involved anywhere.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount {0} has sub-cent precision")]
    SubCentPrecision(Decimal),

    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),

    #[error("cannot parse amount from {0:?}")]
    Unparseable(String),

    #[error("overflow during money arithmetic")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot split an amount into zero parts")]
    EmptySplit,
}

/// A monetary amount in integer minor units (cents)
///
/// The ledger's conservation invariants depend on exact arithmetic, so
/// every operation here is integer-based. Division helpers round half-up
/// (away from zero at the midpoint) and splitting never loses or
/// fabricates a cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a Money value from integer minor units (cents)
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Converts a decimal amount (e.g. `"12.34"`) into Money
    ///
    /// # Errors
    ///
    /// Rejects amounts carrying more than two fractional digits and
    /// amounts outside the representable range.
    pub fn try_from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let minor = amount * Decimal::ONE_HUNDRED;
        if !minor.fract().is_zero() {
            return Err(MoneyError::SubCentPrecision(amount));
        }
        minor
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::OutOfRange(amount))
    }

    /// Returns the amount in minor units
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a two-decimal `Decimal` (I/O boundary only)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Checked addition
    pub fn checked_add(&self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_sub(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    /// Subtraction clamped to zero; the allocation engine uses this so a
    /// remaining balance can never go negative
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// The smaller of two amounts
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Divides by an integer count, rounding half-up away from zero
    pub fn div_round(&self, divisor: i64) -> Result<Money, MoneyError> {
        if divisor == 0 {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Money(div_round_half_up(
            self.0 as i128,
            divisor.unsigned_abs() as i128,
        ) as i64
            * divisor.signum()))
    }

    /// Splits the amount into `n` parts differing by at most one cent
    ///
    /// The leftover cents go to the first parts, so the parts always sum
    /// back to the original amount.
    pub fn split_even(&self, n: u32) -> Result<Vec<Money>, MoneyError> {
        if n == 0 {
            return Err(MoneyError::EmptySplit);
        }
        let n = n as i64;
        let base = self.0 / n;
        let rem = self.0 % n;
        let parts = (0..n)
            .map(|i| {
                let extra = if i < rem.abs() { rem.signum() } else { 0 };
                Money(base + extra)
            })
            .collect();
        Ok(parts)
    }

    /// Splits the amount proportionally to the given weights
    ///
    /// Every part but the last rounds half-up; the last part absorbs the
    /// remainder so the parts sum exactly to the original amount.
    pub fn split_weighted(&self, weights: &[u32]) -> Result<Vec<Money>, MoneyError> {
        if weights.is_empty() {
            return Err(MoneyError::EmptySplit);
        }
        let total: i128 = weights.iter().map(|w| *w as i128).sum();
        if total == 0 {
            return Err(MoneyError::DivisionByZero);
        }

        let mut allocated: i64 = 0;
        let mut parts = Vec::with_capacity(weights.len());
        for (i, weight) in weights.iter().enumerate() {
            if i == weights.len() - 1 {
                parts.push(Money(self.0 - allocated));
            } else {
                let share =
                    div_round_half_up(self.0 as i128 * *weight as i128, total) as i64;
                allocated += share;
                parts.push(Money(share));
            }
        }
        Ok(parts)
    }
}

/// Rounds `num / den` half-up, away from zero at the midpoint. `den > 0`.
fn div_round_half_up(num: i128, den: i128) -> i128 {
    let sign = if num < 0 { -1 } else { 1 };
    sign * ((num.abs() * 2 + den) / (den * 2))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|_| MoneyError::Unparseable(s.to_string()))?;
        Money::try_from_decimal(decimal)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(other).expect("money addition overflow")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(other).expect("money subtraction overflow")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decimal = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::try_from_decimal(decimal).map_err(serde::de::Error::custom)
    }
}
