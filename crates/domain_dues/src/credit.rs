//! Overpayment credits ("avoirs")
//!
//! A credit is created exactly once per overpayment event and consumed,
//! possibly across several obligations or debts, oldest-first. Exhausted
//! credits are kept as an audit trail, never deleted.

use chrono::{DateTime, Utc};
use core_kernel::{CreditId, MemberId, Money};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Credit lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// Some balance remains to be consumed
    Available,
    /// Fully consumed; retained for audit only
    Exhausted,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Available => "available",
            CreditStatus::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreditStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CreditStatus::Available),
            "exhausted" => Ok(CreditStatus::Exhausted),
            other => Err(LedgerError::validation(format!(
                "unknown credit status: {other}"
            ))),
        }
    }
}

/// A member's unspent overpayment balance
///
/// Invariant: `amount_used + amount_remaining == amount`, all non-negative.
/// `created_at` defines the FIFO consumption order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    pub member_id: MemberId,
    pub amount: Money,
    pub amount_used: Money,
    pub amount_remaining: Money,
    pub status: CreditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credit {
    /// Creates a fresh credit holding the full surplus
    pub fn new(member_id: MemberId, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: CreditId::new_v7(),
            member_id,
            amount,
            amount_used: Money::ZERO,
            amount_remaining: amount,
            status: CreditStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Consumes up to `wanted` from this credit, returning the amount taken
    ///
    /// Partial consumption is allowed; the status flips to Exhausted when
    /// the remaining balance reaches zero.
    pub fn consume(&mut self, wanted: Money) -> Money {
        let taken = wanted.min(self.amount_remaining);
        if !taken.is_positive() {
            return Money::ZERO;
        }
        self.amount_used = self.amount_used + taken;
        self.amount_remaining = self.amount_remaining.saturating_sub(taken);
        if self.amount_remaining.is_zero() {
            self.status = CreditStatus::Exhausted;
        }
        self.updated_at = Utc::now();
        taken
    }

    pub fn is_available(&self) -> bool {
        self.status == CreditStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_partially_then_exhaust() {
        let mut credit = Credit::new(MemberId::new(), Money::from_minor(1000));

        assert_eq!(credit.consume(Money::from_minor(400)).minor(), 400);
        assert!(credit.is_available());
        assert_eq!(credit.amount_remaining.minor(), 600);

        assert_eq!(credit.consume(Money::from_minor(9999)).minor(), 600);
        assert_eq!(credit.status, CreditStatus::Exhausted);
        assert_eq!(credit.amount_used + credit.amount_remaining, credit.amount);
    }

    #[test]
    fn consuming_an_exhausted_credit_yields_zero() {
        let mut credit = Credit::new(MemberId::new(), Money::from_minor(100));
        credit.consume(Money::from_minor(100));
        assert!(credit.consume(Money::from_minor(50)).is_zero());
    }
}
