//! Legacy initial debts
//!
//! One row per (member, year), representing a balance that predates the
//! recurring obligation cycle. Created manually by an administrator and
//! reduced only by the credit sweep.

use chrono::{DateTime, Utc};
use core_kernel::{InitialDebtId, MemberId, Money};
use serde::{Deserialize, Serialize};

/// A legacy yearly balance carried into the recurring system
///
/// Shares the obligation conservation invariant:
/// `amount_paid + amount_remaining == amount`, all non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialDebt {
    pub id: InitialDebtId,
    pub member_id: MemberId,
    pub year: i32,
    pub amount: Money,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InitialDebt {
    /// Creates an untouched debt for the given year
    pub fn new(member_id: MemberId, year: i32, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: InitialDebtId::new_v7(),
            member_id,
            year,
            amount,
            amount_paid: Money::ZERO,
            amount_remaining: amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies swept funds, capped at the remaining amount
    ///
    /// Returns the amount actually applied.
    pub fn apply(&mut self, amount: Money) -> Money {
        let applied = amount.min(self.amount_remaining);
        if !applied.is_positive() {
            return Money::ZERO;
        }
        self.amount_paid = self.amount_paid + applied;
        self.amount_remaining = self.amount_remaining.saturating_sub(applied);
        self.updated_at = Utc::now();
        applied
    }

    /// True while any amount remains
    pub fn is_open(&self) -> bool {
        !self.amount_remaining.is_zero()
    }
}
