//! Recurring dues obligations
//!
//! One obligation exists per (member, due-type, period). Obligations are
//! created by the period generator and mutated only by the allocation
//! engine; they are never deleted, only superseded by new periods.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{MemberId, Money, ObligationId, Period};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// The two recurring due types charged every month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueType {
    /// The fixed monthly membership fee
    FlatFee,
    /// The monthly mutual-assistance contribution
    AssistanceFee,
}

impl DueType {
    /// Stable machine form used in storage and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            DueType::FlatFee => "flat_fee",
            DueType::AssistanceFee => "assistance_fee",
        }
    }

    /// Human-readable label used in rendered messages
    pub fn label(&self) -> &'static str {
        match self {
            DueType::FlatFee => "flat fee",
            DueType::AssistanceFee => "assistance fee",
        }
    }
}

impl fmt::Display for DueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DueType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat_fee" => Ok(DueType::FlatFee),
            "assistance_fee" => Ok(DueType::AssistanceFee),
            other => Err(LedgerError::validation(format!(
                "unknown due type: {other}"
            ))),
        }
    }
}

/// Obligation status, derived deterministically from the amounts and the
/// due date; never stored authoritatively anywhere else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    /// Untouched and not yet past due
    Pending,
    /// Some but not all of the expected amount has been applied
    PartiallyPaid,
    /// Fully settled
    Paid,
    /// Untouched and past the due date
    Overdue,
}

impl ObligationStatus {
    /// Derives the status from the amount state and the evaluation date
    pub fn derive(
        remaining: Money,
        expected: Money,
        due_date: NaiveDate,
        as_of: NaiveDate,
    ) -> Self {
        if remaining.is_zero() {
            ObligationStatus::Paid
        } else if remaining < expected {
            ObligationStatus::PartiallyPaid
        } else if as_of > due_date {
            ObligationStatus::Overdue
        } else {
            ObligationStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::PartiallyPaid => "partially_paid",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObligationStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ObligationStatus::Pending),
            "partially_paid" => Ok(ObligationStatus::PartiallyPaid),
            "paid" => Ok(ObligationStatus::Paid),
            "overdue" => Ok(ObligationStatus::Overdue),
            other => Err(LedgerError::validation(format!(
                "unknown obligation status: {other}"
            ))),
        }
    }
}

/// A recurring due owed by one member for one period
///
/// # Invariants
///
/// - `amount_paid + amount_remaining == amount_expected` at all times
/// - all three amounts are non-negative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub member_id: MemberId,
    pub due_type: DueType,
    pub period: Period,
    pub amount_expected: Money,
    pub amount_paid: Money,
    pub amount_remaining: Money,
    pub status: ObligationStatus,
    /// Last day of the period's month
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Obligation {
    /// Creates a fresh, unpaid obligation due at the end of its period
    pub fn new(
        member_id: MemberId,
        due_type: DueType,
        period: Period,
        amount_expected: Money,
        as_of: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let due_date = period.last_day();

        Self {
            id: ObligationId::new_v7(),
            member_id,
            due_type,
            period,
            amount_expected,
            amount_paid: Money::ZERO,
            amount_remaining: amount_expected,
            status: ObligationStatus::derive(amount_expected, amount_expected, due_date, as_of),
            due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies funds to this obligation, capped at the remaining amount
    ///
    /// Returns the amount actually applied. The conservation invariant
    /// holds on both sides of the call.
    pub fn apply(&mut self, amount: Money, as_of: NaiveDate) -> Money {
        let applied = amount.min(self.amount_remaining);
        if !applied.is_positive() {
            return Money::ZERO;
        }
        self.amount_paid = self.amount_paid + applied;
        self.amount_remaining = self.amount_remaining.saturating_sub(applied);
        self.refresh_status(as_of);
        self.updated_at = Utc::now();
        applied
    }

    /// Recomputes the stored status for the given evaluation date
    pub fn refresh_status(&mut self, as_of: NaiveDate) {
        self.status = self.status_as_of(as_of);
    }

    /// The status this obligation has when evaluated on `as_of`
    pub fn status_as_of(&self, as_of: NaiveDate) -> ObligationStatus {
        ObligationStatus::derive(
            self.amount_remaining,
            self.amount_expected,
            self.due_date,
            as_of,
        )
    }

    /// True while any amount remains to be paid
    pub fn is_open(&self) -> bool {
        !self.amount_remaining.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obligation(expected_minor: i64) -> Obligation {
        Obligation::new(
            MemberId::new(),
            DueType::FlatFee,
            Period::new(2025, 3).unwrap(),
            Money::from_minor(expected_minor),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
    }

    #[test]
    fn new_obligation_is_pending_with_full_remaining() {
        let o = obligation(2000);
        assert_eq!(o.status, ObligationStatus::Pending);
        assert_eq!(o.amount_remaining, o.amount_expected);
        assert!(o.amount_paid.is_zero());
        assert_eq!(o.due_date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn obligation_created_for_a_past_period_is_overdue() {
        let o = Obligation::new(
            MemberId::new(),
            DueType::FlatFee,
            Period::new(2025, 1).unwrap(),
            Money::from_minor(2000),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        assert_eq!(o.status, ObligationStatus::Overdue);
    }

    #[test]
    fn apply_caps_at_remaining_and_conserves() {
        let mut o = obligation(2000);
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let applied = o.apply(Money::from_minor(500), as_of);
        assert_eq!(applied.minor(), 500);
        assert_eq!(o.status, ObligationStatus::PartiallyPaid);

        let applied = o.apply(Money::from_minor(9999), as_of);
        assert_eq!(applied.minor(), 1500);
        assert_eq!(o.status, ObligationStatus::Paid);
        assert!(o.amount_remaining.is_zero());
        assert_eq!(o.amount_paid + o.amount_remaining, o.amount_expected);
    }

    #[test]
    fn apply_zero_is_a_no_op() {
        let mut o = obligation(2000);
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(o.apply(Money::ZERO, as_of).is_zero());
        assert_eq!(o.status, ObligationStatus::Pending);
    }

    #[test]
    fn partial_payment_stays_partially_paid_past_due() {
        let mut o = obligation(2000);
        o.apply(
            Money::from_minor(500),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        );
        // past the due date, a touched obligation is still PartiallyPaid
        assert_eq!(
            o.status_as_of(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()),
            ObligationStatus::PartiallyPaid
        );
    }

    #[test]
    fn due_type_string_round_trip() {
        assert_eq!("flat_fee".parse::<DueType>().unwrap(), DueType::FlatFee);
        assert_eq!(
            "assistance_fee".parse::<DueType>().unwrap(),
            DueType::AssistanceFee
        );
        assert!("premium".parse::<DueType>().is_err());
    }

    #[test]
    fn wire_forms_use_snake_case() {
        assert_eq!(
            serde_json::to_string(&DueType::AssistanceFee).unwrap(),
            "\"assistance_fee\""
        );
        assert_eq!(
            serde_json::to_string(&ObligationStatus::PartiallyPaid).unwrap(),
            "\"partially_paid\""
        );
    }
}
