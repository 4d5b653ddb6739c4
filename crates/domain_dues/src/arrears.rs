//! Arrears computation
//!
//! Figures are recomputed from the raw rows on every read. There is no
//! cached running balance anywhere; a stale aggregate cannot drift from
//! the ledger because no aggregate is ever stored.

use chrono::NaiveDate;
use core_kernel::{MemberId, Money, Period};
use serde::Serialize;

use crate::book::MemberBook;
use crate::obligation::{DueType, ObligationStatus};

/// Arrears policy knobs
#[derive(Debug, Clone)]
pub struct ArrearsPolicy {
    /// Typical monthly total (flat fee + assistance fee), the divisor for
    /// months-in-arrears
    pub average_monthly_due: Money,
    /// A member is in arrears from this many months of net debt
    pub months_threshold: u32,
}

impl ArrearsPolicy {
    pub const DEFAULT_MONTHS_THRESHOLD: u32 = 3;

    pub fn new(average_monthly_due: Money, months_threshold: u32) -> Self {
        Self {
            average_monthly_due,
            months_threshold,
        }
    }
}

impl Default for ArrearsPolicy {
    fn default() -> Self {
        Self {
            average_monthly_due: Money::from_minor(3000),
            months_threshold: Self::DEFAULT_MONTHS_THRESHOLD,
        }
    }
}

/// Per-member aggregate debt state, derived on demand
#[derive(Debug, Clone, Serialize)]
pub struct MemberDebtSummary {
    pub member_id: MemberId,
    /// Σ remaining over open obligations
    pub outstanding_obligations: Money,
    /// Σ remaining over open initial debts
    pub outstanding_initial_debt: Money,
    /// Σ remaining over available credits
    pub available_credit: Money,
    pub gross_debt: Money,
    /// `max(0, gross - credit)`
    pub net_debt: Money,
    pub months_in_arrears: u32,
    pub in_arrears: bool,
    /// Remaining flat fee for the current period; zero until the period's
    /// obligation row actually exists
    pub current_month_flat_fee: Money,
    /// Remaining assistance fee for the current period, same rule
    pub current_month_assistance_fee: Money,
}

/// Computes the debt summary for one member
///
/// The current-month figures deliberately count only obligations whose
/// row already exists: a month the batch generator has not yet produced
/// contributes nothing, even though historical arrears still count.
pub fn debt_summary(
    book: &MemberBook,
    policy: &ArrearsPolicy,
    as_of: NaiveDate,
) -> MemberDebtSummary {
    let outstanding_obligations: Money = book
        .obligations
        .iter()
        .filter(|o| {
            matches!(
                o.status_as_of(as_of),
                ObligationStatus::Pending
                    | ObligationStatus::PartiallyPaid
                    | ObligationStatus::Overdue
            )
        })
        .map(|o| o.amount_remaining)
        .sum();

    let outstanding_initial_debt: Money = book
        .initial_debts
        .iter()
        .filter(|d| d.is_open())
        .map(|d| d.amount_remaining)
        .sum();

    let available_credit = book.available_credit();

    let gross_debt = outstanding_obligations + outstanding_initial_debt;
    let net_debt = gross_debt.saturating_sub(available_credit);

    let months_in_arrears = if policy.average_monthly_due.is_zero() {
        0
    } else {
        (net_debt.minor() / policy.average_monthly_due.minor()).clamp(0, u32::MAX as i64) as u32
    };
    let in_arrears = months_in_arrears >= policy.months_threshold;

    let current_period = Period::from_date(as_of);
    let current_month_flat_fee = current_period_remaining(book, current_period, DueType::FlatFee);
    let current_month_assistance_fee =
        current_period_remaining(book, current_period, DueType::AssistanceFee);

    MemberDebtSummary {
        member_id: book.member.id,
        outstanding_obligations,
        outstanding_initial_debt,
        available_credit,
        gross_debt,
        net_debt,
        months_in_arrears,
        in_arrears,
        current_month_flat_fee,
        current_month_assistance_fee,
    }
}

fn current_period_remaining(book: &MemberBook, period: Period, due_type: DueType) -> Money {
    book.obligations
        .iter()
        .filter(|o| o.period == period && o.due_type == due_type)
        .map(|o| o.amount_remaining)
        .sum()
}
