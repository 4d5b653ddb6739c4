//! The allocation engine
//!
//! Pure functions over a `MemberBook`. A settlement consumes available
//! credits FIFO before the incoming payment, caps the payment at what the
//! obligation still needs, turns any surplus into exactly one new credit,
//! and immediately sweeps credits into the member's initial debts so
//! surplus funds never sit idle while older debt exists.
//!
//! Nothing here performs I/O; the caller holds the member lock and
//! persists the mutated book as a single atomic unit.

use chrono::NaiveDate;
use core_kernel::{Money, ObligationId};
use tracing::debug;

use crate::book::MemberBook;
use crate::credit::Credit;
use crate::error::LedgerError;
use crate::obligation::{Obligation, ObligationStatus};

/// The result of settling one obligation
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// Obligation snapshot after the settlement
    pub obligation: Obligation,
    /// Pre-existing credit consumed against the obligation
    pub credit_applied: Money,
    /// Portion of the incoming payment applied to the obligation
    pub amount_applied: Money,
    /// Portion of the incoming payment that exceeded the obligation
    pub surplus: Money,
    /// The credit created for the surplus, if any (post-sweep snapshot)
    pub credit_created: Option<Credit>,
    /// Total credit swept into initial debts during this settlement
    pub applied_to_initial_debt: Money,
}

/// Settles an obligation with an incoming payment
///
/// Steps, in order: credit sweep against the obligation, payment
/// application, surplus credit creation, initial-debt cascade. The
/// payment record itself is the caller's concern; it is persisted with
/// the book in the same transaction.
///
/// # Errors
///
/// - `NotFound` if the obligation is not in the book
/// - `AlreadySettled` if it is already Paid and `correction` is false
pub fn settle_obligation(
    book: &mut MemberBook,
    obligation_id: ObligationId,
    payment_amount: Money,
    as_of: NaiveDate,
    correction: bool,
) -> Result<SettlementOutcome, LedgerError> {
    let obligation = book
        .obligation(obligation_id)
        .ok_or_else(|| LedgerError::not_found("obligation", obligation_id))?;
    if obligation.status == ObligationStatus::Paid && !correction {
        return Err(LedgerError::AlreadySettled(obligation_id));
    }

    // credits are applied before the incoming payment
    let credit_applied = apply_available_credits(book, obligation_id, as_of)?;

    let obligation = book
        .obligation_mut(obligation_id)
        .ok_or_else(|| LedgerError::not_found("obligation", obligation_id))?;
    let amount_applied = obligation.apply(payment_amount, as_of);
    let surplus = payment_amount.saturating_sub(amount_applied);

    let mut credit_created_id = None;
    let mut applied_to_initial_debt = Money::ZERO;
    if surplus.is_positive() {
        let credit = Credit::new(book.member.id, surplus);
        credit_created_id = Some(credit.id);
        book.credits.push(credit);
        // surplus funds prefer the oldest unpaid liability
        applied_to_initial_debt = sweep_credits_into_initial_debt(book);
    }

    let obligation = book
        .obligation(obligation_id)
        .ok_or_else(|| LedgerError::not_found("obligation", obligation_id))?
        .clone();
    let credit_created = credit_created_id.and_then(|id| book.credit(id).cloned());

    debug!(
        member = %book.member.id,
        obligation = %obligation_id,
        %credit_applied,
        %amount_applied,
        %surplus,
        %applied_to_initial_debt,
        "settled obligation"
    );

    Ok(SettlementOutcome {
        obligation,
        credit_applied,
        amount_applied,
        surplus,
        credit_created,
        applied_to_initial_debt,
    })
}

/// Sweeps the member's available credits into one obligation, FIFO
///
/// Also run for freshly generated obligations so pre-existing credits are
/// consumed as soon as a new liability appears. Returns the total amount
/// applied.
pub fn apply_available_credits(
    book: &mut MemberBook,
    obligation_id: ObligationId,
    as_of: NaiveDate,
) -> Result<Money, LedgerError> {
    let mut total = Money::ZERO;

    for credit_id in book.available_credit_ids() {
        let needed = book
            .obligation(obligation_id)
            .ok_or_else(|| LedgerError::not_found("obligation", obligation_id))?
            .amount_remaining;
        if needed.is_zero() {
            break;
        }

        let Some(credit) = book.credit_mut(credit_id) else {
            continue;
        };
        let taken = credit.consume(needed);
        if taken.is_zero() {
            continue;
        }

        if let Some(obligation) = book.obligation_mut(obligation_id) {
            obligation.apply(taken, as_of);
        }
        total = total + taken;
    }

    Ok(total)
}

/// Entry B: sweeps available credits into initial debts
///
/// Debts are served oldest year first; within each debt, credits are
/// consumed FIFO. The loop ends when either every debt or every credit is
/// exhausted. Returns the total amount applied.
pub fn sweep_credits_into_initial_debt(book: &mut MemberBook) -> Money {
    let mut total = Money::ZERO;

    for debt_id in book.open_debt_ids() {
        for credit_id in book.available_credit_ids() {
            let Some(debt) = book.debt(debt_id) else {
                break;
            };
            let owed = debt.amount_remaining;
            if owed.is_zero() {
                break;
            }

            let Some(credit) = book.credit_mut(credit_id) else {
                continue;
            };
            let taken = credit.consume(owed);
            if taken.is_zero() {
                continue;
            }

            if let Some(debt) = book.debt_mut(debt_id) {
                debt.apply(taken);
            }
            total = total + taken;
        }
    }

    if total.is_positive() {
        debug!(member = %book.member.id, swept = %total, "credits swept into initial debt");
    }
    total
}
