//! Monthly obligation generation
//!
//! Creates the two recurring obligations for one member and one period.
//! The operation is idempotent: rows that already exist for the
//! (member, period, due-type) triple are skipped, so the batch can be
//! re-run safely.

use chrono::NaiveDate;
use core_kernel::{Money, Period};
use tracing::debug;

use crate::allocation;
use crate::book::MemberBook;
use crate::error::LedgerError;
use crate::obligation::{DueType, Obligation};

/// The amounts charged for one period
#[derive(Debug, Clone, Copy)]
pub struct PeriodCharges {
    pub period: Period,
    pub flat_fee: Money,
    pub assistance_fee: Money,
}

impl PeriodCharges {
    /// Validates that both charges are positive
    pub fn new(
        period: Period,
        flat_fee: Money,
        assistance_fee: Money,
    ) -> Result<Self, LedgerError> {
        if !flat_fee.is_positive() || !assistance_fee.is_positive() {
            return Err(LedgerError::validation(
                "period charges must be positive amounts",
            ));
        }
        Ok(Self {
            period,
            flat_fee,
            assistance_fee,
        })
    }
}

/// Generates the period's obligations for one member
///
/// Each freshly created obligation immediately receives the member's
/// available credits, oldest first, so an existing credit never sits idle
/// once a new liability appears. Returns the number of obligations
/// created (0, 1, or 2).
pub fn generate_for_member(
    book: &mut MemberBook,
    charges: &PeriodCharges,
    as_of: NaiveDate,
) -> Result<u32, LedgerError> {
    let mut created = 0;

    for (due_type, amount) in [
        (DueType::FlatFee, charges.flat_fee),
        (DueType::AssistanceFee, charges.assistance_fee),
    ] {
        if book.has_obligation(charges.period, due_type) {
            continue;
        }

        let obligation = Obligation::new(book.member.id, due_type, charges.period, amount, as_of);
        let obligation_id = obligation.id;
        book.obligations.push(obligation);
        allocation::apply_available_credits(book, obligation_id, as_of)?;
        created += 1;
    }

    if created > 0 {
        debug!(
            member = %book.member.id,
            period = %charges.period,
            created,
            "generated monthly obligations"
        );
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::Credit;
    use crate::member::Member;
    use crate::obligation::ObligationStatus;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn charges() -> PeriodCharges {
        PeriodCharges::new(
            Period::new(2025, 3).unwrap(),
            Money::from_minor(2000),
            Money::from_minor(1000),
        )
        .unwrap()
    }

    #[test]
    fn generates_both_due_types_once() {
        let mut book = MemberBook::new(Member::new("Generated"));

        assert_eq!(generate_for_member(&mut book, &charges(), as_of()).unwrap(), 2);
        assert_eq!(book.obligations.len(), 2);

        // re-running creates nothing
        assert_eq!(generate_for_member(&mut book, &charges(), as_of()).unwrap(), 0);
        assert_eq!(book.obligations.len(), 2);
    }

    #[test]
    fn fills_in_a_missing_due_type_only() {
        let mut book = MemberBook::new(Member::new("Partial"));
        book.obligations.push(Obligation::new(
            book.member.id,
            DueType::FlatFee,
            Period::new(2025, 3).unwrap(),
            Money::from_minor(2000),
            as_of(),
        ));

        assert_eq!(generate_for_member(&mut book, &charges(), as_of()).unwrap(), 1);
        assert!(book.has_obligation(Period::new(2025, 3).unwrap(), DueType::AssistanceFee));
    }

    #[test]
    fn fresh_obligations_absorb_existing_credit() {
        let mut book = MemberBook::new(Member::new("Credited"));
        book.credits
            .push(Credit::new(book.member.id, Money::from_minor(2500)));

        generate_for_member(&mut book, &charges(), as_of()).unwrap();

        // 25.00 of credit covers the 20.00 flat fee and 5.00 of assistance
        let flat = book
            .oldest_open_obligation(DueType::FlatFee);
        assert!(flat.is_none(), "flat fee should be fully covered");
        let assistance = book.oldest_open_obligation(DueType::AssistanceFee).unwrap();
        assert_eq!(assistance.amount_remaining.minor(), 500);
        assert_eq!(assistance.status, ObligationStatus::PartiallyPaid);
        assert!(book.available_credit().is_zero());
        book.check_invariants().unwrap();
    }

    #[test]
    fn rejects_non_positive_charges() {
        let result = PeriodCharges::new(
            Period::new(2025, 3).unwrap(),
            Money::ZERO,
            Money::from_minor(1000),
        );
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }
}
