//! Assertion helpers for monetary invariants
//!
//! These give more meaningful failure messages than bare `assert_eq!` on
//! minor units.

use core_kernel::Money;
use domain_dues::{Credit, InitialDebt, MemberBook, Obligation};

/// Asserts that a Money value equals the given decimal string form
///
/// # Panics
///
/// Panics if the amounts differ, printing both in decimal form
pub fn assert_money_eq(actual: Money, expected: &str) {
    let expected: Money = expected
        .parse()
        .unwrap_or_else(|e| panic!("bad expected amount {expected:?}: {e}"));
    assert_eq!(
        actual, expected,
        "amounts differ: actual={actual}, expected={expected}"
    );
}

/// Asserts the conservation invariant on one obligation
pub fn assert_obligation_conserved(obligation: &Obligation) {
    assert_eq!(
        obligation.amount_paid + obligation.amount_remaining,
        obligation.amount_expected,
        "obligation {} violates conservation: paid={} remaining={} expected={}",
        obligation.id,
        obligation.amount_paid,
        obligation.amount_remaining,
        obligation.amount_expected,
    );
    assert!(!obligation.amount_remaining.is_negative());
    assert!(!obligation.amount_paid.is_negative());
}

/// Asserts the conservation invariant on one credit
pub fn assert_credit_conserved(credit: &Credit) {
    assert_eq!(
        credit.amount_used + credit.amount_remaining,
        credit.amount,
        "credit {} violates conservation",
        credit.id,
    );
    assert!(!credit.amount_remaining.is_negative());
}

/// Asserts the conservation invariant on one initial debt
pub fn assert_debt_conserved(debt: &InitialDebt) {
    assert_eq!(
        debt.amount_paid + debt.amount_remaining,
        debt.amount,
        "initial debt {} violates conservation",
        debt.id,
    );
    assert!(!debt.amount_remaining.is_negative());
}

/// Asserts every row of a book is conserved and non-negative
pub fn assert_book_conserved(book: &MemberBook) {
    if let Err(violation) = book.check_invariants() {
        panic!("book for member {} is corrupt: {violation}", book.member.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{MemberBookBuilder, ObligationBuilder};
    use crate::fixtures::PeriodFixtures;

    #[test]
    fn assert_money_eq_accepts_equal_amounts() {
        assert_money_eq(Money::from_minor(1234), "12.34");
    }

    #[test]
    #[should_panic(expected = "amounts differ")]
    fn assert_money_eq_panics_on_mismatch() {
        assert_money_eq(Money::from_minor(1234), "12.35");
    }

    #[test]
    fn fresh_rows_are_conserved() {
        let book = MemberBookBuilder::new()
            .owing_month(PeriodFixtures::january())
            .build();
        assert_book_conserved(&book);
        assert_obligation_conserved(&book.obligations[0]);

        let obligation = ObligationBuilder::for_member(book.member.id).build();
        assert_obligation_conserved(&obligation);
    }
}
