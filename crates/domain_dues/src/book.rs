//! The per-member ledger book
//!
//! A `MemberBook` gathers everything the allocation engine may touch for
//! one member: obligations, initial debts, and credits. It is the unit of
//! locking and of atomic persistence: a settlement mutates a book and the
//! storage adapter commits it in one transaction or not at all.

use core_kernel::{CreditId, InitialDebtId, Money, ObligationId, Period};
use serde::{Deserialize, Serialize};

use crate::credit::Credit;
use crate::error::LedgerError;
use crate::initial_debt::InitialDebt;
use crate::member::Member;
use crate::obligation::{DueType, Obligation};

/// One member's complete dues position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberBook {
    pub member: Member,
    pub obligations: Vec<Obligation>,
    pub initial_debts: Vec<InitialDebt>,
    pub credits: Vec<Credit>,
}

impl MemberBook {
    /// Creates an empty book for a member
    pub fn new(member: Member) -> Self {
        Self {
            member,
            obligations: Vec::new(),
            initial_debts: Vec::new(),
            credits: Vec::new(),
        }
    }

    pub fn obligation(&self, id: ObligationId) -> Option<&Obligation> {
        self.obligations.iter().find(|o| o.id == id)
    }

    pub fn obligation_mut(&mut self, id: ObligationId) -> Option<&mut Obligation> {
        self.obligations.iter_mut().find(|o| o.id == id)
    }

    pub fn credit(&self, id: CreditId) -> Option<&Credit> {
        self.credits.iter().find(|c| c.id == id)
    }

    pub fn credit_mut(&mut self, id: CreditId) -> Option<&mut Credit> {
        self.credits.iter_mut().find(|c| c.id == id)
    }

    pub fn debt(&self, id: InitialDebtId) -> Option<&InitialDebt> {
        self.initial_debts.iter().find(|d| d.id == id)
    }

    pub fn debt_mut(&mut self, id: InitialDebtId) -> Option<&mut InitialDebt> {
        self.initial_debts.iter_mut().find(|d| d.id == id)
    }

    /// True if an obligation already exists for the period and due type;
    /// the period generator relies on this for idempotency
    pub fn has_obligation(&self, period: Period, due_type: DueType) -> bool {
        self.obligations
            .iter()
            .any(|o| o.period == period && o.due_type == due_type)
    }

    /// The oldest obligation of the given type that still has a balance
    pub fn oldest_open_obligation(&self, due_type: DueType) -> Option<&Obligation> {
        self.obligations
            .iter()
            .filter(|o| o.due_type == due_type && o.is_open())
            .min_by_key(|o| (o.period, o.created_at))
    }

    /// Available credit ids in FIFO consumption order
    pub fn available_credit_ids(&self) -> Vec<CreditId> {
        let mut credits: Vec<&Credit> =
            self.credits.iter().filter(|c| c.is_available()).collect();
        credits.sort_by_key(|c| (c.created_at, *c.id.as_uuid()));
        credits.into_iter().map(|c| c.id).collect()
    }

    /// Open initial-debt ids, oldest year first
    pub fn open_debt_ids(&self) -> Vec<InitialDebtId> {
        let mut debts: Vec<&InitialDebt> =
            self.initial_debts.iter().filter(|d| d.is_open()).collect();
        debts.sort_by_key(|d| (d.year, d.created_at));
        debts.into_iter().map(|d| d.id).collect()
    }

    /// Total remaining credit balance
    pub fn available_credit(&self) -> Money {
        self.credits
            .iter()
            .filter(|c| c.is_available())
            .map(|c| c.amount_remaining)
            .sum()
    }

    /// Verifies conservation and non-negativity for every monetary row
    ///
    /// Storage adapters call this before committing, mirroring the check
    /// constraints of the relational schema. A violation is reported as a
    /// persistence failure and aborts the commit.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        for o in &self.obligations {
            check_row(
                "obligation",
                &o.id.to_string(),
                o.amount_expected,
                o.amount_paid,
                o.amount_remaining,
            )?;
        }
        for d in &self.initial_debts {
            check_row(
                "initial debt",
                &d.id.to_string(),
                d.amount,
                d.amount_paid,
                d.amount_remaining,
            )?;
        }
        for c in &self.credits {
            check_row(
                "credit",
                &c.id.to_string(),
                c.amount,
                c.amount_used,
                c.amount_remaining,
            )?;
        }
        Ok(())
    }
}

fn check_row(
    entity: &str,
    id: &str,
    total: Money,
    used: Money,
    remaining: Money,
) -> Result<(), LedgerError> {
    if used.is_negative() || remaining.is_negative() {
        return Err(LedgerError::persistence(format!(
            "{entity} {id} has a negative balance"
        )));
    }
    if used + remaining != total {
        return Err(LedgerError::persistence(format!(
            "{entity} {id} violates conservation: {used} + {remaining} != {total}"
        )));
    }
    Ok(())
}
