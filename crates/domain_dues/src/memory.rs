//! In-memory ledger store
//!
//! Backs the unit and API test suites and local development. Commits are
//! atomic by construction: the incoming book replaces the stored one in a
//! single swap after the invariant check, so a failed commit leaves the
//! previous state untouched.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use core_kernel::MemberId;

use crate::book::MemberBook;
use crate::error::LedgerError;
use crate::member::Member;
use crate::payment::Payment;
use crate::ports::LedgerStore;
use crate::reminder::Reminder;

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<HashMap<MemberId, MemberBook>>,
    payments: RwLock<Vec<Payment>>,
    reminders: RwLock<Vec<Reminder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded payments, for test inspection
    pub fn payments(&self) -> Vec<Payment> {
        self.payments
            .read()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// All reminder rows, for test inspection
    pub fn reminders(&self) -> Vec<Reminder> {
        self.reminders
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> LedgerError {
    LedgerError::persistence("ledger store lock poisoned")
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_member(&self, member: &Member) -> Result<(), LedgerError> {
        let mut books = self.books.write().map_err(poisoned)?;
        if books.contains_key(&member.id) {
            return Err(LedgerError::persistence(format!(
                "member {} already registered",
                member.id
            )));
        }
        books.insert(member.id, MemberBook::new(member.clone()));
        Ok(())
    }

    async fn member(&self, id: MemberId) -> Result<Option<Member>, LedgerError> {
        let books = self.books.read().map_err(poisoned)?;
        Ok(books.get(&id).map(|b| b.member.clone()))
    }

    async fn active_members(&self) -> Result<Vec<Member>, LedgerError> {
        let books = self.books.read().map_err(poisoned)?;
        let mut members: Vec<Member> = books
            .values()
            .map(|b| b.member.clone())
            .filter(|m| m.active)
            .collect();
        members.sort_by_key(|m| (m.created_at, *m.id.as_uuid()));
        Ok(members)
    }

    async fn load_book(&self, member_id: MemberId) -> Result<MemberBook, LedgerError> {
        let books = self.books.read().map_err(poisoned)?;
        books
            .get(&member_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("member", member_id))
    }

    async fn commit_book(
        &self,
        book: &MemberBook,
        payment: Option<&Payment>,
    ) -> Result<(), LedgerError> {
        // same guard a relational schema expresses as check constraints
        book.check_invariants()?;

        let mut books = self.books.write().map_err(poisoned)?;
        if !books.contains_key(&book.member.id) {
            return Err(LedgerError::not_found("member", book.member.id));
        }
        let mut payments = self.payments.write().map_err(poisoned)?;

        books.insert(book.member.id, book.clone());
        if let Some(payment) = payment {
            payments.push(payment.clone());
        }
        Ok(())
    }

    async fn insert_reminders(&self, reminders: &[Reminder]) -> Result<(), LedgerError> {
        let mut stored = self.reminders.write().map_err(poisoned)?;
        stored.extend_from_slice(reminders);
        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        self.books.read().map_err(poisoned)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Money, Period};

    use crate::obligation::{DueType, Obligation};

    #[tokio::test]
    async fn insert_and_load_round_trip() {
        let store = MemoryStore::new();
        let member = Member::new("Stored Member");
        store.insert_member(&member).await.unwrap();

        let book = store.load_book(member.id).await.unwrap();
        assert_eq!(book.member.name, "Stored Member");
        assert!(book.obligations.is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let store = MemoryStore::new();
        let member = Member::new("Twice");
        store.insert_member(&member).await.unwrap();
        assert!(store.insert_member(&member).await.is_err());
    }

    #[tokio::test]
    async fn commit_rejects_invariant_violations_and_keeps_old_state() {
        let store = MemoryStore::new();
        let member = Member::new("Guarded");
        store.insert_member(&member).await.unwrap();

        let mut book = store.load_book(member.id).await.unwrap();
        let mut obligation = Obligation::new(
            member.id,
            DueType::FlatFee,
            Period::new(2025, 3).unwrap(),
            Money::from_minor(2000),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        // corrupt the row so conservation breaks
        obligation.amount_paid = Money::from_minor(1);
        book.obligations.push(obligation);

        let err = store.commit_book(&book, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));

        let reloaded = store.load_book(member.id).await.unwrap();
        assert!(reloaded.obligations.is_empty());
    }

    #[tokio::test]
    async fn active_members_excludes_deactivated() {
        let store = MemoryStore::new();
        store.insert_member(&Member::new("Active")).await.unwrap();
        store
            .insert_member(&Member::new("Gone").deactivated())
            .await
            .unwrap();

        let members = store.active_members().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Active");
    }
}
