//! Ports for storage and notification adapters
//!
//! The dues domain depends on these traits only; adapters live in the
//! infrastructure crates (`infra_db` for PostgreSQL) or in this crate for
//! the in-memory store used by tests and development.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use core_kernel::MemberId;

use crate::book::MemberBook;
use crate::error::LedgerError;
use crate::member::Member;
use crate::payment::Payment;
use crate::reminder::Reminder;

/// Error type for notification dispatch
///
/// Dispatch failures are logged and never roll back a committed ledger
/// mutation, so this error deliberately does not convert into
/// `LedgerError`.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Storage port for the dues ledger
///
/// `commit_book` is the transactional boundary: every row the allocation
/// unit touched (obligations, credits, debts, the optional payment) is
/// persisted atomically or not at all. Implementations must verify the
/// book's invariants before accepting a commit.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Registers a member with an empty book
    async fn insert_member(&self, member: &Member) -> Result<(), LedgerError>;

    /// Fetches one roster entry
    async fn member(&self, id: MemberId) -> Result<Option<Member>, LedgerError>;

    /// The active roster, iterated by the batch generators
    async fn active_members(&self) -> Result<Vec<Member>, LedgerError>;

    /// Loads a consistent snapshot of one member's book
    async fn load_book(&self, member_id: MemberId) -> Result<MemberBook, LedgerError>;

    /// Persists a mutated book, plus the payment that caused the
    /// mutation, as one atomic unit
    async fn commit_book(
        &self,
        book: &MemberBook,
        payment: Option<&Payment>,
    ) -> Result<(), LedgerError>;

    /// Appends reminder rows (duplicates across runs are acceptable)
    async fn insert_reminders(&self, reminders: &[Reminder]) -> Result<(), LedgerError>;

    /// Cheap liveness probe for readiness checks
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Outbound notification port (email/SMS)
///
/// Invoked after a successful ledger mutation, outside the member lock,
/// never before the commit.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, member: &Member, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Default notification adapter that writes to the log
///
/// Stands in wherever no real dispatcher is wired up (development, tests).
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, member: &Member, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(
            member = %member.id,
            email = member.email.as_deref().unwrap_or("<none>"),
            subject,
            body,
            "notification (log only)"
        );
        Ok(())
    }
}
