//! Dues Domain - the membership ledger core
//!
//! This crate implements the dues & credit reconciliation ledger: the
//! recurring obligations each member owes, legacy initial debts,
//! overpayment credits, the allocation engine that distributes funds
//! across them, and the derived arrears state.
//!
//! # Allocation rules
//!
//! - Available credits are consumed FIFO (oldest first) before an
//!   incoming payment touches an obligation.
//! - Paying more than an obligation's remaining amount creates exactly
//!   one credit for the surplus, which immediately sweeps into the
//!   member's initial debts, oldest year first.
//! - Every mutation preserves `paid + remaining == expected` to the cent;
//!   no balance ever goes negative.
//!
//! # Consistency
//!
//! A settlement is one atomic unit: the member's book is mutated in
//! memory under the member's exclusive lock and persisted by a single
//! `commit_book` call. Arrears figures are recomputed from raw rows on
//! every read, never cached.

pub mod allocation;
pub mod arrears;
pub mod book;
pub mod credit;
pub mod error;
pub mod initial_debt;
pub mod member;
pub mod memory;
pub mod obligation;
pub mod payment;
pub mod ports;
pub mod reminder;
pub mod schedule;
pub mod service;

pub use allocation::SettlementOutcome;
pub use arrears::{ArrearsPolicy, MemberDebtSummary};
pub use book::MemberBook;
pub use credit::{Credit, CreditStatus};
pub use error::LedgerError;
pub use initial_debt::InitialDebt;
pub use member::Member;
pub use memory::MemoryStore;
pub use obligation::{DueType, Obligation, ObligationStatus};
pub use payment::{Payment, PaymentMethod};
pub use ports::{LedgerStore, LogNotifier, NotificationSender, NotifyError};
pub use reminder::{Reminder, ReminderChannel, ReminderStatus};
pub use schedule::PeriodCharges;
pub use service::{
    DuesConfig, DuesService, GenerationReport, PaymentReceipt, RecordPayment, ReminderReport,
};
