//! The dues application service
//!
//! Orchestrates the allocation engine over the storage port. Every
//! read-modify-write sequence for a member runs under that member's
//! exclusive lock, acquired with a timeout; different members never
//! contend. Notification dispatch happens after the commit and outside
//! the lock, and its failure never reverses the mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use core_kernel::{MemberId, Money, Period};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::allocation::{self, SettlementOutcome};
use crate::arrears::{self, ArrearsPolicy, MemberDebtSummary};
use crate::error::LedgerError;
use crate::initial_debt::InitialDebt;
use crate::member::Member;
use crate::obligation::DueType;
use crate::payment::{Payment, PaymentMethod};
use crate::ports::{LedgerStore, NotificationSender};
use crate::reminder;
use crate::schedule::{self, PeriodCharges};

/// Service configuration
#[derive(Debug, Clone)]
pub struct DuesConfig {
    pub arrears: ArrearsPolicy,
    /// How long to wait for a member lock before reporting a conflict
    pub lock_timeout: Duration,
}

impl Default for DuesConfig {
    fn default() -> Self {
        Self {
            arrears: ArrearsPolicy::default(),
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// A manual payment to record
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub member_id: MemberId,
    pub due_type: DueType,
    pub amount: Money,
    pub method: PaymentMethod,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
}

/// What the caller gets back after a recorded payment
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub outcome: SettlementOutcome,
    /// User-facing confirmation text built from the outcome
    pub confirmation: String,
}

/// Result of a monthly generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub period: Period,
    pub members_processed: u32,
    pub created: u32,
}

/// Result of a reminder run
#[derive(Debug, Clone)]
pub struct ReminderReport {
    pub members_in_arrears: u32,
    pub created: u32,
}

/// The dues & credit reconciliation service
pub struct DuesService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationSender>,
    config: DuesConfig,
    member_locks: StdMutex<HashMap<MemberId, Arc<AsyncMutex<()>>>>,
}

impl DuesService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn NotificationSender>,
        config: DuesConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            member_locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn arrears_policy(&self) -> &ArrearsPolicy {
        &self.config.arrears
    }

    /// Acquires the member's exclusive lock, or fails with
    /// `ConcurrencyConflict` after the configured timeout
    async fn lock_member(&self, id: MemberId) -> Result<OwnedMutexGuard<()>, LedgerError> {
        let lock = {
            let mut registry = self
                .member_locks
                .lock()
                .map_err(|_| LedgerError::persistence("member lock registry poisoned"))?;
            registry
                .entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        tokio::time::timeout(self.config.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::ConcurrencyConflict(id))
    }

    /// Registers a member with an empty dues book
    pub async fn register_member(&self, member: Member) -> Result<Member, LedgerError> {
        if member.name.trim().is_empty() {
            return Err(LedgerError::validation("member name must not be empty"));
        }
        self.store.insert_member(&member).await?;
        info!(member = %member.id, name = %member.name, "member registered");
        Ok(member)
    }

    /// Records a legacy yearly balance for a member (administrator path)
    pub async fn add_initial_debt(
        &self,
        member_id: MemberId,
        year: i32,
        amount: Money,
    ) -> Result<InitialDebt, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation(
                "initial debt amount must be positive",
            ));
        }
        if !(1900..=9999).contains(&year) {
            return Err(LedgerError::validation(format!(
                "initial debt year {year} is out of range"
            )));
        }

        let _guard = self.lock_member(member_id).await?;
        let mut book = self.store.load_book(member_id).await?;
        if book.initial_debts.iter().any(|d| d.year == year) {
            return Err(LedgerError::validation(format!(
                "an initial debt for {year} already exists for this member"
            )));
        }

        let debt = InitialDebt::new(member_id, year, amount);
        book.initial_debts.push(debt.clone());
        self.store.commit_book(&book, None).await?;
        info!(member = %member_id, year, amount = %amount, "initial debt recorded");
        Ok(debt)
    }

    /// Records a manual payment against the member's oldest open
    /// obligation of the given type
    ///
    /// Validation happens before any write. The whole settlement (credit
    /// sweep, obligation update, surplus credit, debt cascade, payment
    /// row) commits as one unit under the member lock; the confirmation
    /// notification goes out afterwards.
    pub async fn record_manual_payment(
        &self,
        cmd: RecordPayment,
    ) -> Result<PaymentReceipt, LedgerError> {
        if !cmd.amount.is_positive() {
            return Err(LedgerError::validation("payment amount must be positive"));
        }
        let today = Utc::now().date_naive();
        if cmd.paid_on > today {
            return Err(LedgerError::validation(
                "payment date cannot be in the future",
            ));
        }

        let (member, receipt) = {
            let _guard = self.lock_member(cmd.member_id).await?;
            let mut book = self.store.load_book(cmd.member_id).await?;

            let target = book
                .oldest_open_obligation(cmd.due_type)
                .map(|o| o.id)
                .ok_or(LedgerError::NoMatchingObligation {
                    member: cmd.member_id,
                    due_type: cmd.due_type,
                })?;

            let outcome =
                allocation::settle_obligation(&mut book, target, cmd.amount, today, false)?;

            let mut payment =
                Payment::new(cmd.member_id, cmd.amount, cmd.method, cmd.paid_on)
                    .for_obligation(target);
            if let Some(reference) = &cmd.reference {
                payment = payment.with_reference(reference.clone());
            }

            self.store.commit_book(&book, Some(&payment)).await?;

            info!(
                member = %cmd.member_id,
                payment = %payment.id,
                amount = %cmd.amount,
                applied = %outcome.amount_applied,
                surplus = %outcome.surplus,
                "payment recorded"
            );

            let confirmation = confirmation_message(&book.member, &outcome);
            (
                book.member.clone(),
                PaymentReceipt {
                    payment,
                    outcome,
                    confirmation,
                },
            )
        };

        // outside the member lock; a dispatch failure is logged, never
        // rolled back: the money was genuinely received
        if let Err(err) = self
            .notifier
            .send(&member, "Payment received", &receipt.confirmation)
            .await
        {
            warn!(member = %member.id, error = %err, "payment confirmation dispatch failed");
        }

        Ok(receipt)
    }

    /// Creates the period's obligations for every active member
    ///
    /// Idempotent per period: re-running creates nothing new.
    pub async fn generate_monthly_obligations(
        &self,
        charges: PeriodCharges,
    ) -> Result<GenerationReport, LedgerError> {
        let today = Utc::now().date_naive();
        let members = self.store.active_members().await?;

        let mut created = 0;
        for member in &members {
            let _guard = self.lock_member(member.id).await?;
            let mut book = self.store.load_book(member.id).await?;
            let n = schedule::generate_for_member(&mut book, &charges, today)?;
            if n > 0 {
                self.store.commit_book(&book, None).await?;
                created += n;
            }
        }

        info!(period = %charges.period, created, "monthly obligation run complete");
        Ok(GenerationReport {
            period: charges.period,
            members_processed: members.len() as u32,
            created,
        })
    }

    /// Derives the member's aggregate debt state, recomputed on demand
    pub async fn member_debt_summary(
        &self,
        member_id: MemberId,
    ) -> Result<MemberDebtSummary, LedgerError> {
        let book = self.store.load_book(member_id).await?;
        Ok(arrears::debt_summary(
            &book,
            &self.config.arrears,
            Utc::now().date_naive(),
        ))
    }

    /// Emits one reminder per overdue obligation of every in-arrears member
    pub async fn generate_reminders(&self) -> Result<ReminderReport, LedgerError> {
        let today = Utc::now().date_naive();
        let members = self.store.active_members().await?;

        let mut report = ReminderReport {
            members_in_arrears: 0,
            created: 0,
        };
        for member in &members {
            let _guard = self.lock_member(member.id).await?;
            let book = self.store.load_book(member.id).await?;
            let summary = arrears::debt_summary(&book, &self.config.arrears, today);
            if !summary.in_arrears {
                continue;
            }
            report.members_in_arrears += 1;

            let reminders = reminder::reminders_for_member(&book, &summary, today);
            if !reminders.is_empty() {
                self.store.insert_reminders(&reminders).await?;
                report.created += reminders.len() as u32;
            }
        }

        info!(
            members_in_arrears = report.members_in_arrears,
            created = report.created,
            "reminder run complete"
        );
        Ok(report)
    }

    /// Standalone credit sweep against a member's initial debts (entry B)
    pub async fn sweep_member_credits(&self, member_id: MemberId) -> Result<Money, LedgerError> {
        let _guard = self.lock_member(member_id).await?;
        let mut book = self.store.load_book(member_id).await?;

        let applied = allocation::sweep_credits_into_initial_debt(&mut book);
        if applied.is_positive() {
            self.store.commit_book(&book, None).await?;
        }
        Ok(applied)
    }

    /// Liveness of the underlying store, for readiness probes
    pub async fn health_check(&self) -> Result<(), LedgerError> {
        self.store.ping().await
    }
}

fn confirmation_message(member: &Member, outcome: &SettlementOutcome) -> String {
    let obligation = &outcome.obligation;
    let mut message = format!(
        "Thank you {name}: {applied} applied to the {due_type} for {period} \
         ({remaining} remaining).",
        name = member.name,
        applied = outcome.amount_applied,
        due_type = obligation.due_type.label(),
        period = obligation.period,
        remaining = obligation.amount_remaining,
    );
    if outcome.credit_applied.is_positive() {
        message.push_str(&format!(
            " {} of existing credit was used first.",
            outcome.credit_applied
        ));
    }
    if let Some(credit) = &outcome.credit_created {
        message.push_str(&format!(
            " A credit of {} was created from the overpayment.",
            credit.amount
        ));
    }
    if outcome.applied_to_initial_debt.is_positive() {
        message.push_str(&format!(
            " {} was applied to older debt.",
            outcome.applied_to_initial_debt
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::SettlementOutcome;
    use crate::obligation::{Obligation, ObligationStatus};
    use core_kernel::Period;

    fn outcome_for(member: &Member, paid_minor: i64, expected_minor: i64) -> SettlementOutcome {
        let mut obligation = Obligation::new(
            member.id,
            DueType::FlatFee,
            Period::new(2025, 3).unwrap(),
            Money::from_minor(expected_minor),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        obligation.apply(
            Money::from_minor(paid_minor),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        SettlementOutcome {
            obligation,
            credit_applied: Money::ZERO,
            amount_applied: Money::from_minor(paid_minor),
            surplus: Money::ZERO,
            credit_created: None,
            applied_to_initial_debt: Money::ZERO,
        }
    }

    #[test]
    fn confirmation_message_mentions_amount_and_period() {
        let member = Member::new("Paul Durand");
        let outcome = outcome_for(&member, 1500, 2000);
        let message = confirmation_message(&member, &outcome);

        assert!(message.contains("Paul Durand"));
        assert!(message.contains("15.00"));
        assert!(message.contains("2025-03"));
        assert!(message.contains("5.00 remaining"));
        assert_eq!(outcome.obligation.status, ObligationStatus::PartiallyPaid);
    }
}
