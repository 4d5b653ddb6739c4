//! Arrears reminders
//!
//! The reminder generator emits one record per overdue obligation of an
//! in-arrears member. Delivery and deduplication belong to the external
//! notification collaborator; re-running the generator may create
//! duplicate rows and that is acceptable.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{MemberId, ObligationId, ReminderId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::arrears::MemberDebtSummary;
use crate::book::MemberBook;
use crate::error::LedgerError;
use crate::member::Member;
use crate::obligation::{Obligation, ObligationStatus};

/// Delivery channel requested for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
    Email,
    Sms,
}

impl ReminderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Email => "email",
            ReminderChannel::Sms => "sms",
        }
    }
}

impl fmt::Display for ReminderChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReminderChannel {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ReminderChannel::Email),
            "sms" => Ok(ReminderChannel::Sms),
            other => Err(LedgerError::validation(format!(
                "unknown reminder channel: {other}"
            ))),
        }
    }
}

/// Reminder lifecycle; advanced by the notification collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Queued,
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Queued => "queued",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Failed => "failed",
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(ReminderStatus::Queued),
            "sent" => Ok(ReminderStatus::Sent),
            "failed" => Ok(ReminderStatus::Failed),
            other => Err(LedgerError::validation(format!(
                "unknown reminder status: {other}"
            ))),
        }
    }
}

/// A follow-up record for one overdue obligation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub member_id: MemberId,
    pub obligation_id: ObligationId,
    pub message: String,
    pub channel: ReminderChannel,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(member_id: MemberId, obligation_id: ObligationId, message: String) -> Self {
        Self {
            id: ReminderId::new_v7(),
            member_id,
            obligation_id,
            message,
            channel: ReminderChannel::Email,
            status: ReminderStatus::Queued,
            created_at: Utc::now(),
        }
    }
}

/// Builds the reminders for one member
///
/// Emits one queued reminder per obligation that is Overdue on `as_of`,
/// but only when the member is in arrears. Performs no allocation writes.
pub fn reminders_for_member(
    book: &MemberBook,
    summary: &MemberDebtSummary,
    as_of: NaiveDate,
) -> Vec<Reminder> {
    if !summary.in_arrears {
        return Vec::new();
    }

    book.obligations
        .iter()
        .filter(|o| o.status_as_of(as_of) == ObligationStatus::Overdue)
        .map(|o| {
            Reminder::new(
                book.member.id,
                o.id,
                render_message(&book.member, o, summary.months_in_arrears),
            )
        })
        .collect()
}

fn render_message(member: &Member, obligation: &Obligation, months_in_arrears: u32) -> String {
    format!(
        "Dear {name}, your {due_type} for {period} is overdue ({amount} outstanding). \
         Your account is {months} month(s) of dues in arrears. \
         Please contact the treasurer to settle your balance.",
        name = member.name,
        due_type = obligation.due_type.label(),
        period = obligation.period,
        amount = obligation.amount_remaining,
        months = months_in_arrears,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_member_amount_and_months() {
        let member = Member::new("Jeanne Martin");
        let obligation = Obligation::new(
            member.id,
            crate::obligation::DueType::FlatFee,
            core_kernel::Period::new(2025, 1).unwrap(),
            core_kernel::Money::from_minor(2000),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );

        let message = render_message(&member, &obligation, 4);
        assert!(message.contains("Jeanne Martin"));
        assert!(message.contains("20.00"));
        assert!(message.contains("4 month(s)"));
        assert!(message.contains("2025-01"));
    }
}
