//! Settlement records
//!
//! A payment is the immutable trace of one offline settlement event. It
//! is written exactly once by the allocation unit and never mutated,
//! regardless of how the amount was distributed.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{MemberId, Money, ObligationId, PaymentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// How the money was handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Check,
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "check" => Ok(PaymentMethod::Check),
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(LedgerError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// An immutable record of a settlement event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub member_id: MemberId,
    /// The obligation this payment targeted, if any
    pub obligation_id: Option<ObligationId>,
    pub amount: Money,
    pub method: PaymentMethod,
    /// The day the money actually changed hands (manual settlement)
    pub paid_on: NaiveDate,
    /// External reference such as a bank transaction id
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        member_id: MemberId,
        amount: Money,
        method: PaymentMethod,
        paid_on: NaiveDate,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            member_id,
            obligation_id: None,
            amount,
            method,
            paid_on,
            reference: None,
            created_at: Utc::now(),
        }
    }

    /// Links the payment to the obligation it targeted
    pub fn for_obligation(mut self, obligation_id: ObligationId) -> Self {
        self.obligation_id = Some(obligation_id);
        self
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_links_obligation_and_reference() {
        let obligation_id = ObligationId::new();
        let payment = Payment::new(
            MemberId::new(),
            Money::from_minor(5000),
            PaymentMethod::Check,
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .for_obligation(obligation_id)
        .with_reference("CHQ-0042");

        assert_eq!(payment.obligation_id, Some(obligation_id));
        assert_eq!(payment.reference.as_deref(), Some("CHQ-0042"));
    }

    #[test]
    fn method_string_round_trip() {
        for method in [
            PaymentMethod::BankTransfer,
            PaymentMethod::Check,
            PaymentMethod::Cash,
            PaymentMethod::Card,
        ] {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }
}
