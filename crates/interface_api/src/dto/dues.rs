//! Dues ledger DTOs
//!
//! Amounts cross this boundary as decimal values and convert to exact
//! minor units on the way in.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_dues::{
    Credit, GenerationReport, MemberDebtSummary, Obligation, PaymentReceipt, ReminderReport,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub member_id: Uuid,
    /// `flat_fee` or `assistance_fee`
    pub due_type: String,
    pub amount: Decimal,
    /// `bank_transfer`, `check`, `cash`, or `card`
    pub method: String,
    pub paid_on: NaiveDate,
    #[validate(length(max = 64))]
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateObligationsRequest {
    /// Target period as `YYYY-MM`
    pub period: String,
    pub flat_fee: Decimal,
    pub assistance_fee: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ObligationResponse {
    pub id: Uuid,
    pub due_type: String,
    pub period: String,
    pub amount_expected: Decimal,
    pub amount_paid: Decimal,
    pub amount_remaining: Decimal,
    pub status: String,
    pub due_date: NaiveDate,
}

impl From<Obligation> for ObligationResponse {
    fn from(o: Obligation) -> Self {
        Self {
            id: *o.id.as_uuid(),
            due_type: o.due_type.to_string(),
            period: o.period.to_string(),
            amount_expected: o.amount_expected.to_decimal(),
            amount_paid: o.amount_paid.to_decimal(),
            amount_remaining: o.amount_remaining.to_decimal(),
            status: o.status.to_string(),
            due_date: o.due_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreditResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub amount_remaining: Decimal,
    pub status: String,
}

impl From<Credit> for CreditResponse {
    fn from(c: Credit) -> Self {
        Self {
            id: *c.id.as_uuid(),
            amount: c.amount.to_decimal(),
            amount_remaining: c.amount_remaining.to_decimal(),
            status: c.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentReceiptResponse {
    pub payment_id: Uuid,
    pub obligation: ObligationResponse,
    pub credit_created: Option<CreditResponse>,
    pub applied_to_initial_debt: Decimal,
    pub confirmation: String,
}

impl From<PaymentReceipt> for PaymentReceiptResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            payment_id: *receipt.payment.id.as_uuid(),
            obligation: receipt.outcome.obligation.clone().into(),
            credit_created: receipt.outcome.credit_created.clone().map(Into::into),
            applied_to_initial_debt: receipt.outcome.applied_to_initial_debt.to_decimal(),
            confirmation: receipt.confirmation,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub period: String,
    pub members_processed: u32,
    pub created: u32,
}

impl From<GenerationReport> for GenerationResponse {
    fn from(report: GenerationReport) -> Self {
        Self {
            period: report.period.to_string(),
            members_processed: report.members_processed,
            created: report.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DebtSummaryResponse {
    pub member_id: Uuid,
    pub outstanding_obligations: Decimal,
    pub outstanding_initial_debt: Decimal,
    pub available_credit: Decimal,
    pub gross_debt: Decimal,
    pub net_debt: Decimal,
    pub months_in_arrears: u32,
    pub in_arrears: bool,
    pub current_month_flat_fee: Decimal,
    pub current_month_assistance_fee: Decimal,
}

impl From<MemberDebtSummary> for DebtSummaryResponse {
    fn from(s: MemberDebtSummary) -> Self {
        Self {
            member_id: *s.member_id.as_uuid(),
            outstanding_obligations: s.outstanding_obligations.to_decimal(),
            outstanding_initial_debt: s.outstanding_initial_debt.to_decimal(),
            available_credit: s.available_credit.to_decimal(),
            gross_debt: s.gross_debt.to_decimal(),
            net_debt: s.net_debt.to_decimal(),
            months_in_arrears: s.months_in_arrears,
            in_arrears: s.in_arrears,
            current_month_flat_fee: s.current_month_flat_fee.to_decimal(),
            current_month_assistance_fee: s.current_month_assistance_fee.to_decimal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub members_in_arrears: u32,
    pub created: u32,
}

impl From<ReminderReport> for RemindersResponse {
    fn from(report: ReminderReport) -> Self {
        Self {
            members_in_arrears: report.members_in_arrears,
            created: report.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreditSweepResponse {
    pub applied_to_initial_debt: Decimal,
}
