//! Member DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_dues::{InitialDebt, Member};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterMemberRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    /// Defaults to active
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: *member.id.as_uuid(),
            name: member.name,
            email: member.email,
            active: member.active,
            created_at: member.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddInitialDebtRequest {
    #[validate(range(min = 1900, max = 9999))]
    pub year: i32,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct InitialDebtResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub year: i32,
    pub amount: Decimal,
    pub amount_remaining: Decimal,
}

impl From<InitialDebt> for InitialDebtResponse {
    fn from(debt: InitialDebt) -> Self {
        Self {
            id: *debt.id.as_uuid(),
            member_id: *debt.member_id.as_uuid(),
            year: debt.year,
            amount: debt.amount.to_decimal(),
            amount_remaining: debt.amount_remaining.to_decimal(),
        }
    }
}
