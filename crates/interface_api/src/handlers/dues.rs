//! Dues ledger handlers
//!
//! Authorization happens here, at the boundary; the service below never
//! inspects roles.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{MemberId, Money, Period};
use domain_dues::{PeriodCharges, RecordPayment};

use crate::auth::{require_role, roles, Claims};
use crate::dto::dues::*;
use crate::error::ApiError;
use crate::AppState;

fn parse_money(amount: rust_decimal::Decimal) -> Result<Money, ApiError> {
    Money::try_from_decimal(amount).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Records a manual payment against a member's oldest open obligation
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<PaymentReceiptResponse>, ApiError> {
    require_role(&claims, roles::TREASURER)?;
    request.validate()?;

    let cmd = RecordPayment {
        member_id: MemberId::from(request.member_id),
        due_type: request.due_type.parse()?,
        amount: parse_money(request.amount)?,
        method: request.method.parse()?,
        paid_on: request.paid_on,
        reference: request.reference,
    };

    let receipt = state.service.record_manual_payment(cmd).await?;
    Ok(Json(receipt.into()))
}

/// Creates the month's obligations for every active member (idempotent)
pub async fn generate_obligations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<GenerateObligationsRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    require_role(&claims, roles::TREASURER)?;
    request.validate()?;

    let period: Period = request
        .period
        .parse()
        .map_err(|e: core_kernel::PeriodError| ApiError::Validation(e.to_string()))?;
    let charges = PeriodCharges::new(
        period,
        parse_money(request.flat_fee)?,
        parse_money(request.assistance_fee)?,
    )?;

    let report = state.service.generate_monthly_obligations(charges).await?;
    Ok(Json(report.into()))
}

/// Returns the member's derived debt state
pub async fn debt_summary(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<DebtSummaryResponse>, ApiError> {
    let summary = state
        .service
        .member_debt_summary(MemberId::from(member_id))
        .await?;
    Ok(Json(summary.into()))
}

/// Sweeps the member's available credits into their initial debts
pub async fn sweep_credits(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<CreditSweepResponse>, ApiError> {
    require_role(&claims, roles::TREASURER)?;

    let applied = state
        .service
        .sweep_member_credits(MemberId::from(member_id))
        .await?;
    Ok(Json(CreditSweepResponse {
        applied_to_initial_debt: applied.to_decimal(),
    }))
}

/// Emits reminder records for every in-arrears member
pub async fn generate_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RemindersResponse>, ApiError> {
    require_role(&claims, roles::TREASURER)?;

    let report = state.service.generate_reminders().await?;
    Ok(Json(report.into()))
}
