//! Member roster handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{MemberId, Money};
use domain_dues::Member;

use crate::auth::{require_role, roles, Claims};
use crate::dto::members::*;
use crate::error::ApiError;
use crate::AppState;

/// Registers a new member with an empty dues book
pub async fn register_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RegisterMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    require_role(&claims, roles::SECRETARY)?;
    request.validate()?;

    let mut member = Member::new(request.name);
    if let Some(email) = request.email {
        member = member.with_email(email);
    }
    if request.active == Some(false) {
        member = member.deactivated();
    }

    let member = state.service.register_member(member).await?;
    Ok(Json(member.into()))
}

/// Records a legacy yearly balance for a member (administrator path)
pub async fn add_initial_debt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(member_id): Path<Uuid>,
    Json(request): Json<AddInitialDebtRequest>,
) -> Result<Json<InitialDebtResponse>, ApiError> {
    require_role(&claims, roles::TREASURER)?;
    request.validate()?;

    let amount = Money::try_from_decimal(request.amount)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let debt = state
        .service
        .add_initial_debt(MemberId::from(member_id), request.year, amount)
        .await?;
    Ok(Json(debt.into()))
}
