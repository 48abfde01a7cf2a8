use crate::api::handler::AppState;
use crate::auth::middleware::AuthUser;
use crate::compensation::matcher::find_exact_combination;
use crate::compensation::models::{Compensation, CompensationWithEntries};
use crate::error::{AppResult, CompensationError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ApplyCompensationRequest {
    pub owner_id: Uuid,
    pub target_amount: Decimal,
    pub note: Option<String>,
}

/// Mark pending fees free against an exact target: load the eligible pool,
/// run the subset matcher, and persist the match transactionally. A target
/// with no exact combination is a 422, never a partial write.
pub async fn apply_compensation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ApplyCompensationRequest>,
) -> AppResult<(StatusCode, Json<CompensationWithEntries>)> {
    if req.target_amount <= Decimal::ZERO {
        return Err(CompensationError::NonPositiveTarget.into());
    }
    let target = req.target_amount.round_dp(2);

    state.owners.get_required(req.owner_id).await?;

    let candidates = state.compensations.eligible_candidates(req.owner_id).await?;
    if candidates.is_empty() {
        return Err(CompensationError::NoPendingFees(req.owner_id.to_string()).into());
    }

    let matched = find_exact_combination(&candidates, target).ok_or_else(|| {
        CompensationError::NoExactCombination {
            target: target.to_string(),
        }
    })?;

    let compensation = state
        .compensations
        .apply(
            req.owner_id,
            target,
            matched.total,
            &matched.entry_ids,
            req.note,
            auth.user_id,
        )
        .await?;

    state.summary_cache.invalidate(req.owner_id).await;

    Ok((StatusCode::CREATED, Json(compensation)))
}

pub async fn get_compensation(
    State(state): State<AppState>,
    Path(compensation_id): Path<Uuid>,
) -> AppResult<Json<CompensationWithEntries>> {
    let compensation = state.compensations.get(compensation_id).await?;
    Ok(Json(compensation))
}

pub async fn list_owner_compensations(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<Vec<Compensation>>> {
    state.owners.get_required(owner_id).await?;
    let compensations = state.compensations.list_by_owner(owner_id).await?;
    Ok(Json(compensations))
}
