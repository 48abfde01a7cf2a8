use crate::api::handler::AppState;
use crate::auth::middleware::AuthUser;
use crate::entries::models::{PendingSummary, VehicleEntry, VehicleType};
use crate::error::{AppError, AppResult};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterEntryRequest {
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 16, message = "plate must be 1-16 characters"))]
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub amount: Decimal,
}

#[derive(Deserialize)]
pub struct OwnerEntriesQuery {
    #[serde(default)]
    pub pending: bool,
}

pub async fn register_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<RegisterEntryRequest>,
) -> AppResult<(StatusCode, Json<VehicleEntry>)> {
    req.validate()?;

    if req.amount < Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "Fee amount must not be negative".to_string(),
        ));
    }

    let owner = state.owners.get_required(req.owner_id).await?;
    if !owner.active {
        return Err(AppError::InvalidInput(format!(
            "Co-owner {} is deactivated",
            owner.id
        )));
    }

    let plate = req.plate.trim().to_uppercase();
    let entry = state
        .entries
        .create(
            auth.user_id,
            owner.id,
            &plate,
            req.vehicle_type,
            req.amount.round_dp(2),
        )
        .await?;

    state.summary_cache.invalidate(owner.id).await;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<VehicleEntry>> {
    let entry = state.entries.get_required(entry_id).await?;
    Ok(Json(entry))
}

pub async fn list_owner_entries(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<OwnerEntriesQuery>,
) -> AppResult<Json<Vec<VehicleEntry>>> {
    state.owners.get_required(owner_id).await?;
    let entries = state.entries.list_by_owner(owner_id, query.pending).await?;
    Ok(Json(entries))
}

pub async fn mark_entry_exit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<VehicleEntry>> {
    let entry = state.entries.mark_exit(auth.user_id, entry_id).await?;
    Ok(Json(entry))
}

/// Count and total of an owner's matcher-eligible fees, served from the
/// short-TTL cache when fresh.
pub async fn get_pending_summary(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<PendingSummary>> {
    if let Some(summary) = state.summary_cache.get(owner_id).await {
        return Ok(Json(summary));
    }

    state.owners.get_required(owner_id).await?;
    let summary = state.entries.pending_summary(owner_id).await?;
    state.summary_cache.set(summary.clone()).await;
    Ok(Json(summary))
}
