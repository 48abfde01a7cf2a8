use crate::api::handler::AppState;
use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::owners::models::CoOwner;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct CreateOwnerRequest {
    #[validate(length(min = 1, max = 32, message = "unit code must be 1-32 characters"))]
    pub unit_code: String,
    #[validate(length(min = 1, max = 128, message = "full name must be 1-128 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ListOwnersQuery {
    #[serde(default)]
    pub active: bool,
}

pub async fn create_owner(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateOwnerRequest>,
) -> AppResult<(StatusCode, Json<CoOwner>)> {
    req.validate()?;

    let unit_code = req.unit_code.trim().to_uppercase();
    let owner = state
        .owners
        .create(
            auth.user_id,
            &unit_code,
            req.full_name.trim(),
            req.phone,
            req.email,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(owner)))
}

pub async fn list_owners(
    State(state): State<AppState>,
    Query(query): Query<ListOwnersQuery>,
) -> AppResult<Json<Vec<CoOwner>>> {
    let owners = state.owners.list(query.active).await?;
    Ok(Json(owners))
}

pub async fn get_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<CoOwner>> {
    let owner = state.owners.get_required(owner_id).await?;
    Ok(Json(owner))
}

pub async fn update_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(req): Json<CreateOwnerRequest>,
) -> AppResult<Json<CoOwner>> {
    req.validate()?;

    let unit_code = req.unit_code.trim().to_uppercase();
    let owner = state
        .owners
        .update(owner_id, &unit_code, req.full_name.trim(), req.phone, req.email)
        .await?;

    Ok(Json(owner))
}

pub async fn deactivate_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<CoOwner>> {
    let owner = state.owners.deactivate(owner_id).await?;
    Ok(Json(owner))
}
