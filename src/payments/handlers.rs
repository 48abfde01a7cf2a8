use crate::api::handler::AppState;
use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::payments::models::{Payment, PaymentMethod, PaymentWithEntries};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CollectPaymentRequest {
    pub owner_id: Uuid,
    pub method: PaymentMethod,
    pub entry_ids: Vec<Uuid>,
}

pub async fn collect_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CollectPaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentWithEntries>)> {
    if req.entry_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "A payment must cover at least one entry".to_string(),
        ));
    }

    state.owners.get_required(req.owner_id).await?;

    let payment = state
        .payments
        .collect(req.owner_id, req.method, &req.entry_ids, auth.user_id)
        .await?;

    state.summary_cache.invalidate(req.owner_id).await;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<PaymentWithEntries>> {
    let payment = state.payments.get(payment_id).await?;
    Ok(Json(payment))
}

pub async fn list_owner_payments(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<Vec<Payment>>> {
    state.owners.get_required(owner_id).await?;
    let payments = state.payments.list_by_owner(owner_id).await?;
    Ok(Json(payments))
}
