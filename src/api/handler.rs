use crate::audit::AuditRepository;
use crate::auth::AuthRepository;
use crate::compensation::CompensationRepository;
use crate::config::Config;
use crate::entries::models::OwnerReport;
use crate::entries::EntryRepository;
use crate::error::AppResult;
use crate::owners::OwnerRepository;
use crate::payments::PaymentRepository;
use crate::summary::SummaryCache;

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub owners: Arc<OwnerRepository>,
    pub entries: Arc<EntryRepository>,
    pub payments: Arc<PaymentRepository>,
    pub compensations: Arc<CompensationRepository>,
    pub auth: Arc<AuthRepository>,
    pub audit: Arc<AuditRepository>,
    pub summary_cache: Arc<SummaryCache>,
    pub config: Config,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "parkvisit-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Collected / compensated / pending totals for one co-owner.
pub async fn get_owner_report(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<OwnerReport>> {
    state.owners.get_required(owner_id).await?;
    let report = state.entries.owner_report(owner_id).await?;
    Ok(Json(report))
}
