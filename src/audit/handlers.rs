use crate::api::handler::AppState;
use crate::audit::models::{AuditEvent, AuditEventType};
use crate::auth::middleware::AuthUser;
use crate::auth::models::UserRole;
use crate::error::{AppError, AppResult};

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub event_type: Option<AuditEventType>,
    pub limit: Option<i64>,
}

/// Admin-only view of the audit trail, newest first.
pub async fn list_audit_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditEvent>>> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let events = state.audit.list(query.event_type, limit).await?;
    Ok(Json(events))
}
