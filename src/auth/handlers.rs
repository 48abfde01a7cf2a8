use crate::api::handler::AppState;
use crate::audit::models::AuditEventType;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{User, UserRole};
use crate::auth::tokens::{hash_password, hash_token, mint_token, verify_password};
use crate::error::{AppError, AppResult, AuthError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state.auth.find_by_username(req.username.trim()).await?;

    let user = match user {
        Some(user) if verify_password(&user.password_hash, &req.password) => user,
        _ => {
            warn!(username = %req.username, "login rejected");
            state
                .audit
                .record(
                    AuditEventType::LoginFailed,
                    None,
                    None,
                    serde_json::json!({ "username": req.username }),
                )
                .await?;
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !user.active {
        return Err(AuthError::AccountDeactivated.into());
    }

    let token = mint_token();
    let expires_at = Utc::now() + Duration::hours(state.config.session_ttl_hours);
    state
        .auth
        .create_session(user.id, &user.username, &hash_token(&token), expires_at)
        .await?;

    info!(username = %user.username, "session opened");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> AppResult<StatusCode> {
    state.auth.revoke_session(&hash_token(&req.token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    req.validate()?;

    let user = state
        .auth
        .create_user(
            auth.user_id,
            req.username.trim(),
            &hash_password(&req.password),
            req.role,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<Json<Vec<User>>> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    let users = state.auth.list_users().await?;
    Ok(Json(users))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    if auth.user_id == user_id {
        return Err(AppError::InvalidInput(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    let user = state.auth.deactivate_user(auth.user_id, user_id).await?;

    Ok(Json(user))
}
