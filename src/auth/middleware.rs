use crate::api::handler::AppState;
use crate::auth::models::UserRole;
use crate::auth::tokens::hash_token;
use crate::error::{AppError, AuthError};

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authenticated caller, attached as a request extension by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Bearer-token guard for everything under the protected API nest.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or(AppError::Auth(AuthError::MissingToken))?;

    let (session, user) = state
        .auth
        .find_session_user(&hash_token(&token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AuthError::SessionExpired.into());
    }
    if !user.active {
        return Err(AuthError::AccountDeactivated.into());
    }

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
