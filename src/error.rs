use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Compensation error: {0}")]
    Compensation(#[from] CompensationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,
}

/// Compensation-related errors
#[derive(Error, Debug)]
pub enum CompensationError {
    #[error("No combination of pending fees adds up to {target}")]
    NoExactCombination { target: String },

    #[error("Target amount must be greater than zero")]
    NonPositiveTarget,

    #[error("Co-owner {0} has no pending fees")]
    NoPendingFees(String),
}

/// Authentication and session errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session expired")]
    SessionExpired,

    #[error("Missing or malformed bearer token")]
    MissingToken,

    #[error("User account is deactivated")]
    AccountDeactivated,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Compensation(CompensationError::NoExactCombination { target }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_EXACT_COMBINATION",
                format!("No combination of pending fees adds up to {}", target),
                Some(serde_json::json!({ "target": target })),
            ),
            AppError::Compensation(CompensationError::NonPositiveTarget) => (
                StatusCode::BAD_REQUEST,
                "INVALID_TARGET",
                "Target amount must be greater than zero".to_string(),
                None,
            ),
            AppError::Compensation(CompensationError::NoPendingFees(owner)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_PENDING_FEES",
                format!("Co-owner {} has no pending fees", owner),
                None,
            ),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
                None,
            ),
            AppError::Auth(AuthError::SessionExpired) => (
                StatusCode::UNAUTHORIZED,
                "SESSION_EXPIRED",
                "Session expired".to_string(),
                None,
            ),
            AppError::Auth(AuthError::MissingToken) => (
                StatusCode::UNAUTHORIZED,
                "MISSING_TOKEN",
                "Missing or malformed bearer token".to_string(),
                None,
            ),
            AppError::Auth(AuthError::AccountDeactivated) => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_DEACTIVATED",
                "User account is deactivated".to_string(),
                None,
            ),
            AppError::Auth(AuthError::UsernameTaken(username)) => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                format!("Username already taken: {}", username),
                Some(serde_json::json!({ "username": username })),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
                None,
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Forbidden".to_string(),
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::InvalidInput(format!("Decimal conversion error: {:?}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_default())
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<String>>()
            .join("; ");
        AppError::InvalidInput(format!("Validation failed: {}", fields))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
