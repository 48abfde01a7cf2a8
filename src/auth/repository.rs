use super::models::{Session, User, UserRole};
use crate::audit::models::AuditEventType;
use crate::audit::AuditRepository;
use crate::error::{AppError, AppResult, AuthError};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, username, password_hash, role, active, created_at, updated_at";

pub struct AuthRepository {
    pub pool: PgPool,
    audit: Arc<AuditRepository>,
}

impl AuthRepository {
    pub fn new(pool: PgPool, audit: Arc<AuditRepository>) -> Self {
        Self { pool, audit }
    }

    // ========== USER OPERATIONS ==========

    pub async fn create_user(
        &self,
        actor_id: Uuid,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Auth(AuthError::UsernameTaken(username.to_string()))
            }
            _ => AppError::from(e),
        })?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::UserCreated,
                Some(actor_id),
                Some(user.id),
                serde_json::json!({ "username": user.username }),
            )
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY username
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn deactivate_user(&self, actor_id: Uuid, user_id: Uuid) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

        // A deactivated user's open sessions die with the account.
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::UserDeactivated,
                Some(actor_id),
                Some(user.id),
                serde_json::json!({ "username": user.username }),
            )
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    // ========== SESSION OPERATIONS ==========

    /// Opens a session and records the successful login in the same transaction.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        username: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::LoginSucceeded,
                Some(user_id),
                Some(session.id),
                serde_json::json!({ "username": username }),
            )
            .await?;

        tx.commit().await?;
        Ok(session)
    }

    /// Resolve a token hash to its session and user in one query.
    pub async fn find_session_user(&self, token_hash: &str) -> AppResult<Option<(Session, User)>> {
        let row: Option<(
            Uuid,
            Uuid,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
            String,
            String,
            UserRole,
            bool,
            DateTime<Utc>,
            DateTime<Utc>,
        )> = sqlx::query_as(
            r#"
            SELECT
                s.id, s.user_id, s.token_hash, s.expires_at, s.created_at,
                u.username, u.password_hash, u.role, u.active, u.created_at, u.updated_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(
                session_id,
                user_id,
                token_hash,
                expires_at,
                session_created_at,
                username,
                password_hash,
                role,
                active,
                user_created_at,
                user_updated_at,
            )| {
                (
                    Session {
                        id: session_id,
                        user_id,
                        token_hash,
                        expires_at,
                        created_at: session_created_at,
                    },
                    User {
                        id: user_id,
                        username,
                        password_hash,
                        role,
                        active,
                        created_at: user_created_at,
                        updated_at: user_updated_at,
                    },
                )
            },
        ))
    }

    pub async fn revoke_session(&self, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Used by the bootstrap sweeper task.
    pub async fn delete_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
