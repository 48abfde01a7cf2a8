use super::models::CoOwner;
use crate::audit::models::AuditEventType;
use crate::audit::AuditRepository;
use crate::error::{AppError, AppResult};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Unique-violation SQLSTATE, used to surface duplicate unit codes as 409s.
const UNIQUE_VIOLATION: &str = "23505";

pub struct OwnerRepository {
    pub pool: PgPool,
    audit: Arc<AuditRepository>,
}

impl OwnerRepository {
    pub fn new(pool: PgPool, audit: Arc<AuditRepository>) -> Self {
        Self { pool, audit }
    }

    /// Create a co-owner and its audit event in one transaction.
    pub async fn create(
        &self,
        actor_id: Uuid,
        unit_code: &str,
        full_name: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> AppResult<CoOwner> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_as::<_, CoOwner>(
            r#"
            INSERT INTO co_owners (unit_code, full_name, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, unit_code, full_name, phone, email, active, created_at, updated_at
            "#,
        )
        .bind(unit_code)
        .bind(full_name)
        .bind(phone)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(format!("Unit {} already has an active co-owner", unit_code))
            }
            _ => AppError::from(e),
        })?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::OwnerCreated,
                Some(actor_id),
                Some(owner.id),
                serde_json::json!({ "unit_code": owner.unit_code }),
            )
            .await?;

        tx.commit().await?;
        Ok(owner)
    }

    pub async fn get(&self, owner_id: Uuid) -> AppResult<Option<CoOwner>> {
        let owner = sqlx::query_as::<_, CoOwner>(
            r#"
            SELECT id, unit_code, full_name, phone, email, active, created_at, updated_at
            FROM co_owners
            WHERE id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    /// Fetch an owner or fail with 404; most handlers want this form.
    pub async fn get_required(&self, owner_id: Uuid) -> AppResult<CoOwner> {
        self.get(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Co-owner {}", owner_id)))
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<CoOwner>> {
        let owners = sqlx::query_as::<_, CoOwner>(
            r#"
            SELECT id, unit_code, full_name, phone, email, active, created_at, updated_at
            FROM co_owners
            WHERE active OR NOT $1
            ORDER BY unit_code
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(owners)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        unit_code: &str,
        full_name: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> AppResult<CoOwner> {
        let owner = sqlx::query_as::<_, CoOwner>(
            r#"
            UPDATE co_owners
            SET unit_code = $2, full_name = $3, phone = $4, email = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, unit_code, full_name, phone, email, active, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(unit_code)
        .bind(full_name)
        .bind(phone)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(format!("Unit {} already has an active co-owner", unit_code))
            }
            _ => AppError::from(e),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Co-owner {}", owner_id)))?;

        Ok(owner)
    }

    /// Soft delete: the row stays for historical entries and reports.
    pub async fn deactivate(&self, owner_id: Uuid) -> AppResult<CoOwner> {
        let owner = sqlx::query_as::<_, CoOwner>(
            r#"
            UPDATE co_owners
            SET active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, unit_code, full_name, phone, email, active, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Co-owner {}", owner_id)))?;

        Ok(owner)
    }
}
