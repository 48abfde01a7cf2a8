use super::matcher::FeeCandidate;
use super::models::{Compensation, CompensationWithEntries};
use crate::audit::models::AuditEventType;
use crate::audit::AuditRepository;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct CompensationRepository {
    pub pool: PgPool,
    audit: Arc<AuditRepository>,
}

impl CompensationRepository {
    pub fn new(pool: PgPool, audit: Arc<AuditRepository>) -> Self {
        Self { pool, audit }
    }

    /// Load the matcher-eligible pool for an owner: unpaid, not free,
    /// oldest first. The ordering is part of the matching contract.
    pub async fn eligible_candidates(&self, owner_id: Uuid) -> AppResult<Vec<FeeCandidate>> {
        let rows: Vec<(Uuid, Decimal, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, amount, entered_at
            FROM vehicle_entries
            WHERE owner_id = $1 AND NOT is_paid AND NOT is_free
            ORDER BY entered_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, amount, entered_at)| FeeCandidate {
                id,
                amount,
                entered_at,
            })
            .collect())
    }

    /// Persist a successful match: flag the matched entries free and record
    /// the compensation, in one transaction.
    ///
    /// The UPDATE re-checks both flags, so if a racing payment or
    /// compensation already consumed one of the matched entries the whole
    /// operation fails closed and nothing is freed.
    pub async fn apply(
        &self,
        owner_id: Uuid,
        target_amount: Decimal,
        matched_total: Decimal,
        entry_ids: &[Uuid],
        note: Option<String>,
        created_by: Uuid,
    ) -> AppResult<CompensationWithEntries> {
        let mut tx = self.pool.begin().await?;

        let freed = sqlx::query(
            r#"
            UPDATE vehicle_entries
            SET is_free = TRUE, freed_at = NOW(), updated_at = NOW()
            WHERE id = ANY($1) AND owner_id = $2 AND NOT is_paid AND NOT is_free
            "#,
        )
        .bind(entry_ids)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        if freed.rows_affected() != entry_ids.len() as u64 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Matched entries changed while applying the compensation".to_string(),
            ));
        }

        let compensation = sqlx::query_as::<_, Compensation>(
            r#"
            INSERT INTO compensations (owner_id, target_amount, matched_total, note, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, target_amount, matched_total, note, created_by, created_at
            "#,
        )
        .bind(owner_id)
        .bind(target_amount)
        .bind(matched_total)
        .bind(note)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        for entry_id in entry_ids {
            sqlx::query(
                r#"
                INSERT INTO compensation_entries (compensation_id, entry_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(compensation.id)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
        }

        // The audit event commits or rolls back with the compensation.
        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::CompensationApplied,
                Some(created_by),
                Some(compensation.id),
                serde_json::json!({
                    "owner_id": owner_id,
                    "target": target_amount.to_string(),
                    "entry_count": entry_ids.len(),
                }),
            )
            .await?;

        tx.commit().await?;

        Ok(CompensationWithEntries {
            compensation,
            entry_ids: entry_ids.to_vec(),
        })
    }

    pub async fn get(&self, compensation_id: Uuid) -> AppResult<CompensationWithEntries> {
        let compensation = sqlx::query_as::<_, Compensation>(
            r#"
            SELECT id, owner_id, target_amount, matched_total, note, created_by, created_at
            FROM compensations
            WHERE id = $1
            "#,
        )
        .bind(compensation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Compensation {}", compensation_id)))?;

        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT entry_id
            FROM compensation_entries
            WHERE compensation_id = $1
            "#,
        )
        .bind(compensation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CompensationWithEntries {
            compensation,
            entry_ids: ids.into_iter().map(|(id,)| id).collect(),
        })
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Compensation>> {
        let compensations = sqlx::query_as::<_, Compensation>(
            r#"
            SELECT id, owner_id, target_amount, matched_total, note, created_by, created_at
            FROM compensations
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(compensations)
    }
}
