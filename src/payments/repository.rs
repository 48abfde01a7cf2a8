use super::models::{Payment, PaymentMethod, PaymentWithEntries};
use crate::audit::models::AuditEventType;
use crate::audit::AuditRepository;
use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct PaymentRepository {
    pub pool: PgPool,
    audit: Arc<AuditRepository>,
}

impl PaymentRepository {
    pub fn new(pool: PgPool, audit: Arc<AuditRepository>) -> Self {
        Self { pool, audit }
    }

    /// Collect payment for a set of pending entries in a single transaction.
    ///
    /// The UPDATE re-checks ownership and both flags, so an entry that was
    /// paid or compensated by a racing request makes the whole collection
    /// fail closed instead of double-settling.
    pub async fn collect(
        &self,
        owner_id: Uuid,
        method: PaymentMethod,
        entry_ids: &[Uuid],
        created_by: Uuid,
    ) -> AppResult<PaymentWithEntries> {
        let mut tx = self.pool.begin().await?;

        let amounts: Vec<(Uuid, Decimal)> = sqlx::query_as(
            r#"
            UPDATE vehicle_entries
            SET is_paid = TRUE, paid_at = NOW(), updated_at = NOW()
            WHERE id = ANY($1) AND owner_id = $2 AND NOT is_paid AND NOT is_free
            RETURNING id, amount
            "#,
        )
        .bind(entry_ids)
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        if amounts.len() != entry_ids.len() {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "One or more entries are not pending fees of this co-owner".to_string(),
            ));
        }

        let total: Decimal = amounts.iter().map(|(_, amount)| *amount).sum();

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (owner_id, method, total, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, method, total, created_by, created_at
            "#,
        )
        .bind(owner_id)
        .bind(method)
        .bind(total)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        for entry_id in entry_ids {
            sqlx::query(
                r#"
                INSERT INTO payment_entries (payment_id, entry_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(payment.id)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
        }

        // The audit event commits or rolls back with the payment itself.
        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::PaymentCollected,
                Some(created_by),
                Some(payment.id),
                serde_json::json!({
                    "owner_id": owner_id,
                    "total": total.to_string(),
                    "entry_count": entry_ids.len(),
                }),
            )
            .await?;

        tx.commit().await?;

        Ok(PaymentWithEntries {
            payment,
            entry_ids: entry_ids.to_vec(),
        })
    }

    pub async fn get(&self, payment_id: Uuid) -> AppResult<PaymentWithEntries> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, owner_id, method, total, created_by, created_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {}", payment_id)))?;

        let entry_ids = self.entry_ids_for(payment_id).await?;
        Ok(PaymentWithEntries { payment, entry_ids })
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, owner_id, method, total, created_by, created_at
            FROM payments
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn entry_ids_for(&self, payment_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT entry_id
            FROM payment_entries
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
