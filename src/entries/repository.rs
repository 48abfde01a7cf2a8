use super::models::{OwnerReport, PendingSummary, VehicleEntry, VehicleType};
use crate::audit::models::AuditEventType;
use crate::audit::AuditRepository;
use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const ENTRY_COLUMNS: &str = r#"
    id, owner_id, plate, vehicle_type, amount, entered_at, exited_at,
    is_paid, is_free, paid_at, freed_at, created_at, updated_at
"#;

pub struct EntryRepository {
    pub pool: PgPool,
    audit: Arc<AuditRepository>,
}

impl EntryRepository {
    pub fn new(pool: PgPool, audit: Arc<AuditRepository>) -> Self {
        Self { pool, audit }
    }

    /// Register an entry and its audit event in one transaction.
    pub async fn create(
        &self,
        actor_id: Uuid,
        owner_id: Uuid,
        plate: &str,
        vehicle_type: VehicleType,
        amount: Decimal,
    ) -> AppResult<VehicleEntry> {
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, VehicleEntry>(&format!(
            r#"
            INSERT INTO vehicle_entries (owner_id, plate, vehicle_type, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(plate)
        .bind(vehicle_type)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::EntryRegistered,
                Some(actor_id),
                Some(entry.id),
                serde_json::json!({
                    "owner_id": entry.owner_id,
                    "plate": entry.plate,
                    "amount": entry.amount.to_string(),
                }),
            )
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    pub async fn get(&self, entry_id: Uuid) -> AppResult<Option<VehicleEntry>> {
        let entry = sqlx::query_as::<_, VehicleEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM vehicle_entries
            WHERE id = $1
            "#
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn get_required(&self, entry_id: Uuid) -> AppResult<VehicleEntry> {
        self.get(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle entry {}", entry_id)))
    }

    /// List an owner's entries, oldest first. With `pending_only` the result
    /// is exactly the matcher-eligible pool in matcher order.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pending_only: bool,
    ) -> AppResult<Vec<VehicleEntry>> {
        let entries = sqlx::query_as::<_, VehicleEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM vehicle_entries
            WHERE owner_id = $1
              AND (NOT $2 OR (NOT is_paid AND NOT is_free))
            ORDER BY entered_at ASC
            "#
        ))
        .bind(owner_id)
        .bind(pending_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Stamp the exit time. Stamping twice is a conflict, not an update.
    pub async fn mark_exit(&self, actor_id: Uuid, entry_id: Uuid) -> AppResult<VehicleEntry> {
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, VehicleEntry>(&format!(
            r#"
            UPDATE vehicle_entries
            SET exited_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND exited_at IS NULL
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = match entry {
            Some(entry) => entry,
            None => {
                // Distinguish "already exited" from "no such entry"
                return match self.get(entry_id).await? {
                    Some(_) => Err(AppError::Conflict(format!(
                        "Vehicle entry {} already has an exit time",
                        entry_id
                    ))),
                    None => Err(AppError::NotFound(format!("Vehicle entry {}", entry_id))),
                };
            }
        };

        self.audit
            .record_tx(
                &mut tx,
                AuditEventType::EntryExited,
                Some(actor_id),
                Some(entry.id),
                serde_json::json!({ "owner_id": entry.owner_id }),
            )
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    pub async fn pending_summary(&self, owner_id: Uuid) -> AppResult<PendingSummary> {
        let summary = sqlx::query_as::<_, PendingSummary>(
            r#"
            SELECT
                $1 AS owner_id,
                COUNT(*) AS pending_count,
                COALESCE(SUM(amount), 0) AS pending_total
            FROM vehicle_entries
            WHERE owner_id = $1 AND NOT is_paid AND NOT is_free
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    pub async fn owner_report(&self, owner_id: Uuid) -> AppResult<OwnerReport> {
        let report = sqlx::query_as::<_, OwnerReport>(
            r#"
            SELECT
                $1 AS owner_id,
                COUNT(*) AS entry_count,
                COALESCE(SUM(amount) FILTER (WHERE is_paid), 0) AS collected_total,
                COALESCE(SUM(amount) FILTER (WHERE is_free), 0) AS compensated_total,
                COALESCE(SUM(amount) FILTER (WHERE NOT is_paid AND NOT is_free), 0) AS pending_total
            FROM vehicle_entries
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }
}
