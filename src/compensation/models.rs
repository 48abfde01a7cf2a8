use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Compensation entity - one exact-match marking of pending fees as free.
/// `matched_total` always equals `target_amount` at cent granularity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Compensation {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub matched_total: Decimal,
    pub note: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Compensation plus the entries it freed, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CompensationWithEntries {
    #[serde(flatten)]
    pub compensation: Compensation,
    pub entry_ids: Vec<Uuid>,
}
