use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Co-owner entity - a residential unit owner/tenant that visitor
/// parking fees are charged against.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoOwner {
    pub id: Uuid,
    pub unit_code: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
