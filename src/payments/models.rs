use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

/// Payment entity - one collection act covering a set of fee records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Payment plus the entries it settled, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentWithEntries {
    #[serde(flatten)]
    pub payment: Payment,
    pub entry_ids: Vec<Uuid>,
}
