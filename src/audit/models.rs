use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use uuid::Uuid;

/// Audit event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "audit_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    OwnerCreated,
    EntryRegistered,
    EntryExited,
    PaymentCollected,
    CompensationApplied,
    UserCreated,
    UserDeactivated,
    LoginSucceeded,
    LoginFailed,
}

/// Audit log entry. Append-only: the application never updates or deletes
/// these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEvent {
    pub id: Uuid,
    pub event_type: AuditEventType,
    pub actor_id: Option<Uuid>,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
