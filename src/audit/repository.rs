use super::models::{AuditEvent, AuditEventType};
use crate::error::AppResult;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const INSERT_EVENT: &str = r#"
    INSERT INTO audit_events (event_type, actor_id, entity_id, details)
    VALUES ($1, $2, $3, $4)
    RETURNING id, event_type, actor_id, entity_id, details, created_at
"#;

pub struct AuditRepository {
    pub pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a standalone event. Mutating flows use `record_tx` instead so
    /// the event commits or rolls back with the write it describes.
    pub async fn record(
        &self,
        event_type: AuditEventType,
        actor_id: Option<Uuid>,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> AppResult<AuditEvent> {
        let event = sqlx::query_as::<_, AuditEvent>(INSERT_EVENT)
            .bind(event_type)
            .bind(actor_id)
            .bind(entity_id)
            .bind(details)
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    /// Record an event inside the caller's transaction.
    pub async fn record_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_type: AuditEventType,
        actor_id: Option<Uuid>,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> AppResult<AuditEvent> {
        let event = sqlx::query_as::<_, AuditEvent>(INSERT_EVENT)
            .bind(event_type)
            .bind(actor_id)
            .bind(entity_id)
            .bind(details)
            .fetch_one(&mut **tx)
            .await?;

        Ok(event)
    }

    pub async fn list(
        &self,
        event_type: Option<AuditEventType>,
        limit: i64,
    ) -> AppResult<Vec<AuditEvent>> {
        let events = sqlx::query_as::<_, AuditEvent>(
            r#"
            SELECT id, event_type, actor_id, entity_id, details, created_at
            FROM audit_events
            WHERE $1::audit_event_type IS NULL OR event_type = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(event_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    #[ignore] // needs a reachable Postgres at TEST_DATABASE_URL
    async fn event_rolls_back_with_enclosing_transaction() {
        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let repo = AuditRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let event = repo
            .record_tx(
                &mut tx,
                AuditEventType::LoginFailed,
                None,
                None,
                serde_json::json!({ "username": "ghost" }),
            )
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        // The event must not outlive the write it describes.
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM audit_events WHERE id = $1")
            .bind(event.id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
