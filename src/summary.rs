use crate::entries::models::PendingSummary;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Cached pending-summary entry with timestamp
#[derive(Debug, Clone)]
struct CachedSummary {
    summary: PendingSummary,
    cached_at: DateTime<Utc>,
}

/// In-memory per-owner pending-summary cache with TTL. Writes that touch an
/// owner's entries invalidate that owner's slot.
pub struct SummaryCache {
    cache: Arc<RwLock<HashMap<Uuid, CachedSummary>>>,
    ttl_ms: i64,
}

impl SummaryCache {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl_ms,
        }
    }

    pub async fn get(&self, owner_id: Uuid) -> Option<PendingSummary> {
        let cache = self.cache.read().await;

        if let Some(entry) = cache.get(&owner_id) {
            let age = Utc::now() - entry.cached_at;
            if age.num_milliseconds() < self.ttl_ms {
                debug!(%owner_id, "summary cache hit");
                return Some(entry.summary.clone());
            }
            debug!(%owner_id, "summary cache stale");
        }

        None
    }

    pub async fn set(&self, summary: PendingSummary) {
        let mut cache = self.cache.write().await;
        cache.insert(
            summary.owner_id,
            CachedSummary {
                summary,
                cached_at: Utc::now(),
            },
        );
    }

    pub async fn invalidate(&self, owner_id: Uuid) {
        let mut cache = self.cache.write().await;
        cache.remove(&owner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary(owner_id: Uuid) -> PendingSummary {
        PendingSummary {
            owner_id,
            pending_count: 3,
            pending_total: dec!(7.50),
        }
    }

    #[tokio::test]
    async fn test_set_get_within_ttl() {
        let cache = SummaryCache::new(60_000);
        let owner_id = Uuid::new_v4();
        cache.set(summary(owner_id)).await;

        let hit = cache.get(owner_id).await.unwrap();
        assert_eq!(hit.pending_count, 3);
        assert_eq!(hit.pending_total, dec!(7.50));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_always_stale() {
        let cache = SummaryCache::new(0);
        let owner_id = Uuid::new_v4();
        cache.set(summary(owner_id)).await;
        assert!(cache.get(owner_id).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_owner_slot() {
        let cache = SummaryCache::new(60_000);
        let owner_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        cache.set(summary(owner_id)).await;
        cache.set(summary(other)).await;

        cache.invalidate(owner_id).await;
        assert!(cache.get(owner_id).await.is_none());
        assert!(cache.get(other).await.is_some());
    }
}
