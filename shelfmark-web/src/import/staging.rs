//! Session-scoped staging for pending reconciliation batches.
//!
//! Each user owns at most one `PendingBatch` at a time: the staged conflicts
//! and fill candidates from their most recent upload, alive until the batch
//! is applied, skipped, or expires. Uploading again before resolving clobbers
//! the previous batch; that data loss is accepted and logged, matching the
//! single-batch-in-flight session model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConflictPair, FillCandidate};

/// Staged reconciliation state for one upload, owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBatch {
    pub batch_id: Uuid,
    pub user: String,
    pub filename: String,
    /// Collisions with populated records, in source row order.
    pub conflicts: Vec<ConflictPair>,
    /// Matches against empty placeholder records, in source row order.
    pub fills: Vec<FillCandidate>,
    /// Rows already inserted during classification.
    pub inserted_count: usize,
    /// Rows already rejected during classification.
    pub rejected_count: usize,
    pub created_at: DateTime<Utc>,
}

impl PendingBatch {
    pub fn new(
        user: String,
        filename: String,
        conflicts: Vec<ConflictPair>,
        fills: Vec<FillCandidate>,
        inserted_count: usize,
        rejected_count: usize,
    ) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            user,
            filename,
            conflicts,
            fills,
            inserted_count,
            rejected_count,
            created_at: Utc::now(),
        }
    }
}

/// In-memory store holding pending batches keyed by user.
///
/// Stands in for session storage: batches survive across the multi-step
/// reconcile flow but expire after the configured TTL. Shared across
/// handlers the same way other per-service state maps are.
#[derive(Clone)]
pub struct StagingStore {
    batches: Arc<RwLock<HashMap<String, PendingBatch>>>,
    ttl: Duration,
}

impl StagingStore {
    /// Create a store whose batches expire after `ttl_minutes`.
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            batches: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Stage a batch for `user`, discarding any unresolved predecessor.
    pub async fn put(&self, batch: PendingBatch) {
        let mut batches = self.batches.write().await;
        if let Some(old) = batches.insert(batch.user.clone(), batch) {
            tracing::warn!(
                user = %old.user,
                batch_id = %old.batch_id,
                conflicts = old.conflicts.len(),
                fills = old.fills.len(),
                "Discarding unresolved pending batch replaced by a new upload"
            );
        }
    }

    /// Fetch the pending batch for `user`, if one exists and has not expired.
    pub async fn get(&self, user: &str) -> Option<PendingBatch> {
        self.purge_expired().await;
        self.batches.read().await.get(user).cloned()
    }

    /// Destroy the pending batch for `user`, returning it if present.
    pub async fn clear(&self, user: &str) -> Option<PendingBatch> {
        self.batches.write().await.remove(user)
    }

    async fn purge_expired(&self) {
        let cutoff = Utc::now() - self.ttl;
        let mut batches = self.batches.write().await;
        batches.retain(|user, batch| {
            let live = batch.created_at > cutoff;
            if !live {
                tracing::info!(user = %user, batch_id = %batch.batch_id, "Pending batch expired");
            }
            live
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_for(user: &str) -> PendingBatch {
        PendingBatch::new(user.to_string(), "upload.xlsx".to_string(), vec![], vec![], 0, 0)
    }

    #[tokio::test]
    async fn get_returns_staged_batch() {
        let store = StagingStore::new(60);
        store.put(batch_for("maria")).await;

        let fetched = store.get("maria").await.unwrap();
        assert_eq!(fetched.user, "maria");
        assert!(store.get("nikos").await.is_none());
    }

    #[tokio::test]
    async fn second_upload_clobbers_first() {
        let store = StagingStore::new(60);
        store.put(batch_for("maria")).await;
        let first_id = store.get("maria").await.unwrap().batch_id;

        store.put(batch_for("maria")).await;
        let second_id = store.get("maria").await.unwrap().batch_id;
        assert_ne!(first_id, second_id);
    }

    #[tokio::test]
    async fn clear_destroys_batch() {
        let store = StagingStore::new(60);
        store.put(batch_for("maria")).await;
        assert!(store.clear("maria").await.is_some());
        assert!(store.get("maria").await.is_none());
        assert!(store.clear("maria").await.is_none());
    }

    #[tokio::test]
    async fn expired_batches_are_purged_on_access() {
        let store = StagingStore::new(60);
        let mut batch = batch_for("maria");
        batch.created_at = Utc::now() - Duration::minutes(61);
        store.put(batch).await;

        assert!(store.get("maria").await.is_none());
    }
}
