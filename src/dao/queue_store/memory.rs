use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::dao::{
    models::QueueEntryEntity,
    queue_store::{QueueScanFilter, QueueStore},
    storage::StorageResult,
};

/// In-memory queue backend.
///
/// Used by the test-suite and when no database is configured. The whole table
/// sits behind a single mutex, so `delete_returning` is trivially atomic.
#[derive(Clone, Default)]
pub struct MemoryQueueStore {
    entries: Arc<Mutex<IndexMap<String, QueueEntryEntity>>>,
}

impl MemoryQueueStore {
    /// Create an empty in-memory queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn insert(&self, entry: QueueEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(PoisonError::into_inner);
            guard.insert(entry.identity.clone(), entry);
            Ok(())
        })
    }

    fn delete(&self, identity: String) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(PoisonError::into_inner);
            guard.shift_remove(&identity);
            Ok(())
        })
    }

    fn delete_returning(
        &self,
        identity: String,
    ) -> BoxFuture<'static, StorageResult<Option<QueueEntryEntity>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(guard.shift_remove(&identity))
        })
    }

    fn scan(
        &self,
        filter: QueueScanFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let guard = entries.lock().unwrap_or_else(PoisonError::into_inner);
            let mut rows: Vec<QueueEntryEntity> = guard
                .values()
                .filter(|entry| !filter.exclude.iter().any(|x| *x == entry.identity))
                .filter(|entry| entry.enqueued_at > filter.newer_than)
                .cloned()
                .collect();
            rows.sort_by_key(|entry| entry.enqueued_at);
            rows.truncate(filter.limit);
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;

    fn entry(identity: &str, age_secs: i64) -> QueueEntryEntity {
        QueueEntryEntity {
            identity: identity.into(),
            tags: vec![],
            enqueued_at: OffsetDateTime::now_utc() - Duration::seconds(age_secs),
        }
    }

    fn filter(limit: usize) -> QueueScanFilter {
        QueueScanFilter {
            exclude: vec![],
            newer_than: OffsetDateTime::now_utc() - Duration::seconds(120),
            limit,
        }
    }

    #[tokio::test]
    async fn delete_returning_hands_the_row_to_one_caller() {
        let store = MemoryQueueStore::new();
        store.insert(entry("alice", 0)).await.unwrap();

        let first = store.delete_returning("alice".into()).await.unwrap();
        let second = store.delete_returning("alice".into()).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn scan_orders_by_wait_time_and_honours_filters() {
        let store = MemoryQueueStore::new();
        store.insert(entry("young", 5)).await.unwrap();
        store.insert(entry("old", 60)).await.unwrap();
        store.insert(entry("stale", 500)).await.unwrap();
        store.insert(entry("excluded", 10)).await.unwrap();

        let mut filter = filter(10);
        filter.exclude.push("excluded".into());
        let rows = store.scan(filter).await.unwrap();

        let identities: Vec<_> = rows.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(identities, vec!["old", "young"]);
    }

    #[tokio::test]
    async fn scan_caps_the_candidate_set() {
        let store = MemoryQueueStore::new();
        for i in 0..30 {
            store.insert(entry(&format!("user-{i}"), i)).await.unwrap();
        }

        let rows = store.scan(filter(20)).await.unwrap();
        assert_eq!(rows.len(), 20);
    }
}
