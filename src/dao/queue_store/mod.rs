pub mod memory;

use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::dao::{models::QueueEntryEntity, storage::StorageResult};

/// Filter applied to a queue scan when looking for match candidates.
#[derive(Debug, Clone)]
pub struct QueueScanFilter {
    /// Identities that must not appear in the result (the requester itself,
    /// plus optionally the partner just parted from).
    pub exclude: Vec<String>,
    /// Only entries strictly newer than this instant are returned; entries at
    /// or past the staleness horizon stay in storage but are never candidates.
    pub newer_than: OffsetDateTime,
    /// Maximum number of rows returned.
    pub limit: usize,
}

/// Abstraction over the table of waiting users.
///
/// `delete_returning` is the linearization point of the matcher: backends must
/// guarantee that concurrent calls for the same identity hand the row to at
/// most one caller. Application code never compensates with its own locking.
pub trait QueueStore: Send + Sync {
    /// Insert a fresh entry. Callers delete any prior entry first so the
    /// one-entry-per-identity invariant holds.
    fn insert(&self, entry: QueueEntryEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Remove the entry for an identity, if any. Used for explicit cancel and
    /// for clearing the requester's own entry after a successful claim.
    fn delete(&self, identity: String) -> BoxFuture<'static, StorageResult<()>>;

    /// Atomically remove the entry for an identity and return its prior
    /// contents. `None` means another matcher (or a cancel) got there first.
    fn delete_returning(
        &self,
        identity: String,
    ) -> BoxFuture<'static, StorageResult<Option<QueueEntryEntity>>>;

    /// Return matching entries ordered ascending by `enqueued_at`, so the
    /// first row is always the longest-waiting eligible candidate.
    fn scan(
        &self,
        filter: QueueScanFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>>;
}
