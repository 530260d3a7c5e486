pub mod memory;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    models::{ChatSessionEntity, MessageEntity, ParticipantSide, SessionStatus, Vote},
    storage::StorageResult,
};

/// Abstraction over persisted chat sessions and their message logs.
///
/// Sessions are never deleted by the application; retention is an external
/// concern. The two participants write disjoint vote columns, and status
/// writes are idempotent, so backends need no row-level locking beyond
/// single-document update atomicity.
pub trait SessionStore: Send + Sync {
    /// Persist a freshly created session and return the stored row.
    fn create(
        &self,
        session: ChatSessionEntity,
    ) -> BoxFuture<'static, StorageResult<ChatSessionEntity>>;

    /// Fetch a session by id.
    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>>;

    /// Overwrite one participant's vote column and return the updated row.
    /// `None` when the session does not exist.
    fn update_vote(
        &self,
        id: Uuid,
        side: ParticipantSide,
        value: Vote,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>>;

    /// Overwrite the status column and return the updated row. Writing the
    /// value already stored is a harmless no-op; every observer computes the
    /// same value from the same inputs.
    fn update_status(
        &self,
        id: Uuid,
        value: SessionStatus,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>>;

    /// Append a message to a session's log and return the stored row.
    fn append_message(
        &self,
        session_id: Uuid,
        author: String,
        content: String,
        created_at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>>;

    /// Return all messages of a session ordered ascending by creation time,
    /// ties broken by insertion order.
    fn list_messages(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>>;
}
