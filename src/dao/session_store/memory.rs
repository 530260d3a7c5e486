use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    models::{ChatSessionEntity, MessageEntity, ParticipantSide, SessionStatus, Vote},
    session_store::SessionStore,
    storage::StorageResult,
};

#[derive(Default)]
struct MemoryInner {
    sessions: HashMap<Uuid, ChatSessionEntity>,
    messages: HashMap<Uuid, Vec<MessageEntity>>,
}

/// In-memory session backend used by tests and database-less deployments.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySessionStore {
    /// Create an empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(
        &self,
        session: ChatSessionEntity,
    ) -> BoxFuture<'static, StorageResult<ChatSessionEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            guard.sessions.insert(session.id, session.clone());
            Ok(session)
        })
    }

    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(guard.sessions.get(&id).cloned())
        })
    }

    fn update_vote(
        &self,
        id: Uuid,
        side: ParticipantSide,
        value: Vote,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(session) = guard.sessions.get_mut(&id) else {
                return Ok(None);
            };
            match side {
                ParticipantSide::A => session.vote_a = value,
                ParticipantSide::B => session.vote_b = value,
            }
            Ok(Some(session.clone()))
        })
    }

    fn update_status(
        &self,
        id: Uuid,
        value: SessionStatus,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(session) = guard.sessions.get_mut(&id) else {
                return Ok(None);
            };
            session.status = value;
            Ok(Some(session.clone()))
        })
    }

    fn append_message(
        &self,
        session_id: Uuid,
        author: String,
        content: String,
        created_at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let message = MessageEntity {
                id: Uuid::new_v4(),
                session_id,
                author,
                content,
                created_at,
            };
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            guard
                .messages
                .entry(session_id)
                .or_default()
                .push(message.clone());
            Ok(message)
        })
    }

    fn list_messages(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let mut rows = guard
                .messages
                .get(&session_id)
                .cloned()
                .unwrap_or_default();
            // Vec order is insertion order; the stable sort keeps it for ties.
            rows.sort_by_key(|message| message.created_at);
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn session() -> ChatSessionEntity {
        let now = OffsetDateTime::now_utc();
        ChatSessionEntity {
            id: Uuid::new_v4(),
            participant_a: "alice".into(),
            participant_b: "bob".into(),
            status: SessionStatus::Active,
            expires_at: now + Duration::minutes(3),
            vote_a: Vote::None,
            vote_b: Vote::None,
            matched_tag: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn votes_land_in_their_own_column() {
        let store = MemorySessionStore::new();
        let created = store.create(session()).await.unwrap();

        let updated = store
            .update_vote(created.id, ParticipantSide::B, Vote::Yes)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.vote_a, Vote::None);
        assert_eq!(updated.vote_b, Vote::Yes);
    }

    #[tokio::test]
    async fn missing_session_yields_none() {
        let store = MemorySessionStore::new();
        let row = store
            .update_status(Uuid::new_v4(), SessionStatus::Voting)
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn messages_come_back_in_creation_order() {
        let store = MemorySessionStore::new();
        let created = store.create(session()).await.unwrap();
        let base = OffsetDateTime::now_utc();

        for (i, body) in ["hi", "hey", "how are you"].iter().enumerate() {
            store
                .append_message(
                    created.id,
                    "alice".into(),
                    (*body).into(),
                    base + Duration::seconds(i as i64),
                )
                .await
                .unwrap();
        }

        let listed = store.list_messages(created.id).await.unwrap();
        let bodies: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(bodies, vec!["hi", "hey", "how are you"]);
    }
}
