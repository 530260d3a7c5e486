//! Session lifecycle: observation-driven timer flips, votes, stop, messages,
//! and rotating to a new partner.
//!
//! No background scheduler drives the `active → voting` transition. Every
//! read re-derives the status from the persisted row and the caller's clock;
//! when the derived value differs, the (idempotent) flip is written back and
//! broadcast, so whichever participant looks first advances the session for
//! both.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{ChatSessionEntity, MessageEntity, SessionStatus, Vote},
    error::ServiceError,
    services::matcher_service::{self, MatchOutcome},
    state::{BusEvent, SharedState, StoreHandle},
};

/// Fetch a session, reconciling its status against the caller's clock.
pub async fn observe(state: &SharedState, id: Uuid) -> Result<ChatSessionEntity, ServiceError> {
    let stores = state.require_stores().await?;
    let session = load(&stores, id).await?;
    reconcile(state, &stores, session, OffsetDateTime::now_utc()).await
}

/// Record (or overwrite) the caller's reveal vote and re-evaluate the
/// outcome.
///
/// The evaluation runs on every vote write, not only the voter's own, because
/// the second `yes` is what completes the mutual-reveal condition. Voting on
/// an already-terminal session is a no-op returning the current row.
pub async fn vote(
    state: &SharedState,
    id: Uuid,
    identity: &str,
    value: Vote,
) -> Result<ChatSessionEntity, ServiceError> {
    let stores = state.require_stores().await?;
    let now = OffsetDateTime::now_utc();
    let session = load(&stores, id).await?;

    let Some(side) = session.side_of(identity) else {
        return Err(ServiceError::Unauthorized(format!(
            "`{identity}` is not a participant of session `{id}`"
        )));
    };

    let session = reconcile(state, &stores, session, now).await?;
    if session.status.is_terminal() {
        return Ok(session);
    }

    let Some(updated) = stores.sessions.update_vote(id, side, value).await? else {
        return Err(not_found(id));
    };
    state.bus().publish(BusEvent::SessionUpdated(updated.clone()));

    let settled = reconcile(state, &stores, updated, now).await?;
    if settled.status.is_terminal() {
        info!(session = %id, status = ?settled.status, "session settled by vote");
    }
    Ok(settled)
}

/// End the chat immediately; equivalent to casting a `no` vote. Permitted
/// while `active` or `voting`, a no-op once terminal.
pub async fn stop(
    state: &SharedState,
    id: Uuid,
    identity: &str,
) -> Result<ChatSessionEntity, ServiceError> {
    vote(state, id, identity, Vote::No).await
}

/// Append a chat message; only participants of an active session may write.
pub async fn send_message(
    state: &SharedState,
    id: Uuid,
    identity: &str,
    content: String,
) -> Result<MessageEntity, ServiceError> {
    let stores = state.require_stores().await?;
    let now = OffsetDateTime::now_utc();
    let session = load(&stores, id).await?;

    if session.side_of(identity).is_none() {
        return Err(ServiceError::Unauthorized(format!(
            "`{identity}` is not a participant of session `{id}`"
        )));
    }

    let session = reconcile(state, &stores, session, now).await?;
    if session.status != SessionStatus::Active {
        return Err(ServiceError::InvalidState(
            "messages can only be sent while the chat is active".into(),
        ));
    }

    let message = stores
        .sessions
        .append_message(id, identity.to_owned(), content, now)
        .await?;
    state
        .bus()
        .publish(BusEvent::MessageInserted(message.clone()));
    Ok(message)
}

/// List a session's messages, oldest first.
pub async fn list_messages(
    state: &SharedState,
    id: Uuid,
) -> Result<Vec<MessageEntity>, ServiceError> {
    let stores = state.require_stores().await?;
    // Listing a vanished session reads as empty history on an ended chat;
    // surface the missing row instead.
    load(&stores, id).await?;
    Ok(stores.sessions.list_messages(id).await?)
}

/// Rotate to a new partner from a finished session.
///
/// Re-enters the queue and attempts a claim with the just-left partner
/// excluded, using the shorter rematch window. Only the immediately
/// preceding partner is excluded; earlier ones are fair game again.
pub async fn next_person(
    state: &SharedState,
    id: Uuid,
    identity: &str,
    tags: Vec<String>,
) -> Result<MatchOutcome, ServiceError> {
    let stores = state.require_stores().await?;
    let now = OffsetDateTime::now_utc();
    let session = load(&stores, id).await?;

    let Some(partner) = session.partner_of(identity) else {
        return Err(ServiceError::Unauthorized(format!(
            "`{identity}` is not a participant of session `{id}`"
        )));
    };
    let partner = partner.to_owned();

    let session = reconcile(state, &stores, session, now).await?;
    if !session.status.is_terminal() {
        return Err(ServiceError::InvalidState(
            "the current chat is still live; stop it before searching again".into(),
        ));
    }

    matcher_service::search(
        state,
        identity.to_owned(),
        tags,
        Some(partner),
        state.config().rematch_window(),
    )
    .await
}

async fn load(stores: &StoreHandle, id: Uuid) -> Result<ChatSessionEntity, ServiceError> {
    let Some(session) = stores.sessions.get(id).await? else {
        return Err(not_found(id));
    };
    Ok(session)
}

/// Persist and broadcast the derived status when it differs from the stored
/// one. Multiple observers writing the same value is harmless.
async fn reconcile(
    state: &SharedState,
    stores: &StoreHandle,
    session: ChatSessionEntity,
    now: OffsetDateTime,
) -> Result<ChatSessionEntity, ServiceError> {
    let derived = crate::state::session_machine::derive_session_status(&session, now);
    if derived == session.status {
        return Ok(session);
    }

    let Some(updated) = stores.sessions.update_status(session.id, derived).await? else {
        return Err(not_found(session.id));
    };
    info!(session = %updated.id, from = ?session.status, to = ?derived, "session status advanced");
    state.bus().publish(BusEvent::SessionUpdated(updated.clone()));
    Ok(updated)
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("session `{id}` not found"))
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::services::testing::memory_state;

    async fn create_session(
        state: &SharedState,
        window: Duration,
    ) -> ChatSessionEntity {
        let stores = state.stores().await.expect("stores installed");
        let now = OffsetDateTime::now_utc();
        stores
            .sessions
            .create(ChatSessionEntity {
                id: Uuid::new_v4(),
                participant_a: "alice".into(),
                participant_b: "bob".into(),
                status: SessionStatus::Active,
                expires_at: now + window,
                vote_a: Vote::None,
                vote_b: Vote::None,
                matched_tag: Some("music".into()),
                created_at: now,
            })
            .await
            .expect("create session")
    }

    #[tokio::test]
    async fn observing_an_expired_session_flips_it_to_voting() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;

        let observed = observe(&state, session.id).await.unwrap();
        assert_eq!(observed.status, SessionStatus::Voting);

        // The flip was persisted, not just derived for the response.
        let stores = state.stores().await.unwrap();
        let stored = stores.sessions.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Voting);
    }

    #[tokio::test]
    async fn mutual_yes_reveals_whoever_votes_last() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;

        let after_a = vote(&state, session.id, "alice", Vote::Yes).await.unwrap();
        assert_eq!(after_a.status, SessionStatus::Voting);

        let after_b = vote(&state, session.id, "bob", Vote::Yes).await.unwrap();
        assert_eq!(after_b.status, SessionStatus::Revealed);
    }

    #[tokio::test]
    async fn a_single_no_ends_and_later_votes_change_nothing() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;

        let after_a = vote(&state, session.id, "alice", Vote::No).await.unwrap();
        assert_eq!(after_a.status, SessionStatus::Ended);

        // Bob's yes arrives after the session already ended; it is a no-op.
        let after_b = vote(&state, session.id, "bob", Vote::Yes).await.unwrap();
        assert_eq!(after_b.status, SessionStatus::Ended);
        assert_eq!(after_b.vote_b, Vote::None);
    }

    #[tokio::test]
    async fn revoting_the_same_value_is_idempotent() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;

        let first = vote(&state, session.id, "alice", Vote::Yes).await.unwrap();
        let second = vote(&state, session.id, "alice", Vote::Yes).await.unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(second.vote_a, Vote::Yes);
    }

    #[tokio::test]
    async fn stop_while_active_ends_immediately() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::minutes(3)).await;

        let stopped = stop(&state, session.id, "bob").await.unwrap();
        assert_eq!(stopped.status, SessionStatus::Ended);
        assert_eq!(stopped.vote_b, Vote::No);
    }

    #[tokio::test]
    async fn outsiders_cannot_vote() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::minutes(3)).await;

        let err = vote(&state, session.id, "mallory", Vote::Yes)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn messages_flow_only_while_active() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::minutes(3)).await;

        send_message(&state, session.id, "alice", "hey there".into())
            .await
            .unwrap();

        stop(&state, session.id, "alice").await.unwrap();
        let err = send_message(&state, session.id, "bob", "too late".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let history = list_messages(&state, session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hey there");
    }

    #[tokio::test]
    async fn sending_to_an_expired_chat_is_rejected() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;

        let err = send_message(&state, session.id, "alice", "hello?".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn next_person_excludes_the_previous_partner() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::minutes(3)).await;
        stop(&state, session.id, "alice").await.unwrap();

        // Bob is back in the queue, but he was the previous partner.
        matcher_service::enqueue(&state, "bob".into(), vec![])
            .await
            .unwrap();

        let outcome = next_person(&state, session.id, "alice", vec![])
            .await
            .unwrap();
        assert!(matches!(outcome, MatchOutcome::Waiting));

        // A third user is fair game.
        matcher_service::enqueue(&state, "carol".into(), vec![])
            .await
            .unwrap();
        let outcome = next_person(&state, session.id, "alice", vec![])
            .await
            .unwrap();
        let MatchOutcome::Matched(next) = outcome else {
            panic!("expected a match with carol");
        };
        assert_eq!(next.participant_b, "carol");
        // Rematch sessions run on the short window.
        assert!(next.expires_at <= next.created_at + state.config().rematch_window());
    }

    #[tokio::test]
    async fn next_person_requires_a_finished_session() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::minutes(3)).await;

        let err = next_person(&state, session.id, "alice", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn vote_updates_are_broadcast_for_both_observers() {
        let state = memory_state().await;
        let session = create_session(&state, Duration::seconds(-1)).await;
        let mut receiver = state.bus().subscribe();

        vote(&state, session.id, "alice", Vote::Yes).await.unwrap();

        // At least one update event carries the new vote; observers re-read
        // the row anyway, so duplicates are fine.
        let mut saw_vote = false;
        while let Ok(event) = receiver.try_recv() {
            if let BusEvent::SessionUpdated(updated) = event {
                saw_vote |= updated.vote_a == Vote::Yes;
            }
        }
        assert!(saw_vote);
    }
}
