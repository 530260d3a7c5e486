//! Matchmaking: turning the pool of waiting users into paired sessions
//! without double-booking anyone.
//!
//! The only point of contention is the claim, and it is resolved entirely by
//! the store's atomic delete-and-return. Losing that race is a normal
//! outcome: the caller stays queued and waits for a bus notification instead
//! of retrying in a loop.

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{ChatSessionEntity, QueueEntryEntity, SessionStatus, Vote},
    dao::queue_store::QueueScanFilter,
    error::ServiceError,
    state::{BusEvent, SharedState},
};

/// Result of one matching attempt.
#[derive(Debug)]
pub enum MatchOutcome {
    /// A session was created; the requester is participant A.
    Matched(ChatSessionEntity),
    /// No eligible candidate, or another matcher claimed the chosen one
    /// first. The requester remains queued.
    Waiting,
}

/// Enter the waiting queue, replacing any prior entry for this identity so at
/// most one exists. Re-enqueueing restarts the wait clock, which doubles as
/// the staleness heartbeat for clients still searching.
pub async fn enqueue(
    state: &SharedState,
    identity: String,
    tags: Vec<String>,
) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    stores.queue.delete(identity.clone()).await?;
    stores
        .queue
        .insert(QueueEntryEntity {
            identity,
            tags,
            enqueued_at: OffsetDateTime::now_utc(),
        })
        .await?;
    Ok(())
}

/// Leave the queue. A claim racing with this cancel simply finds no row and
/// resolves to [`MatchOutcome::Waiting`] on the claimant's side.
pub async fn cancel(state: &SharedState, identity: String) -> Result<(), ServiceError> {
    let stores = state.require_stores().await?;
    stores.queue.delete(identity).await?;
    Ok(())
}

/// Enqueue and immediately attempt a claim; callers subscribe to the bus
/// before invoking this so a match made by the other side is not missed.
pub async fn search(
    state: &SharedState,
    identity: String,
    tags: Vec<String>,
    excluded: Option<String>,
    window: Duration,
) -> Result<MatchOutcome, ServiceError> {
    enqueue(state, identity.clone(), tags.clone()).await?;
    find_and_claim(state, identity, tags, excluded, window).await
}

/// Select a waiting partner and claim it atomically, creating the session on
/// success.
///
/// Candidates are scanned oldest-first within the staleness horizon, capped
/// at the configured scan limit. The first candidate sharing a tag with the
/// requester wins; with no tag overlap anywhere, the longest-waiting
/// candidate does (FIFO fallback). Overlap size never matters.
pub async fn find_and_claim(
    state: &SharedState,
    identity: String,
    tags: Vec<String>,
    excluded: Option<String>,
    window: Duration,
) -> Result<MatchOutcome, ServiceError> {
    let stores = state.require_stores().await?;
    let config = state.config();
    let now = OffsetDateTime::now_utc();

    let mut exclude = vec![identity.clone()];
    exclude.extend(excluded);

    let candidates = stores
        .queue
        .scan(QueueScanFilter {
            exclude,
            newer_than: now - config.staleness_horizon(),
            limit: config.scan_limit(),
        })
        .await?;

    let Some(selection) = select_candidate(&candidates, &tags) else {
        debug!(%identity, "no eligible candidate in the queue");
        return Ok(MatchOutcome::Waiting);
    };
    let chosen = selection.candidate.identity.clone();
    let matched_tag = selection.matched_tag;

    // The linearization point: whoever gets the row back owns the candidate.
    let Some(claimed) = stores.queue.delete_returning(chosen.clone()).await? else {
        debug!(%identity, candidate = %chosen, "claim race lost; staying queued");
        return Ok(MatchOutcome::Waiting);
    };

    stores.queue.delete(identity.clone()).await?;

    let session = stores
        .sessions
        .create(ChatSessionEntity {
            id: Uuid::new_v4(),
            participant_a: identity,
            participant_b: claimed.identity,
            status: SessionStatus::Active,
            expires_at: now + window,
            vote_a: Vote::None,
            vote_b: Vote::None,
            matched_tag,
            created_at: now,
        })
        .await?;

    info!(
        session = %session.id,
        participant_a = %session.participant_a,
        participant_b = %session.participant_b,
        matched_tag = ?session.matched_tag,
        "created chat session"
    );

    // Addressed to the claimed side; the claimer gets the session as the
    // return value.
    state.bus().publish(BusEvent::SessionCreated(session.clone()));

    Ok(MatchOutcome::Matched(session))
}

struct Selection<'a> {
    candidate: &'a QueueEntryEntity,
    matched_tag: Option<String>,
}

/// Apply the tie-break policy: first tag-overlapping candidate in scan order,
/// else the oldest candidate.
fn select_candidate<'a>(
    candidates: &'a [QueueEntryEntity],
    tags: &[String],
) -> Option<Selection<'a>> {
    for candidate in candidates {
        if let Some(tag) = first_common_tag(&candidate.tags, tags) {
            return Some(Selection {
                candidate,
                matched_tag: Some(tag),
            });
        }
    }

    candidates
        .iter()
        .min_by_key(|candidate| candidate.enqueued_at)
        .map(|candidate| Selection {
            candidate,
            matched_tag: None,
        })
}

/// First of the candidate's tags (in declared order) present in the
/// requester's set.
fn first_common_tag(theirs: &[String], mine: &[String]) -> Option<String> {
    theirs.iter().find(|tag| mine.contains(tag)).cloned()
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::services::testing::memory_state;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    async fn insert_aged(
        state: &SharedState,
        identity: &str,
        entry_tags: &[&str],
        age: Duration,
    ) {
        let stores = state.stores().await.expect("stores installed");
        stores
            .queue
            .insert(QueueEntryEntity {
                identity: identity.into(),
                tags: tags(entry_tags),
                enqueued_at: OffsetDateTime::now_utc() - age,
            })
            .await
            .expect("insert");
    }

    async fn queue_contains(state: &SharedState, identity: &str) -> bool {
        let stores = state.stores().await.expect("stores installed");
        let rows = stores
            .queue
            .scan(QueueScanFilter {
                exclude: vec![],
                newer_than: OffsetDateTime::now_utc() - Duration::hours(1),
                limit: 100,
            })
            .await
            .expect("scan");
        rows.iter().any(|row| row.identity == identity)
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_per_identity() {
        let state = memory_state().await;
        enqueue(&state, "alice".into(), tags(&["music"])).await.unwrap();
        enqueue(&state, "alice".into(), tags(&["art"])).await.unwrap();

        let stores = state.stores().await.unwrap();
        let rows = stores
            .queue
            .scan(QueueScanFilter {
                exclude: vec![],
                newer_than: OffsetDateTime::now_utc() - Duration::minutes(2),
                limit: 20,
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tags, tags(&["art"]));
    }

    #[tokio::test]
    async fn tag_overlap_beats_queue_position() {
        let state = memory_state().await;
        // "first" has waited longer but shares nothing with the requester.
        insert_aged(&state, "first", &["gym"], Duration::seconds(60)).await;
        insert_aged(&state, "second", &["music", "art"], Duration::seconds(1)).await;

        let outcome = search(
            &state,
            "alice".into(),
            tags(&["music"]),
            None,
            Duration::minutes(3),
        )
        .await
        .unwrap();

        let MatchOutcome::Matched(session) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(session.participant_a, "alice");
        assert_eq!(session.participant_b, "second");
        assert_eq!(session.matched_tag.as_deref(), Some("music"));

        // Both sides left the queue.
        assert!(!queue_contains(&state, "alice").await);
        assert!(!queue_contains(&state, "second").await);
    }

    #[tokio::test]
    async fn fifo_fallback_picks_the_longest_waiting() {
        let state = memory_state().await;
        insert_aged(&state, "old", &["gym"], Duration::seconds(90)).await;
        insert_aged(&state, "young", &["travel"], Duration::seconds(5)).await;

        let outcome = search(
            &state,
            "alice".into(),
            tags(&["music"]),
            None,
            Duration::minutes(3),
        )
        .await
        .unwrap();

        let MatchOutcome::Matched(session) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(session.participant_b, "old");
        assert_eq!(session.matched_tag, None);
    }

    #[tokio::test]
    async fn stale_entries_are_never_candidates() {
        let state = memory_state().await;
        insert_aged(&state, "ghost", &["music"], Duration::minutes(5)).await;

        let outcome = search(
            &state,
            "alice".into(),
            tags(&["music"]),
            None,
            Duration::minutes(3),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
        // The stale row is ignored, not reaped.
        assert!(queue_contains(&state, "ghost").await);
    }

    #[tokio::test]
    async fn excluded_identity_is_skipped() {
        let state = memory_state().await;
        insert_aged(&state, "ex-partner", &["music"], Duration::seconds(30)).await;

        let outcome = search(
            &state,
            "alice".into(),
            tags(&["music"]),
            Some("ex-partner".into()),
            Duration::seconds(30),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
    }

    #[tokio::test]
    async fn cancelled_entry_cannot_be_claimed() {
        let state = memory_state().await;
        enqueue(&state, "alice".into(), tags(&[])).await.unwrap();
        cancel(&state, "alice".into()).await.unwrap();

        let outcome = find_and_claim(
            &state,
            "bob".into(),
            tags(&[]),
            None,
            Duration::minutes(3),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, MatchOutcome::Waiting));
    }

    #[tokio::test]
    async fn concurrent_claims_never_double_book_a_candidate() {
        for _ in 0..25 {
            let state = memory_state().await;
            insert_aged(&state, "candidate", &[], Duration::seconds(10)).await;
            enqueue(&state, "left".into(), tags(&[])).await.unwrap();
            enqueue(&state, "right".into(), tags(&[])).await.unwrap();

            let left_state = state.clone();
            let right_state = state.clone();
            let left = tokio::spawn(async move {
                find_and_claim(
                    &left_state,
                    "left".into(),
                    vec![],
                    Some("right".into()),
                    Duration::minutes(3),
                )
                .await
            });
            let right = tokio::spawn(async move {
                find_and_claim(
                    &right_state,
                    "right".into(),
                    vec![],
                    Some("left".into()),
                    Duration::minutes(3),
                )
                .await
            });

            let (left, right) = (left.await.unwrap().unwrap(), right.await.unwrap().unwrap());
            let mut matched = 0;
            for outcome in [left, right] {
                if let MatchOutcome::Matched(session) = outcome {
                    assert_eq!(session.participant_b, "candidate");
                    matched += 1;
                }
            }
            assert_eq!(matched, 1, "exactly one claimant may win the candidate");
        }
    }

    #[tokio::test]
    async fn session_creation_notifies_the_claimed_side() {
        let state = memory_state().await;
        let mut receiver = state.bus().subscribe();
        insert_aged(&state, "bob", &["music"], Duration::seconds(1)).await;

        search(
            &state,
            "alice".into(),
            tags(&["music"]),
            None,
            Duration::minutes(3),
        )
        .await
        .unwrap();

        let event = receiver.recv().await.unwrap();
        let BusEvent::SessionCreated(session) = event else {
            panic!("expected session created event");
        };
        assert_eq!(session.participant_b, "bob");
    }
}
