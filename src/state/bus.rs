use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::dao::models::{ChatSessionEntity, MessageEntity};

/// Row-change notification fanned out to interested observers.
///
/// Delivery is at-least-once and unordered across independent events, so the
/// payload is a hint: observers reconcile by re-reading the full row rather
/// than applying deltas.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A session was created; addressed to `participant_b`, since the
    /// claiming side already holds the session as a return value.
    SessionCreated(ChatSessionEntity),
    /// A vote or status column of the session row changed.
    SessionUpdated(ChatSessionEntity),
    /// A message was appended to a session's log.
    MessageInserted(MessageEntity),
}

/// Subscription filter selecting the events an observer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Sessions created with the given identity as the claimed party.
    SessionCreatedFor(String),
    /// Row updates of one session.
    SessionUpdated(Uuid),
    /// Messages appended to one session.
    MessageInserted(Uuid),
}

impl Topic {
    /// Whether an event falls under this topic.
    pub fn matches(&self, event: &BusEvent) -> bool {
        match (self, event) {
            (Topic::SessionCreatedFor(identity), BusEvent::SessionCreated(session)) => {
                session.participant_b == *identity
            }
            (Topic::SessionUpdated(id), BusEvent::SessionUpdated(session)) => session.id == *id,
            (Topic::MessageInserted(id), BusEvent::MessageInserted(message)) => {
                message.session_id == *id
            }
            _ => false,
        }
    }
}

/// Broadcast hub carrying realtime notifications between the matcher, the
/// session lifecycle, and connected clients.
pub struct RealtimeBus {
    sender: broadcast::Sender<BusEvent>,
}

impl RealtimeBus {
    /// Construct a bus backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a raw subscriber receiving every subsequent event.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers, ignoring delivery errors;
    /// an empty subscriber set just means nobody is watching right now.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }

    /// Stream of events matching any of the given topics. Lagged gaps are
    /// skipped silently: observers re-read rows anyway, so a missed
    /// notification only delays reconciliation until the next one.
    pub fn subscribe_filtered(
        &self,
        topics: Vec<Topic>,
    ) -> impl Stream<Item = BusEvent> + Send + use<> {
        let mut receiver = self.subscribe();
        async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if topics.iter().any(|topic| topic.matches(&event)) {
                            yield event;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use time::OffsetDateTime;

    use super::*;
    use crate::dao::models::{SessionStatus, Vote};

    fn session_for(participant_b: &str) -> ChatSessionEntity {
        let now = OffsetDateTime::now_utc();
        ChatSessionEntity {
            id: Uuid::new_v4(),
            participant_a: "requester".into(),
            participant_b: participant_b.into(),
            status: SessionStatus::Active,
            expires_at: now,
            vote_a: Vote::None,
            vote_b: Vote::None,
            matched_tag: None,
            created_at: now,
        }
    }

    #[test]
    fn topics_match_only_their_own_events() {
        let session = session_for("bob");
        let created = BusEvent::SessionCreated(session.clone());
        let updated = BusEvent::SessionUpdated(session.clone());

        assert!(Topic::SessionCreatedFor("bob".into()).matches(&created));
        assert!(!Topic::SessionCreatedFor("alice".into()).matches(&created));
        assert!(Topic::SessionUpdated(session.id).matches(&updated));
        assert!(!Topic::SessionUpdated(Uuid::new_v4()).matches(&updated));
        assert!(!Topic::SessionUpdated(session.id).matches(&created));
    }

    #[tokio::test]
    async fn filtered_stream_drops_foreign_events() {
        let bus = RealtimeBus::new(16);
        let mut stream = Box::pin(
            bus.subscribe_filtered(vec![Topic::SessionCreatedFor("bob".into())]),
        );

        bus.publish(BusEvent::SessionCreated(session_for("alice")));
        bus.publish(BusEvent::SessionCreated(session_for("bob")));

        let Some(BusEvent::SessionCreated(session)) = stream.next().await else {
            panic!("expected a session created event");
        };
        assert_eq!(session.participant_b, "bob");
    }
}
