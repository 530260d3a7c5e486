use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// One user actively waiting to be matched.
///
/// At most one entry exists per identity: enqueueing always deletes any prior
/// entry before inserting a fresh one, which also serves as the heartbeat
/// refresh. Entries past the staleness horizon are ignored by the matcher but
/// only reaped lazily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntryEntity {
    /// Identity of the waiting user.
    pub identity: String,
    /// Interest tags declared by the user, in the order they were declared.
    pub tags: Vec<String>,
    /// When the user entered (or last refreshed) the queue.
    #[serde(with = "time::serde::rfc3339")]
    pub enqueued_at: OffsetDateTime,
}

/// Lifecycle status of a chat session.
///
/// Transitions only move forward: `Active → Voting → Revealed | Ended`, plus
/// the direct `Active → Ended` edge taken when a participant votes no or stops
/// the chat early. `Revealed` and `Ended` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Live chat; messages can be exchanged until the conversation window ends.
    Active,
    /// The window elapsed; both participants decide whether to reveal.
    Voting,
    /// Both participants voted yes; contact details are mutually visible.
    Revealed,
    /// A participant voted no or stopped the chat.
    Ended,
}

impl SessionStatus {
    /// Whether no further status transition can occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Revealed | SessionStatus::Ended)
    }
}

/// A participant's reveal vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    /// No vote cast yet.
    None,
    /// Consent to reveal.
    Yes,
    /// Decline; ends the session regardless of the partner's vote.
    No,
}

/// Which of the two per-session vote columns a participant owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantSide {
    /// The requester that performed the claim.
    A,
    /// The claimed partner.
    B,
}

/// A paired conversation between two participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSessionEntity {
    /// Stable identifier for the session.
    pub id: Uuid,
    /// The requester whose claim created the session.
    pub participant_a: String,
    /// The waiting user that was claimed.
    pub participant_b: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// When the conversation window closes and voting begins.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Participant A's reveal vote.
    pub vote_a: Vote,
    /// Participant B's reveal vote.
    pub vote_b: Vote,
    /// Shared tag that produced the match, when the pairing arose from tag
    /// overlap rather than the FIFO fallback.
    pub matched_tag: Option<String>,
    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatSessionEntity {
    /// Which vote column the given identity owns, if it participates at all.
    pub fn side_of(&self, identity: &str) -> Option<ParticipantSide> {
        if self.participant_a == identity {
            Some(ParticipantSide::A)
        } else if self.participant_b == identity {
            Some(ParticipantSide::B)
        } else {
            None
        }
    }

    /// Identity of the other participant, if the given identity is one of the two.
    pub fn partner_of(&self, identity: &str) -> Option<&str> {
        match self.side_of(identity)? {
            ParticipantSide::A => Some(&self.participant_b),
            ParticipantSide::B => Some(&self.participant_a),
        }
    }
}

/// One chat message inside a session. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEntity {
    /// Stable identifier for the message.
    pub id: Uuid,
    /// Session the message belongs to.
    pub session_id: Uuid,
    /// Identity of the participant that wrote the message.
    pub author: String,
    /// Message body.
    pub content: String,
    /// Server-assigned creation time; messages are ordered by this field,
    /// ties broken by insertion order.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
