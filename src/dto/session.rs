use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{ChatSessionEntity, MessageEntity, SessionStatus, Vote};
use crate::dto::validation::validate_tags;

/// Full session row as observed by clients.
///
/// Both vote columns are exposed: the row is the single source of truth and
/// clients derive "waiting for partner" locally from it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    /// Session identifier.
    pub id: Uuid,
    /// The requester whose claim created the session.
    pub participant_a: String,
    /// The claimed partner.
    pub participant_b: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// When the conversation window closes.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: OffsetDateTime,
    /// Participant A's reveal vote.
    pub vote_a: Vote,
    /// Participant B's reveal vote.
    pub vote_b: Vote,
    /// Shared tag that produced the match, if any.
    pub matched_tag: Option<String>,
    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<ChatSessionEntity> for SessionView {
    fn from(value: ChatSessionEntity) -> Self {
        Self {
            id: value.id,
            participant_a: value.participant_a,
            participant_b: value.participant_b,
            status: value.status,
            expires_at: value.expires_at,
            vote_a: value.vote_a,
            vote_b: value.vote_b,
            matched_tag: value.matched_tag,
            created_at: value.created_at,
        }
    }
}

/// A reveal vote as submitted by a client; `none` is not a valid submission.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    /// Consent to reveal contact details.
    Yes,
    /// Decline and end the session.
    No,
}

impl From<VoteChoice> for Vote {
    fn from(value: VoteChoice) -> Self {
        match value {
            VoteChoice::Yes => Vote::Yes,
            VoteChoice::No => Vote::No,
        }
    }
}

/// Payload casting or overwriting the caller's reveal vote.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteRequest {
    /// Identity of the voting participant.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
    /// The vote to record.
    pub vote: VoteChoice,
}

/// Payload ending the chat early, equivalent to voting no.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StopRequest {
    /// Identity of the stopping participant.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
}

/// Payload rotating to a new partner from a finished session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NextRequest {
    /// Identity of the rotating participant.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
    /// Current interest tags used for the new search.
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

/// Payload appending a chat message.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    /// Identity of the author; must be a participant.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
    /// Message body.
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// One chat message as observed by clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageView {
    /// Message identifier.
    pub id: Uuid,
    /// Session the message belongs to.
    pub session_id: Uuid,
    /// Identity of the author.
    pub author: String,
    /// Message body.
    pub content: String,
    /// Server-assigned creation time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<MessageEntity> for MessageView {
    fn from(value: MessageEntity) -> Self {
        Self {
            id: value.id,
            session_id: value.session_id,
            author: value.author,
            content: value.content,
            created_at: value.created_at,
        }
    }
}

/// Message log of one session, oldest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    /// Messages ordered ascending by creation time.
    pub messages: Vec<MessageView>,
}
