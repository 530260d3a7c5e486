use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    ChatSessionEntity, MessageEntity, QueueEntryEntity, SessionStatus, Vote,
};

/// Queue row keyed by the waiting user's identity, so the unique `_id` index
/// enforces one entry per identity and `find_one_and_delete` on `_id` is the
/// atomic claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntryDocument {
    #[serde(rename = "_id")]
    identity: String,
    tags: Vec<String>,
    enqueued_at: DateTime,
}

impl From<QueueEntryEntity> for QueueEntryDocument {
    fn from(value: QueueEntryEntity) -> Self {
        Self {
            identity: value.identity,
            tags: value.tags,
            enqueued_at: to_bson_datetime(value.enqueued_at),
        }
    }
}

impl From<QueueEntryDocument> for QueueEntryEntity {
    fn from(value: QueueEntryDocument) -> Self {
        Self {
            identity: value.identity,
            tags: value.tags,
            enqueued_at: from_bson_datetime(value.enqueued_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    participant_a: String,
    participant_b: String,
    status: SessionStatus,
    expires_at: DateTime,
    vote_a: Vote,
    vote_b: Vote,
    matched_tag: Option<String>,
    created_at: DateTime,
}

impl From<ChatSessionEntity> for ChatSessionDocument {
    fn from(value: ChatSessionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            participant_a: value.participant_a,
            participant_b: value.participant_b,
            status: value.status,
            expires_at: to_bson_datetime(value.expires_at),
            vote_a: value.vote_a,
            vote_b: value.vote_b,
            matched_tag: value.matched_tag,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl From<ChatSessionDocument> for ChatSessionEntity {
    fn from(value: ChatSessionDocument) -> Self {
        Self {
            id: parse_uuid(&value.id),
            participant_a: value.participant_a,
            participant_b: value.participant_b,
            status: value.status,
            expires_at: from_bson_datetime(value.expires_at),
            vote_a: value.vote_a,
            vote_b: value.vote_b,
            matched_tag: value.matched_tag,
            created_at: from_bson_datetime(value.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    author: String,
    content: String,
    created_at: DateTime,
}

impl From<MessageEntity> for MessageDocument {
    fn from(value: MessageEntity) -> Self {
        Self {
            id: value.id.to_string(),
            session_id: value.session_id.to_string(),
            author: value.author,
            content: value.content,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl From<MessageDocument> for MessageEntity {
    fn from(value: MessageDocument) -> Self {
        Self {
            id: parse_uuid(&value.id),
            session_id: parse_uuid(&value.session_id),
            author: value.author,
            content: value.content,
            created_at: from_bson_datetime(value.created_at),
        }
    }
}

/// Serialize an enum to the plain string BSON stores for it, for use inside
/// `$set` update documents.
pub fn status_as_str(value: SessionStatus) -> &'static str {
    match value {
        SessionStatus::Active => "active",
        SessionStatus::Voting => "voting",
        SessionStatus::Revealed => "revealed",
        SessionStatus::Ended => "ended",
    }
}

/// String form of a vote value, matching the serde representation.
pub fn vote_as_str(value: Vote) -> &'static str {
    match value {
        Vote::None => "none",
        Vote::Yes => "yes",
        Vote::No => "no",
    }
}

pub fn to_bson_datetime(value: OffsetDateTime) -> DateTime {
    DateTime::from_millis((value.unix_timestamp_nanos() / 1_000_000) as i64)
}

pub fn from_bson_datetime(value: DateTime) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(value.timestamp_millis()) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn parse_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or(Uuid::nil())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn datetime_round_trip_keeps_millisecond_precision() {
        let original = datetime!(2024-05-01 20:30:15.250 UTC);
        let back = from_bson_datetime(to_bson_datetime(original));
        assert_eq!(back, original);
    }

    #[test]
    fn enum_strings_match_serde_representation() {
        assert_eq!(status_as_str(SessionStatus::Voting), "voting");
        assert_eq!(vote_as_str(Vote::Yes), "yes");
    }
}
