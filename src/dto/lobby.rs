use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{session::SessionView, validation::validate_tags};

/// Payload entering (or refreshing) the waiting queue.
///
/// Enqueueing is idempotent: any prior entry for the identity is replaced and
/// its wait clock restarts, which is also how clients keep their entry under
/// the staleness horizon while waiting.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EnqueueRequest {
    /// Identity of the waiting user.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
    /// Declared interest tags, used for the tag-affinity tie-break.
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

/// Payload attempting to claim a waiting partner.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MatchRequest {
    /// Identity of the requester.
    #[validate(length(min = 1, max = 64))]
    pub identity: String,
    /// Requester's interest tags.
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    /// Identity that must not be matched, used to avoid instant re-pairing
    /// with a partner just parted from.
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Result of one matching attempt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcomeDto {
    /// A session was created; the requester is participant A.
    Matched,
    /// No eligible candidate, or another matcher won the claim race. The
    /// requester stays queued and should wait for a bus notification.
    Searching,
}

/// Response of the match and next-person endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Whether a session was created.
    pub outcome: MatchOutcomeDto,
    /// The created session, present when `outcome` is `matched`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
}
