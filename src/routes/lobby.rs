use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use validator::Validate;

use crate::{
    dto::lobby::{EnqueueRequest, MatchOutcomeDto, MatchRequest, MatchResponse},
    error::AppError,
    services::matcher_service::{self, MatchOutcome},
    state::SharedState,
};

/// Routes handling the waiting queue and matching attempts.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/queue", post(enqueue))
        .route("/queue/{identity}", delete(cancel))
        .route("/match", post(attempt_match))
}

#[utoipa::path(
    post,
    path = "/queue",
    tag = "lobby",
    request_body = EnqueueRequest,
    responses((status = 204, description = "Queued; any prior entry was replaced"))
)]
/// Enter or refresh the waiting queue.
pub async fn enqueue(
    State(state): State<SharedState>,
    Json(payload): Json<EnqueueRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    matcher_service::enqueue(&state, payload.identity, payload.tags).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/queue/{identity}",
    tag = "lobby",
    params(("identity" = String, Path, description = "Identity leaving the queue")),
    responses((status = 204, description = "Entry removed, if it existed"))
)]
/// Leave the waiting queue.
pub async fn cancel(
    State(state): State<SharedState>,
    Path(identity): Path<String>,
) -> Result<StatusCode, AppError> {
    matcher_service::cancel(&state, identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/match",
    tag = "lobby",
    request_body = MatchRequest,
    responses((status = 200, description = "Match attempt outcome", body = MatchResponse))
)]
/// Enqueue and immediately try to claim a waiting partner.
pub async fn attempt_match(
    State(state): State<SharedState>,
    Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    payload.validate()?;
    let window = state.config().fresh_window();
    let outcome = matcher_service::search(
        &state,
        payload.identity,
        payload.tags,
        payload.exclude,
        window,
    )
    .await?;
    Ok(Json(match_response(outcome)))
}

/// Shared conversion used by the match and next-person endpoints.
pub(crate) fn match_response(outcome: MatchOutcome) -> MatchResponse {
    match outcome {
        MatchOutcome::Matched(session) => MatchResponse {
            outcome: MatchOutcomeDto::Matched,
            session: Some(session.into()),
        },
        MatchOutcome::Waiting => MatchResponse {
            outcome: MatchOutcomeDto::Searching,
            session: None,
        },
    }
}
