use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        lobby::MatchResponse,
        session::{
            MessageListResponse, MessageView, NextRequest, SendMessageRequest, SessionView,
            StopRequest, VoteRequest,
        },
    },
    error::AppError,
    routes::lobby::match_response,
    services::session_service,
    state::SharedState,
};

/// Routes handling the session lifecycle and chat log.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/vote", post(vote))
        .route("/sessions/{id}/stop", post(stop))
        .route("/sessions/{id}/next", post(next_person))
        .route(
            "/sessions/{id}/messages",
            get(list_messages).post(send_message),
        )
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses((status = 200, description = "Current session row", body = SessionView))
)]
/// Fetch a session; reading also advances an overdue timer transition.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::observe(&state, id).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/vote",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = VoteRequest,
    responses((status = 200, description = "Session row after the vote", body = SessionView))
)]
/// Cast or overwrite the caller's reveal vote.
pub async fn vote(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<SessionView>, AppError> {
    payload.validate()?;
    let session =
        session_service::vote(&state, id, &payload.identity, payload.vote.into()).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/stop",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = StopRequest,
    responses((status = 200, description = "Session row after stopping", body = SessionView))
)]
/// End the chat immediately; equivalent to voting no.
pub async fn stop(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StopRequest>,
) -> Result<Json<SessionView>, AppError> {
    payload.validate()?;
    let session = session_service::stop(&state, id, &payload.identity).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/next",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session being left behind")),
    request_body = NextRequest,
    responses((status = 200, description = "New match attempt outcome", body = MatchResponse))
)]
/// Rotate to a new partner, excluding the one just left.
pub async fn next_person(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NextRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    payload.validate()?;
    let outcome =
        session_service::next_person(&state, id, &payload.identity, payload.tags).await?;
    Ok(Json(match_response(outcome)))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = SendMessageRequest,
    responses((status = 200, description = "Stored message", body = MessageView))
)]
/// Append a chat message to an active session.
pub async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<MessageView>, AppError> {
    payload.validate()?;
    let message =
        session_service::send_message(&state, id, &payload.identity, payload.content).await?;
    Ok(Json(message.into()))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/messages",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses((status = 200, description = "Message log, oldest first", body = MessageListResponse))
)]
/// List a session's messages.
pub async fn list_messages(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageListResponse>, AppError> {
    let messages = session_service::list_messages(&state, id).await?;
    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}
