use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/lobby/{identity}",
    tag = "sse",
    params(("identity" = String, Path, description = "Waiting identity to notify")),
    responses((status = 200, description = "Lobby SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream match notifications to a waiting client.
pub async fn lobby_stream(
    State(state): State<SharedState>,
    Path(identity): Path<String>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    sse_service::lobby_stream(&state, identity)
}

#[utoipa::path(
    get,
    path = "/sse/session/{id}",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Session to observe")),
    responses((status = 200, description = "Session SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream row updates and new messages of one session.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    sse_service::session_stream(&state, id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/lobby/{identity}", get(lobby_stream))
        .route("/sse/session/{id}", get(session_stream))
}
