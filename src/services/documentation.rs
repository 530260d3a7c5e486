use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Lounge Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::health::config,
        crate::routes::lobby::enqueue,
        crate::routes::lobby::cancel,
        crate::routes::lobby::attempt_match,
        crate::routes::session::get_session,
        crate::routes::session::vote,
        crate::routes::session::stop,
        crate::routes::session::next_person,
        crate::routes::session::send_message,
        crate::routes::session::list_messages,
        crate::routes::sse::lobby_stream,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::ConfigResponse,
            crate::dto::lobby::EnqueueRequest,
            crate::dto::lobby::MatchRequest,
            crate::dto::lobby::MatchOutcomeDto,
            crate::dto::lobby::MatchResponse,
            crate::dto::session::SessionView,
            crate::dto::session::VoteChoice,
            crate::dto::session::VoteRequest,
            crate::dto::session::StopRequest,
            crate::dto::session::NextRequest,
            crate::dto::session::SendMessageRequest,
            crate::dto::session::MessageView,
            crate::dto::session::MessageListResponse,
            crate::dao::models::SessionStatus,
            crate::dao::models::Vote,
        )
    ),
    tags(
        (name = "health", description = "Health and configuration endpoints"),
        (name = "lobby", description = "Waiting queue and matching"),
        (name = "session", description = "Chat session lifecycle and messages"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
