use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::health::{ConfigResponse, HealthResponse},
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
/// Return the current health status of the backend.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = health_service::health_status(&state).await;
    Json(status)
}

#[utoipa::path(
    get,
    path = "/config",
    tag = "health",
    responses((status = 200, description = "Matchmaking constants", body = ConfigResponse))
)]
/// Serve the matchmaking constants so clients share the server's clock rules.
pub async fn config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(health_service::config_payload(&state))
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/healthcheck", get(healthcheck))
        .route("/config", get(config))
}
