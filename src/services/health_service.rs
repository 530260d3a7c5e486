use tracing::warn;

use crate::{
    dto::health::{ConfigResponse, HealthResponse},
    state::SharedState,
};

/// Respond with a static health payload while logging degraded operation.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_degraded().await {
        warn!("storage unavailable (degraded mode)");
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

/// Matchmaking constants served to clients so every observer evaluates
/// staleness and windows the same way.
pub fn config_payload(state: &SharedState) -> ConfigResponse {
    let config = state.config();
    ConfigResponse {
        staleness_horizon_secs: config.staleness_horizon_secs(),
        fresh_window_secs: config.fresh_window_secs(),
        rematch_window_secs: config.rematch_window_secs(),
        stop_confirm_secs: config.stop_confirm_secs(),
        scan_limit: config.scan_limit(),
        queue_heartbeat_secs: config.queue_heartbeat_secs(),
    }
}
