use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}

/// Matchmaking constants served to clients so every observer uses the same
/// windows.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    /// Maximum age of a matchable queue entry, in seconds.
    pub staleness_horizon_secs: u64,
    /// Conversation window of a fresh lobby match, in seconds.
    pub fresh_window_secs: u64,
    /// Conversation window after rotating to a new partner, in seconds.
    pub rematch_window_secs: u64,
    /// Double-tap confirmation window for the stop button, in seconds.
    pub stop_confirm_secs: u64,
    /// Upper bound on the candidate set examined per matching attempt.
    pub scan_limit: usize,
    /// Recommended queue refresh interval for waiting clients, in seconds.
    pub queue_heartbeat_secs: u64,
}
