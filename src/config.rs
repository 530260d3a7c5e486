//! Application-level configuration loading for the matchmaking and session
//! window constants.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LOUNGE_BACK_CONFIG_PATH";

const DEFAULT_STALENESS_HORIZON_SECS: u64 = 120;
const DEFAULT_FRESH_WINDOW_SECS: u64 = 180;
const DEFAULT_REMATCH_WINDOW_SECS: u64 = 30;
const DEFAULT_STOP_CONFIRM_SECS: u64 = 3;
const DEFAULT_SCAN_LIMIT: usize = 20;
const DEFAULT_QUEUE_HEARTBEAT_SECS: u64 = 45;

/// Immutable runtime configuration shared across the application.
///
/// All matchmaking constants live here rather than in the core logic; the two
/// conversation windows are intentionally independent (the lobby path and the
/// in-chat rematch path ship different product defaults).
#[derive(Debug, Clone)]
pub struct AppConfig {
    staleness_horizon_secs: u64,
    fresh_window_secs: u64,
    rematch_window_secs: u64,
    stop_confirm_secs: u64,
    scan_limit: usize,
    queue_heartbeat_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults on a missing or malformed file.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Maximum age of a queue entry still eligible for matching.
    pub fn staleness_horizon(&self) -> Duration {
        Duration::seconds(self.staleness_horizon_secs as i64)
    }

    /// Conversation window applied to a fresh lobby match.
    pub fn fresh_window(&self) -> Duration {
        Duration::seconds(self.fresh_window_secs as i64)
    }

    /// Conversation window applied when rotating to a new partner from a
    /// finished chat.
    pub fn rematch_window(&self) -> Duration {
        Duration::seconds(self.rematch_window_secs as i64)
    }

    /// Upper bound on the candidate set examined per matching attempt.
    pub fn scan_limit(&self) -> usize {
        self.scan_limit
    }

    /// Double-tap confirmation window for the stop button, in seconds.
    /// Enforced client-side; served so all clients agree on the value.
    pub fn stop_confirm_secs(&self) -> u64 {
        self.stop_confirm_secs
    }

    /// Recommended interval for clients to refresh their queue entry, in
    /// seconds. Must stay well under the staleness horizon.
    pub fn queue_heartbeat_secs(&self) -> u64 {
        self.queue_heartbeat_secs
    }

    /// Staleness horizon in seconds, for the config endpoint.
    pub fn staleness_horizon_secs(&self) -> u64 {
        self.staleness_horizon_secs
    }

    /// Fresh-match window in seconds, for the config endpoint.
    pub fn fresh_window_secs(&self) -> u64 {
        self.fresh_window_secs
    }

    /// Rematch window in seconds, for the config endpoint.
    pub fn rematch_window_secs(&self) -> u64 {
        self.rematch_window_secs
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            staleness_horizon_secs: DEFAULT_STALENESS_HORIZON_SECS,
            fresh_window_secs: DEFAULT_FRESH_WINDOW_SECS,
            rematch_window_secs: DEFAULT_REMATCH_WINDOW_SECS,
            stop_confirm_secs: DEFAULT_STOP_CONFIRM_SECS,
            scan_limit: DEFAULT_SCAN_LIMIT,
            queue_heartbeat_secs: DEFAULT_QUEUE_HEARTBEAT_SECS,
        }
    }
}

/// JSON representation of the configuration file; every field is optional and
/// falls back to the baked-in default.
#[derive(Debug, Deserialize)]
struct RawConfig {
    staleness_horizon_secs: Option<u64>,
    fresh_window_secs: Option<u64>,
    rematch_window_secs: Option<u64>,
    stop_confirm_secs: Option<u64>,
    scan_limit: Option<usize>,
    queue_heartbeat_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            staleness_horizon_secs: value
                .staleness_horizon_secs
                .unwrap_or(defaults.staleness_horizon_secs),
            fresh_window_secs: value.fresh_window_secs.unwrap_or(defaults.fresh_window_secs),
            rematch_window_secs: value
                .rematch_window_secs
                .unwrap_or(defaults.rematch_window_secs),
            stop_confirm_secs: value.stop_confirm_secs.unwrap_or(defaults.stop_confirm_secs),
            scan_limit: value.scan_limit.unwrap_or(defaults.scan_limit),
            queue_heartbeat_secs: value
                .queue_heartbeat_secs
                .unwrap_or(defaults.queue_heartbeat_secs),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_product_constants() {
        let config = AppConfig::default();
        assert_eq!(config.staleness_horizon(), Duration::seconds(120));
        assert_eq!(config.fresh_window(), Duration::minutes(3));
        assert_eq!(config.rematch_window(), Duration::seconds(30));
        assert_eq!(config.scan_limit(), 20);
        assert_eq!(config.stop_confirm_secs(), 3);
    }

    #[test]
    fn partial_file_only_overrides_what_it_names() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "rematch_window_secs": 45 }"#).expect("valid json");
        let config = AppConfig::from(raw);
        assert_eq!(config.rematch_window(), Duration::seconds(45));
        assert_eq!(config.fresh_window(), Duration::minutes(3));
    }
}
