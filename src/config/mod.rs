//! Configuration module for the TeamTask client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bounds for the per-request timeout, in seconds.
const MIN_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 15;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST backend
    pub api_base_url: String,
    /// URL of the push channel
    pub ws_url: String,
    /// Path to the SQLite file holding tokens and the cached user
    pub storage_path: PathBuf,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Fixed delay between push channel reconnect attempts
    pub reconnect_delay: Duration,
    /// Reconnect attempts before the push channel gives up
    pub max_reconnect_attempts: u32,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Credentials used by the binary when no session can be restored
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("TEAMTASK_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let ws_url = env::var("TEAMTASK_WS_URL").unwrap_or_else(|_| derive_ws_url(&api_base_url));

        let storage_path = env::var("TEAMTASK_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/session.sqlite".to_string())
            .into();

        let timeout_secs = env::var("TEAMTASK_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MAX_TIMEOUT_SECS)
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);

        let reconnect_delay_ms = env::var("TEAMTASK_RECONNECT_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3000);

        let max_reconnect_attempts = env::var("TEAMTASK_MAX_RECONNECT_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let log_level = env::var("TEAMTASK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_base_url,
            ws_url,
            storage_path,
            request_timeout: Duration::from_secs(timeout_secs),
            reconnect_delay: Duration::from_millis(reconnect_delay_ms),
            max_reconnect_attempts,
            log_level,
            email: env::var("TEAMTASK_EMAIL").ok(),
            password: env::var("TEAMTASK_PASSWORD").ok(),
        }
    }

    /// Configuration pointing at a given backend, with defaults for everything else.
    pub fn for_backend(api_base_url: &str, storage_path: PathBuf) -> Self {
        let api_base_url = api_base_url.trim_end_matches('/').to_string();
        Self {
            ws_url: derive_ws_url(&api_base_url),
            api_base_url,
            storage_path,
            request_timeout: Duration::from_secs(MAX_TIMEOUT_SECS),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
            log_level: "info".to_string(),
            email: None,
            password: None,
        }
    }
}

/// `http://host:port` → `ws://host:port/ws`, `https` → `wss`.
fn derive_ws_url(api_base_url: &str) -> String {
    let base = if let Some(rest) = api_base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        api_base_url.to_string()
    };
    format!("{}/ws", base.trim_end_matches('/'))
}
