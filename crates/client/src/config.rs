use std::time::Duration;

use pulseboard_core::types::DbId;
use pulseboard_core::webhook::{TIMEOUT_MARGIN_SECS, WEBHOOK_TIMEOUT_SECS};

use crate::error::TransportError;

/// Default request timeout for both routes. Outlasts the server's default
/// request timeout, which in turn outlasts a webhook call.
pub const DEFAULT_TIMEOUT_SECS: u64 = WEBHOOK_TIMEOUT_SECS + 2 * TIMEOUT_MARGIN_SECS;

/// Where and as whom the transport talks to the server.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the structured API, e.g. `http://localhost:3000/api/v1`.
    pub api_url: String,
    /// Full URL of the legacy dispatch endpoint. `None` disables the fallback.
    pub legacy_url: Option<String>,
    /// Shared secret sent in the legacy envelope.
    pub token: String,
    /// Acting user, sent as `x-user-id` and in the legacy envelope.
    pub user_id: DbId,
    pub timeout: Duration,
}

impl TransportConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default                                |
    /// |-----------------------------|----------------------------------------|
    /// | `PULSEBOARD_API_URL`        | `http://localhost:3000/api/v1`         |
    /// | `PULSEBOARD_LEGACY_URL`     | `http://localhost:3000/legacy/dispatch`|
    /// | `PULSEBOARD_TOKEN`          | empty                                  |
    /// | `PULSEBOARD_USER_ID`        | required                               |
    /// | `PULSEBOARD_TIMEOUT_SECS`   | `40`                                   |
    ///
    /// Setting `PULSEBOARD_LEGACY_URL` to an empty string disables the
    /// fallback route.
    pub fn from_env() -> Result<Self, TransportError> {
        let api_url = std::env::var("PULSEBOARD_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/v1".into());

        let legacy_url = match std::env::var("PULSEBOARD_LEGACY_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => Some("http://localhost:3000/legacy/dispatch".into()),
        };

        let token = std::env::var("PULSEBOARD_TOKEN").unwrap_or_default();

        let user_id = std::env::var("PULSEBOARD_USER_ID")
            .map_err(|_| TransportError::Config("PULSEBOARD_USER_ID must be set".into()))?
            .trim()
            .parse::<DbId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                TransportError::Config("PULSEBOARD_USER_ID must be a positive integer".into())
            })?;

        let timeout_secs = match std::env::var("PULSEBOARD_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                TransportError::Config("PULSEBOARD_TIMEOUT_SECS must be a valid u64".into())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            legacy_url,
            token,
            user_id,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Join a route path onto the API base URL.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
