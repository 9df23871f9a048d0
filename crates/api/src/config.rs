use std::path::PathBuf;

use pulseboard_core::webhook::{TIMEOUT_MARGIN_SECS, WEBHOOK_TIMEOUT_SECS};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Always longer than
    /// `webhook_timeout_secs` so a hung webhook is reported as a webhook
    /// failure rather than a bare 408 (default: webhook timeout + `5`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the server keeps data in memory.
    pub database_url: Option<String>,
    /// Shared secret expected in the `token` field of legacy dispatch
    /// requests. An empty token disables the legacy endpoint.
    pub legacy_api_token: String,
    /// Outbound webhook timeout in seconds (default: `30`).
    pub webhook_timeout_secs: u64,
    /// Verify TLS certificates of webhook endpoints (default: `true`).
    pub webhook_verify_tls: bool,
    /// Directory for form uploads awaiting forwarding.
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `35` (webhook timeout + 5) |
    /// | `DATABASE_URL`         | unset (in-memory store)    |
    /// | `LEGACY_API_TOKEN`     | empty (legacy disabled)    |
    /// | `WEBHOOK_TIMEOUT_SECS` | `30`                       |
    /// | `WEBHOOK_VERIFY_TLS`   | `true`                     |
    /// | `UPLOAD_DIR`           | `<tmp>/pulseboard-uploads` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let legacy_api_token = std::env::var("LEGACY_API_TOKEN").unwrap_or_default();

        let webhook_timeout_secs: u64 = std::env::var("WEBHOOK_TIMEOUT_SECS")
            .map(|v| v.parse().expect("WEBHOOK_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(WEBHOOK_TIMEOUT_SECS);

        let request_timeout_secs = resolve_request_timeout(
            std::env::var("REQUEST_TIMEOUT_SECS").ok().as_deref(),
            webhook_timeout_secs,
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let webhook_verify_tls = std::env::var("WEBHOOK_VERIFY_TLS")
            .map(|v| parse_bool(&v).expect("WEBHOOK_VERIFY_TLS must be true or false"))
            .unwrap_or(true);

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("pulseboard-uploads"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            legacy_api_token,
            webhook_timeout_secs,
            webhook_verify_tls,
            upload_dir,
        }
    }
}

/// Resolve the request timeout against the webhook timeout it has to cover.
fn resolve_request_timeout(raw: Option<&str>, webhook_timeout_secs: u64) -> Result<u64, String> {
    let Some(raw) = raw else {
        return Ok(webhook_timeout_secs + TIMEOUT_MARGIN_SECS);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| "REQUEST_TIMEOUT_SECS must be a valid u64".to_string())?;
    if secs <= webhook_timeout_secs {
        return Err(format!(
            "REQUEST_TIMEOUT_SECS ({secs}) must be greater than WEBHOOK_TIMEOUT_SECS ({webhook_timeout_secs})"
        ));
    }
    Ok(secs)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
