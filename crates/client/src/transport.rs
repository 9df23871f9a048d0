//! Primary→fallback transport.
//!
//! Each operation is attempted once against the structured API. A 404 or an
//! unreachable server moves it to the legacy dispatch endpoint for exactly
//! one more attempt. A request whose response was lost (timeout, reset) only
//! moves over when the operation is idempotent. Every other failure is
//! final. There is no backoff.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::transport::{LegacyEnvelope, LegacyRequest};
use pulseboard_core::types::DbId;
use pulseboard_core::widget::{Position, WidgetRecord};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::operation::Operation;

/// Header carrying the acting user on the primary route.
const USER_ID_HEADER: &str = "x-user-id";

/// Message returned when a refresh for the same widget is still running.
pub const REFRESH_IN_PROGRESS: &str = "Refresh already in progress";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The route that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Primary,
    Fallback,
}

/// Uniform result of an operation, whichever route served it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResult {
    pub ok: bool,
    /// The `data` of the response; `null` on failure or for empty replies.
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransportResult {
    fn success(data: Value) -> Self {
        Self {
            ok: true,
            data,
            message: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: Value::Null,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportOutcome {
    /// `None` when the operation was answered locally without a request.
    pub route: Option<Route>,
    pub result: TransportResult,
}

#[derive(Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

pub struct Transport {
    http: reqwest::Client,
    config: TransportConfig,
    refreshing: Mutex<HashSet<DbId>>,
}

/// Marks a widget refresh as in flight until dropped.
struct RefreshGuard<'a> {
    refreshing: &'a Mutex<HashSet<DbId>>,
    widget_id: DbId,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.refreshing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.widget_id);
    }
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: TransportConfig) -> Self {
        Self {
            http,
            config,
            refreshing: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Run `operation`: one primary attempt, then at most one fallback.
    pub async fn execute(&self, operation: &Operation) -> TransportOutcome {
        let name = operation.legacy_operation();

        let primary_error = match self.primary(operation).await {
            Ok(data) => {
                return TransportOutcome {
                    route: Some(Route::Primary),
                    result: TransportResult::success(data),
                }
            }
            Err(e) => e,
        };

        if !primary_error.falls_back(operation.is_idempotent()) {
            tracing::debug!(operation = %name, error = %primary_error, "Primary route failed");
            return TransportOutcome {
                route: Some(Route::Primary),
                result: TransportResult::failure(primary_error.to_string()),
            };
        }

        let Some(legacy_url) = self.config.legacy_url.as_deref() else {
            tracing::warn!(operation = %name, error = %primary_error, "Primary route failed and no fallback is configured");
            return TransportOutcome {
                route: Some(Route::Primary),
                result: TransportResult::failure(primary_error.to_string()),
            };
        };

        tracing::warn!(operation = %name, error = %primary_error, "Primary route unavailable, using legacy endpoint");
        let result = match self.fallback(legacy_url, operation).await {
            Ok(data) => TransportResult::success(data),
            Err(e) => {
                tracing::debug!(operation = %name, error = %e, "Legacy route failed");
                TransportResult::failure(e.to_string())
            }
        };
        TransportOutcome {
            route: Some(Route::Fallback),
            result,
        }
    }

    // -- Convenience wrappers ------------------------------------------------

    pub async fn save_dashboard(
        &self,
        id: Option<DbId>,
        dashboard: DashboardInput,
    ) -> TransportOutcome {
        self.execute(&Operation::SaveDashboard { id, dashboard }).await
    }

    pub async fn delete_dashboard(&self, id: DbId) -> TransportOutcome {
        self.execute(&Operation::DeleteDashboard { id }).await
    }

    pub async fn list_dashboards(&self) -> TransportOutcome {
        self.execute(&Operation::GetUserDashboards).await
    }

    pub async fn save_widget(&self, record: WidgetRecord) -> TransportOutcome {
        self.execute(&Operation::SaveWidget(record)).await
    }

    pub async fn delete_widget(&self, id: DbId) -> TransportOutcome {
        self.execute(&Operation::DeleteWidget { id }).await
    }

    pub async fn get_widget(&self, id: DbId) -> TransportOutcome {
        self.execute(&Operation::GetWidget { id }).await
    }

    pub async fn update_widget_position(&self, id: DbId, position: Position) -> TransportOutcome {
        self.execute(&Operation::UpdateWidgetPosition { id, position })
            .await
    }

    /// Refresh a widget. A second refresh of the same widget while the first
    /// is running is answered locally with [`REFRESH_IN_PROGRESS`].
    pub async fn refresh_widget(&self, id: DbId) -> TransportOutcome {
        let Some(_guard) = self.begin_refresh(id) else {
            tracing::debug!(widget_id = id, "Refresh skipped, already in flight");
            return TransportOutcome {
                route: None,
                result: TransportResult::failure(REFRESH_IN_PROGRESS),
            };
        };
        self.execute(&Operation::RefreshWidget { id }).await
    }

    fn begin_refresh(&self, widget_id: DbId) -> Option<RefreshGuard<'_>> {
        let inserted = self
            .refreshing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(widget_id);
        inserted.then_some(RefreshGuard {
            refreshing: &self.refreshing,
            widget_id,
        })
    }

    // -- Routes ---------------------------------------------------------------

    async fn primary(&self, operation: &Operation) -> Result<Value, TransportError> {
        let request = operation.primary_request()?;
        let url = self.config.api_endpoint(&request.path);
        tracing::debug!(method = %request.method, url = %url, "Primary request");

        let mut builder = self
            .http
            .request(request.method, url.as_str())
            .header(USER_ID_HEADER, self.config.user_id.to_string());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::RouteNotFound);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str::<DataEnvelope>(&text)
            .map(|envelope| envelope.data)
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn fallback(
        &self,
        legacy_url: &str,
        operation: &Operation,
    ) -> Result<Value, TransportError> {
        let envelope = LegacyRequest {
            operation: operation.legacy_operation().as_str().to_string(),
            payload: operation.legacy_payload()?,
            token: self.config.token.clone(),
            user_id: Some(self.config.user_id),
        };
        tracing::debug!(operation = %envelope.operation, url = %legacy_url, "Legacy request");

        let response = self.http.post(legacy_url).json(&envelope).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // The legacy endpoint answers with an envelope even on 403.
        match serde_json::from_str::<LegacyEnvelope>(&text) {
            Ok(LegacyEnvelope { ok: true, data, .. }) => Ok(data.unwrap_or(Value::Null)),
            Ok(LegacyEnvelope { message, .. }) => Err(TransportError::Rejected(
                message.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            )),
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            }),
            Err(e) => Err(TransportError::Decode(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn transport() -> Transport {
        Transport::new(TransportConfig {
            api_url: "http://127.0.0.1:1/api/v1".into(),
            legacy_url: None,
            token: String::new(),
            user_id: 1,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn overlapping_refresh_is_answered_locally() {
        let transport = transport();
        let _running = transport.begin_refresh(7).unwrap();

        let outcome = transport.refresh_widget(7).await;

        assert_eq!(outcome.route, None);
        assert!(!outcome.result.ok);
        assert_eq!(outcome.result.message.as_deref(), Some(REFRESH_IN_PROGRESS));
    }

    #[test]
    fn refresh_slot_is_released_on_drop() {
        let transport = transport();

        let first = transport.begin_refresh(7);
        assert!(first.is_some());
        assert!(transport.begin_refresh(7).is_none());
        assert!(transport.begin_refresh(8).is_some());

        drop(first);
        assert!(transport.begin_refresh(7).is_some());
    }

    #[tokio::test]
    async fn unreachable_primary_without_fallback_fails_on_primary() {
        let outcome = transport().list_dashboards().await;

        assert_eq!(outcome.route, Some(Route::Primary));
        assert!(!outcome.result.ok);
        assert!(outcome
            .result
            .message
            .unwrap()
            .starts_with("Network error"));
    }

    #[test]
    fn only_missing_or_unreachable_routes_fall_back() {
        for idempotent in [true, false] {
            assert!(TransportError::RouteNotFound.falls_back(idempotent));
            assert!(TransportError::Unreachable("refused".into()).falls_back(idempotent));
            assert!(!TransportError::Status {
                status: 500,
                message: "HTTP 500".into()
            }
            .falls_back(idempotent));
            assert!(!TransportError::Rejected("no".into()).falls_back(idempotent));
        }
    }

    #[test]
    fn lost_response_falls_back_only_when_idempotent() {
        let timed_out = TransportError::Network("request timed out".into());
        assert!(timed_out.falls_back(true));
        assert!(!timed_out.falls_back(false));
    }
}
