use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pulseboard_core::error::CoreError;
use pulseboard_core::webhook::WebhookError;
use pulseboard_core::widget::SubmitError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`WebhookError`] for outbound
/// call failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent `{error, code}` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `pulseboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A widget webhook call failed.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(core) => AppError::Core(core),
            SubmitError::Webhook(webhook) => AppError::Webhook(webhook),
        }
    }
}

impl AppError {
    /// HTTP status, machine-readable code and client-safe message.
    ///
    /// Internal details are logged here and replaced by a generic message.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Webhook errors ---
            AppError::Webhook(err) => classify_webhook_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let mut body = json!({
            "error": message,
            "code": code,
        });

        // Upstream detail helps widget authors debug their endpoint.
        match &self {
            AppError::Webhook(WebhookError::Http {
                status: upstream,
                body: upstream_body,
            }) => {
                body["status"] = json!(upstream);
                body["body"] = json!(upstream_body);
            }
            AppError::Webhook(WebhookError::Decode {
                body: upstream_body,
                ..
            }) => {
                body["body"] = json!(upstream_body);
            }
            _ => {}
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a webhook failure.
///
/// - `NoWebhook` maps to 409: the widget is valid but not wired up.
/// - Upstream HTTP and decode failures map to 502.
/// - Network failures and timeouts map to 504.
fn classify_webhook_error(err: &WebhookError) -> (StatusCode, &'static str, String) {
    match err {
        WebhookError::NoWebhook => (StatusCode::CONFLICT, "NO_WEBHOOK", err.to_string()),
        WebhookError::Http { .. } | WebhookError::Decode { .. } => {
            (StatusCode::BAD_GATEWAY, "WEBHOOK_ERROR", err.to_string())
        }
        WebhookError::Transport(_) => {
            (StatusCode::GATEWAY_TIMEOUT, "WEBHOOK_TRANSPORT", err.to_string())
        }
        WebhookError::Upload(detail) => {
            tracing::error!(error = %detail, "Failed to attach uploaded file");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Foreign key violations map to 404 (the referenced parent is gone).
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Referenced resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
