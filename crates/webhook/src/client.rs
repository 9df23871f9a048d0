//! HTTP implementation of the widget webhook seam.
//!
//! [`WebhookClient`] executes a widget's [`WebhookDescriptor`] with
//! [`reqwest`]. The encoding decision itself lives in
//! `pulseboard_core::webhook`; this module only turns it into a request.

use std::time::Duration;

use async_trait::async_trait;
use pulseboard_core::webhook::{
    choose_encoding, query_pairs, request_data, ExtraData, HttpMethod, RequestEncoding,
    UploadedFile, WebhookCaller, WebhookDescriptor, WebhookError, WebhookPayload,
    WebhookResponse, CORS_HEADER_VALUE, JSON_CONTENT_TYPE, WEBHOOK_TIMEOUT_SECS,
};
use pulseboard_core::widget::WidgetKind;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Settings applied to every outbound webhook call.
#[derive(Debug, Clone)]
pub struct WebhookClientConfig {
    /// Client-side timeout for one call.
    pub timeout: Duration,
    /// TLS certificate verification. Only disable for self-signed
    /// development endpoints.
    pub verify_tls: bool,
}

impl Default for WebhookClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(WEBHOOK_TIMEOUT_SECS),
            verify_tls: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Executes widget webhooks over HTTP.
pub struct WebhookClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookClient {
    /// Build a client with its own connection pool.
    pub fn new(config: WebhookClientConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| WebhookError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    async fn execute(
        &self,
        kind: WidgetKind,
        descriptor: &WebhookDescriptor,
        extra: &ExtraData,
    ) -> Result<WebhookResponse, WebhookError> {
        if !descriptor.has_url() {
            return Err(WebhookError::NoWebhook);
        }
        let url = descriptor.url.trim();
        let encoding = choose_encoding(kind, descriptor.method, extra);
        let data = request_data(descriptor, extra);
        let mut headers = build_headers(descriptor);

        let request = self.client.request(to_reqwest_method(descriptor.method), url);
        let request = match encoding {
            RequestEncoding::Multipart => {
                // The client sets the boundary; a configured type would break it.
                headers.remove(CONTENT_TYPE);
                let form = build_form(data).await?;
                request.headers(headers).multipart(form)
            }
            RequestEncoding::Json => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                request.headers(headers).json(data)
            }
            RequestEncoding::Query => request.headers(headers).query(&query_pairs(data)),
        };

        tracing::debug!(
            url,
            method = %descriptor.method,
            widget_type = %kind,
            encoding = ?encoding,
            "Calling widget webhook"
        );

        let response = request.send().await.map_err(|e| self.transport_error(url, e))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !(200..300).contains(&status) {
            tracing::warn!(url, status, "Webhook returned non-success status");
            return Err(WebhookError::Http { status, body });
        }

        let payload = decode_payload(&content_type, body)?;
        tracing::info!(url, status, content_type = %content_type, "Webhook call succeeded");

        Ok(WebhookResponse {
            status,
            content_type,
            payload,
        })
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> WebhookError {
        let detail = if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else {
            err.to_string()
        };
        tracing::warn!(url, error = %detail, "Webhook request failed");
        WebhookError::Transport(detail)
    }
}

#[async_trait]
impl WebhookCaller for WebhookClient {
    async fn call(
        &self,
        kind: WidgetKind,
        descriptor: &WebhookDescriptor,
        extra: &ExtraData,
    ) -> Result<WebhookResponse, WebhookError> {
        self.execute(kind, descriptor, extra).await
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Configured headers (later duplicates win) plus the forced CORS header.
/// Names or values that are not valid HTTP are skipped.
fn build_headers(descriptor: &WebhookDescriptor) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in descriptor.effective_headers() {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                tracing::warn!(header = %key, "Skipping invalid webhook header name");
                continue;
            }
        };
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %key, "Skipping invalid webhook header value"),
        }
    }
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static(CORS_HEADER_VALUE),
    );
    headers
}

/// Build a multipart form: uploads become file parts, scalars text parts.
async fn build_form(data: &ExtraData) -> Result<Form, WebhookError> {
    let mut form = Form::new();
    for (key, value) in data {
        if let Some(file) = UploadedFile::from_value(value) {
            form = form.part(key.clone(), file_part(&file).await?);
            continue;
        }
        match value {
            Value::Null => {}
            Value::String(s) => form = form.text(key.clone(), s.clone()),
            other => form = form.text(key.clone(), other.to_string()),
        }
    }
    Ok(form)
}

async fn file_part(file: &UploadedFile) -> Result<Part, WebhookError> {
    let bytes = tokio::fs::read(&file.tmp_path)
        .await
        .map_err(|e| WebhookError::Upload(format!("{}: {e}", file.name)))?;
    let part = Part::bytes(bytes).file_name(file.name.clone());
    match &file.content_type {
        Some(ct) => part
            .mime_str(ct)
            .map_err(|e| WebhookError::Upload(format!("{}: {e}", file.name))),
        None => Ok(part),
    }
}

/// JSON is decoded only when the response declares it; everything else is
/// returned as text.
fn decode_payload(content_type: &str, body: String) -> Result<WebhookPayload, WebhookError> {
    let is_json = content_type.to_ascii_lowercase().contains(JSON_CONTENT_TYPE);
    if !is_json || body.trim().is_empty() {
        return Ok(WebhookPayload::Text(body));
    }
    match serde_json::from_str(&body) {
        Ok(value) => Ok(WebhookPayload::Json(value)),
        Err(e) => Err(WebhookError::Decode {
            detail: e.to_string(),
            body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use pulseboard_core::webhook::HeaderEntry;

    use super::*;

    #[test]
    fn cors_header_is_forced() {
        let descriptor = WebhookDescriptor {
            headers: vec![HeaderEntry {
                key: "Access-Control-Allow-Origin".into(),
                value: "https://only.me".into(),
            }],
            ..Default::default()
        };
        let headers = build_headers(&descriptor);
        assert_eq!(headers["access-control-allow-origin"], "*");
    }

    #[test]
    fn invalid_headers_are_skipped() {
        let descriptor = WebhookDescriptor {
            headers: vec![
                HeaderEntry {
                    key: "Bad Header".into(),
                    value: "x".into(),
                },
                HeaderEntry {
                    key: "X-Token".into(),
                    value: "line\nbreak".into(),
                },
                HeaderEntry {
                    key: "X-Ok".into(),
                    value: "yes".into(),
                },
            ],
            ..Default::default()
        };
        let headers = build_headers(&descriptor);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-ok"], "yes");
    }

    #[test]
    fn json_decoded_only_when_declared() {
        let payload = decode_payload("text/plain", "{\"a\":1}".into()).unwrap();
        assert_eq!(payload, WebhookPayload::Text("{\"a\":1}".into()));

        let payload = decode_payload("application/json; charset=utf-8", "{\"a\":1}".into()).unwrap();
        assert_eq!(payload, WebhookPayload::Json(serde_json::json!({"a": 1})));
    }

    #[test]
    fn malformed_json_keeps_body() {
        match decode_payload("application/json", "{oops".into()) {
            Err(WebhookError::Decode { body, .. }) => assert_eq!(body, "{oops"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_uses_thirty_second_timeout() {
        let config = WebhookClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.verify_tls);
        assert!(WebhookClient::new(config).is_ok());
    }
}
