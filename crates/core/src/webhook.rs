//! Webhook descriptor, request-encoding rules and the outbound call seam.
//!
//! A widget owns exactly one [`WebhookDescriptor`]. The HTTP implementation
//! lives in `pulseboard-webhook`; this module only holds the declarative
//! types and the pure decisions (encoding, upload detection) so they can be
//! tested without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::widget::WidgetKind;

/// Fixed client-side timeout for a single webhook call.
pub const WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Slack each outer layer keeps over the one it wraps. A server request
/// must outlive its webhook call, and a client request must outlive the
/// server request, so the innermost timeout is the one that reports.
pub const TIMEOUT_MARGIN_SECS: u64 = 5;

/// Header forced onto every outbound webhook request.
pub const CORS_HEADER_NAME: &str = "Access-Control-Allow-Origin";
pub const CORS_HEADER_VALUE: &str = "*";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Extra request data (form submissions). Uploaded files appear as objects
/// shaped like [`UploadedFile`].
pub type ExtraData = Map<String, Value>;

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// HTTP method a webhook is invoked with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether request data travels in the body (POST/PUT) rather than the query.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured request header. Order matters: later duplicates win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Declarative description of the outbound call a widget makes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookDescriptor {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub body: Map<String, Value>,
}

impl WebhookDescriptor {
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Collapse the ordered header list into final key/value pairs.
    ///
    /// Keys are compared case-insensitively; a later duplicate replaces the
    /// earlier value but keeps the first occurrence's position. Entries with
    /// an empty key are dropped.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::with_capacity(self.headers.len());
        for entry in &self.headers {
            let key = entry.key.trim();
            if key.is_empty() {
                continue;
            }
            match out.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                Some(existing) => existing.1 = entry.value.clone(),
                None => out.push((key.to_string(), entry.value.clone())),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Uploaded files
// ---------------------------------------------------------------------------

/// A completed file upload carried in [`ExtraData`].
///
/// Wire shape: `{name, tmpPath, error, size, type?}` where `error == 0`
/// (or `"OK"`) marks a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original client-side file name.
    pub name: String,
    /// Server-side temporary location of the file contents.
    pub tmp_path: String,
    pub size: u64,
    pub content_type: Option<String>,
}

impl UploadedFile {
    /// Recognise an extra-data entry shaped like a completed upload.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("name")?.as_str()?;
        let tmp_path = obj
            .get("tmpPath")
            .or_else(|| obj.get("tmp_name"))?
            .as_str()?;
        let error = obj.get("error")?;
        let size = obj.get("size")?;

        if tmp_path.trim().is_empty() || !upload_ok(error) {
            return None;
        }

        let size = match size {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };

        Some(Self {
            name: name.to_string(),
            tmp_path: tmp_path.to_string(),
            size,
            content_type: obj
                .get("type")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    /// Serialise into the extra-data wire shape.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert("tmpPath".into(), Value::String(self.tmp_path.clone()));
        obj.insert("error".into(), Value::from(0));
        obj.insert("size".into(), Value::from(self.size));
        if let Some(ct) = &self.content_type {
            obj.insert("type".into(), Value::String(ct.clone()));
        }
        Value::Object(obj)
    }
}

fn upload_ok(error: &Value) -> bool {
    match error {
        Value::Number(n) => n.as_u64() == Some(0),
        Value::String(s) => {
            let s = s.trim();
            s == "0" || s.eq_ignore_ascii_case("ok")
        }
        _ => false,
    }
}

/// Whether any entry in `extra` is a completed upload.
pub fn contains_upload(extra: &ExtraData) -> bool {
    extra.values().any(|v| UploadedFile::from_value(v).is_some())
}

// ---------------------------------------------------------------------------
// Encoding decision
// ---------------------------------------------------------------------------

/// How request data is attached to the outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEncoding {
    /// `multipart/form-data`; the boundary header is left to the HTTP client.
    Multipart,
    /// JSON body with `Content-Type: application/json`.
    Json,
    /// Data appended as query parameters, no body.
    Query,
}

/// Pick the encoding for a call.
///
/// Custom-form widgets with at least one completed upload go multipart.
/// Otherwise POST/PUT send JSON and GET/DELETE use the query string.
pub fn choose_encoding(kind: WidgetKind, method: HttpMethod, extra: &ExtraData) -> RequestEncoding {
    if kind == WidgetKind::Custom && contains_upload(extra) {
        RequestEncoding::Multipart
    } else if method.carries_body() {
        RequestEncoding::Json
    } else {
        RequestEncoding::Query
    }
}

/// The data sent with a call: the extra data, or the descriptor's static
/// body when no extra data was supplied.
pub fn request_data<'a>(descriptor: &'a WebhookDescriptor, extra: &'a ExtraData) -> &'a ExtraData {
    if extra.is_empty() {
        &descriptor.body
    } else {
        extra
    }
}

/// Flatten request data into query pairs. Strings are sent verbatim, other
/// values in their JSON form; `null` entries are omitted.
pub fn query_pairs(data: &ExtraData) -> Vec<(String, String)> {
    data.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Response and errors
// ---------------------------------------------------------------------------

/// Body of a successful webhook response.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// Decoded because the response declared `application/json`.
    Json(Value),
    /// Any other content type, returned unmodified.
    Text(String),
}

impl WebhookPayload {
    /// View the payload as a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Text(s) => Value::String(s),
        }
    }
}

/// A successful (2xx) webhook response.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: String,
    pub payload: WebhookPayload,
}

/// Failure taxonomy for webhook calls.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The widget has no webhook URL; callers render placeholder data.
    #[error("No webhook URL configured")]
    NoWebhook,

    /// Network-level failure (DNS, connect, TLS, timeout).
    #[error("Webhook request failed: {0}")]
    Transport(String),

    /// The remote service answered outside 2xx.
    #[error("Webhook returned HTTP {status}")]
    Http { status: u16, body: String },

    /// The response claimed `application/json` but did not parse.
    #[error("Webhook returned invalid JSON: {detail}")]
    Decode { body: String, detail: String },

    /// An uploaded file referenced by the form data could not be read.
    #[error("Uploaded file could not be attached: {0}")]
    Upload(String),
}

/// Executes webhook calls on behalf of widgets.
#[async_trait]
pub trait WebhookCaller: Send + Sync {
    async fn call(
        &self,
        kind: WidgetKind,
        descriptor: &WebhookDescriptor,
        extra: &ExtraData,
    ) -> Result<WebhookResponse, WebhookError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
