/// Failure of one transport attempt.
///
/// Callers see these only as the `message` of a failed
/// [`TransportResult`](crate::TransportResult); the variants decide whether
/// the fallback route is tried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The primary server does not know the route (HTTP 404).
    #[error("Route not found")]
    RouteNotFound,

    /// The server could not be reached (DNS, connect). The request was
    /// never delivered.
    #[error("Network error: {0}")]
    Unreachable(String),

    /// The request was sent but no response arrived (timeout, reset). The
    /// server may have applied it.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The legacy endpoint answered `{ok: false}`.
    #[error("{0}")]
    Rejected(String),

    /// A response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The request payload could not be encoded.
    #[error("Invalid request: {0}")]
    Encode(String),

    /// Missing or malformed client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// Whether this failure of the primary route warrants one legacy attempt.
    ///
    /// A lost response only falls back for idempotent operations; repeating
    /// a create could store it twice.
    pub fn falls_back(&self, idempotent: bool) -> bool {
        match self {
            Self::RouteNotFound | Self::Unreachable(_) => true,
            Self::Network(_) => idempotent,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
