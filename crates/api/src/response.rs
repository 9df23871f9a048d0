//! Shared response envelope types for API handlers.
//!
//! All primary API responses use a `{ "data": ... }` envelope. The legacy
//! dispatch endpoint uses `LegacyEnvelope` from `pulseboard_core` instead.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
