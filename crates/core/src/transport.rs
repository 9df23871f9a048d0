//! Wire types of the legacy dispatch endpoint.
//!
//! The legacy path takes a single envelope `{operation, payload, token}` and
//! always answers `{ok, data | message}`. Both the server's dispatch handler
//! and the client transport's fallback route use these types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::DashboardInput;
use crate::error::CoreError;
use crate::types::DbId;
use crate::widget::Position;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Named operations understood by the legacy endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyOperation {
    SaveDashboard,
    DeleteDashboard,
    GetUserDashboards,
    SaveWidget,
    DeleteWidget,
    RefreshWidget,
    GetWidget,
    UpdateWidgetPosition,
}

impl LegacyOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaveDashboard => "save_dashboard",
            Self::DeleteDashboard => "delete_dashboard",
            Self::GetUserDashboards => "get_user_dashboards",
            Self::SaveWidget => "save_widget",
            Self::DeleteWidget => "delete_widget",
            Self::RefreshWidget => "refresh_widget",
            Self::GetWidget => "get_widget",
            Self::UpdateWidgetPosition => "update_widget_position",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "save_dashboard" => Ok(Self::SaveDashboard),
            "delete_dashboard" => Ok(Self::DeleteDashboard),
            "get_user_dashboards" => Ok(Self::GetUserDashboards),
            "save_widget" => Ok(Self::SaveWidget),
            "delete_widget" => Ok(Self::DeleteWidget),
            "refresh_widget" => Ok(Self::RefreshWidget),
            "get_widget" => Ok(Self::GetWidget),
            "update_widget_position" => Ok(Self::UpdateWidgetPosition),
            _ => Err(CoreError::Validation(format!("Unknown operation: '{s}'"))),
        }
    }
}

impl std::fmt::Display for LegacyOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Request envelope posted to the legacy endpoint.
///
/// `operation` stays a string so an unknown name is answered with a
/// `{ok: false}` envelope instead of a deserialisation rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRequest {
    pub operation: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub token: String,
    /// Acting user; required by operations that are scoped to a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
}

/// Uniform legacy response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEnvelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LegacyEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of operations that address one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPayload {
    pub id: DbId,
}

/// `save_dashboard`: creates when `id` is absent, replaces otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDashboardPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    #[serde(flatten)]
    pub dashboard: DashboardInput,
}

/// `update_widget_position`: `{id, x, y, width, height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPayload {
    pub id: DbId,
    #[serde(flatten)]
    pub position: Position,
}

/// Decode an operation payload, mapping failures to a validation error.
pub fn decode_payload<T: serde::de::DeserializeOwned>(
    operation: LegacyOperation,
    payload: Value,
) -> Result<T, CoreError> {
    serde_json::from_value(payload)
        .map_err(|e| CoreError::Validation(format!("Invalid payload for {operation}: {e}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in [
            LegacyOperation::SaveDashboard,
            LegacyOperation::DeleteDashboard,
            LegacyOperation::GetUserDashboards,
            LegacyOperation::SaveWidget,
            LegacyOperation::DeleteWidget,
            LegacyOperation::RefreshWidget,
            LegacyOperation::GetWidget,
            LegacyOperation::UpdateWidgetPosition,
        ] {
            assert_eq!(LegacyOperation::from_str(op.as_str()).unwrap(), op);
        }
        assert_matches!(
            LegacyOperation::from_str("drop_tables"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let ok = serde_json::to_value(LegacyEnvelope::success(json!({"id": 1}))).unwrap();
        assert_eq!(ok, json!({"ok": true, "data": {"id": 1}}));

        let failed = serde_json::to_value(LegacyEnvelope::failure("nope")).unwrap();
        assert_eq!(failed, json!({"ok": false, "message": "nope"}));
    }

    #[test]
    fn position_payload_is_flat() {
        let payload: PositionPayload = decode_payload(
            LegacyOperation::UpdateWidgetPosition,
            json!({"id": 4, "x": 10, "y": 20, "width": 320, "height": 240}),
        )
        .unwrap();
        assert_eq!(payload.id, 4);
        assert_eq!(payload.position.width, 320);
    }

    #[test]
    fn bad_payload_is_validation_error() {
        let result: Result<IdPayload, _> =
            decode_payload(LegacyOperation::DeleteWidget, json!({"id": "x"}));
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("delete_widget"));
    }

    #[test]
    fn save_dashboard_payload_flattens_input() {
        let payload: SaveDashboardPayload = decode_payload(
            LegacyOperation::SaveDashboard,
            json!({"name": "Sales", "settings": {"theme": "dark"}}),
        )
        .unwrap();
        assert_eq!(payload.id, None);
        assert_eq!(payload.dashboard.name, "Sales");
        assert_eq!(payload.dashboard.settings["theme"], "dark");
    }
}
