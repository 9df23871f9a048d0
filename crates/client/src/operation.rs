//! Logical operations and their shape on each route.

use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::transport::{IdPayload, LegacyOperation, PositionPayload, SaveDashboardPayload};
use pulseboard_core::types::DbId;
use pulseboard_core::widget::{Position, WidgetRecord};
use reqwest::Method;
use serde_json::Value;

use crate::error::TransportError;

/// One server operation, independent of the route that carries it.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create when `id` is `None`, replace otherwise.
    SaveDashboard {
        id: Option<DbId>,
        dashboard: DashboardInput,
    },
    DeleteDashboard { id: DbId },
    GetUserDashboards,
    /// Create when the record has no id, replace otherwise.
    SaveWidget(WidgetRecord),
    DeleteWidget { id: DbId },
    RefreshWidget { id: DbId },
    GetWidget { id: DbId },
    UpdateWidgetPosition { id: DbId, position: Position },
}

/// An operation addressed to the structured API.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRequest {
    pub method: Method,
    /// Path relative to the API base URL.
    pub path: String,
    pub body: Option<Value>,
}

impl Operation {
    pub fn legacy_operation(&self) -> LegacyOperation {
        match self {
            Self::SaveDashboard { .. } => LegacyOperation::SaveDashboard,
            Self::DeleteDashboard { .. } => LegacyOperation::DeleteDashboard,
            Self::GetUserDashboards => LegacyOperation::GetUserDashboards,
            Self::SaveWidget(_) => LegacyOperation::SaveWidget,
            Self::DeleteWidget { .. } => LegacyOperation::DeleteWidget,
            Self::RefreshWidget { .. } => LegacyOperation::RefreshWidget,
            Self::GetWidget { .. } => LegacyOperation::GetWidget,
            Self::UpdateWidgetPosition { .. } => LegacyOperation::UpdateWidgetPosition,
        }
    }

    /// Whether repeating the operation leaves the same server state. Creates
    /// add a row per attempt and refreshes call the widget webhook again.
    pub fn is_idempotent(&self) -> bool {
        match self {
            Self::SaveDashboard { id, .. } => existing(*id).is_some(),
            Self::SaveWidget(record) => existing(record.id).is_some(),
            Self::RefreshWidget { .. } => false,
            Self::DeleteDashboard { .. }
            | Self::GetUserDashboards
            | Self::DeleteWidget { .. }
            | Self::GetWidget { .. }
            | Self::UpdateWidgetPosition { .. } => true,
        }
    }

    pub fn primary_request(&self) -> Result<PrimaryRequest, TransportError> {
        let request = match self {
            Self::SaveDashboard { id, dashboard } => match existing(*id) {
                Some(id) => with_body(Method::PUT, format!("dashboards/{id}"), dashboard)?,
                None => with_body(Method::POST, "dashboards".into(), dashboard)?,
            },
            Self::DeleteDashboard { id } => bare(Method::DELETE, format!("dashboards/{id}")),
            Self::GetUserDashboards => bare(Method::GET, "dashboards".into()),
            Self::SaveWidget(record) => match existing(record.id) {
                Some(id) => with_body(Method::PUT, format!("widgets/{id}"), record)?,
                None => with_body(Method::POST, "widgets".into(), record)?,
            },
            Self::DeleteWidget { id } => bare(Method::DELETE, format!("widgets/{id}")),
            Self::RefreshWidget { id } => bare(Method::POST, format!("widgets/{id}/refresh")),
            Self::GetWidget { id } => bare(Method::GET, format!("widgets/{id}")),
            Self::UpdateWidgetPosition { id, position } => {
                with_body(Method::PUT, format!("widgets/{id}/position"), position)?
            }
        };
        Ok(request)
    }

    /// The `payload` of the legacy envelope.
    pub fn legacy_payload(&self) -> Result<Value, TransportError> {
        match self {
            Self::SaveDashboard { id, dashboard } => encode(&SaveDashboardPayload {
                id: existing(*id),
                dashboard: dashboard.clone(),
            }),
            Self::GetUserDashboards => Ok(Value::Object(Default::default())),
            Self::SaveWidget(record) => encode(record),
            Self::DeleteDashboard { id }
            | Self::DeleteWidget { id }
            | Self::RefreshWidget { id }
            | Self::GetWidget { id } => encode(&IdPayload { id: *id }),
            Self::UpdateWidgetPosition { id, position } => encode(&PositionPayload {
                id: *id,
                position: *position,
            }),
        }
    }
}

fn existing(id: Option<DbId>) -> Option<DbId> {
    id.filter(|id| *id > 0)
}

fn bare(method: Method, path: String) -> PrimaryRequest {
    PrimaryRequest {
        method,
        path,
        body: None,
    }
}

fn with_body<T: serde::Serialize>(
    method: Method,
    path: String,
    body: &T,
) -> Result<PrimaryRequest, TransportError> {
    Ok(PrimaryRequest {
        method,
        path,
        body: Some(encode(body)?),
    })
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, TransportError> {
    serde_json::to_value(value).map_err(|e| TransportError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use pulseboard_core::widget::WidgetKind;
    use serde_json::json;

    use super::*;

    fn widget(id: Option<DbId>) -> WidgetRecord {
        WidgetRecord {
            id,
            dashboard_id: 3,
            widget_type: WidgetKind::Data,
            title: "Orders".into(),
            config: Value::Null,
            position: None,
            webhook: None,
            status: Default::default(),
        }
    }

    #[test]
    fn save_widget_creates_or_replaces_by_id() {
        let create = Operation::SaveWidget(widget(None)).primary_request().unwrap();
        assert_eq!(create.method, Method::POST);
        assert_eq!(create.path, "widgets");

        let update = Operation::SaveWidget(widget(Some(9))).primary_request().unwrap();
        assert_eq!(update.method, Method::PUT);
        assert_eq!(update.path, "widgets/9");

        let zero = Operation::SaveWidget(widget(Some(0))).primary_request().unwrap();
        assert_eq!(zero.method, Method::POST);
    }

    #[test]
    fn refresh_has_no_body() {
        let request = Operation::RefreshWidget { id: 4 }.primary_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "widgets/4/refresh");
        assert!(request.body.is_none());
    }

    #[test]
    fn legacy_payloads_match_the_dispatch_shapes() {
        assert_eq!(
            Operation::DeleteWidget { id: 5 }.legacy_payload().unwrap(),
            json!({ "id": 5 })
        );

        let position = Position {
            x: 1,
            y: 2,
            width: 300,
            height: 200,
        };
        assert_eq!(
            Operation::UpdateWidgetPosition { id: 5, position }
                .legacy_payload()
                .unwrap(),
            json!({ "id": 5, "x": 1, "y": 2, "width": 300, "height": 200 })
        );

        let save = Operation::SaveDashboard {
            id: None,
            dashboard: DashboardInput {
                name: "Sales".into(),
                ..Default::default()
            },
        };
        let payload = save.legacy_payload().unwrap();
        assert_eq!(payload["name"], "Sales");
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn only_creates_and_refreshes_are_not_idempotent() {
        assert!(!Operation::SaveWidget(widget(None)).is_idempotent());
        assert!(!Operation::SaveWidget(widget(Some(0))).is_idempotent());
        assert!(Operation::SaveWidget(widget(Some(9))).is_idempotent());
        assert!(!Operation::SaveDashboard {
            id: None,
            dashboard: DashboardInput::default(),
        }
        .is_idempotent());
        assert!(!Operation::RefreshWidget { id: 1 }.is_idempotent());
        assert!(Operation::DeleteWidget { id: 1 }.is_idempotent());
        assert!(Operation::GetUserDashboards.is_idempotent());
    }

    #[test]
    fn operations_name_their_legacy_counterpart() {
        assert_eq!(
            Operation::GetUserDashboards.legacy_operation().as_str(),
            "get_user_dashboards"
        );
        assert_eq!(
            Operation::RefreshWidget { id: 1 }.legacy_operation(),
            LegacyOperation::RefreshWidget
        );
    }
}
