//! Legacy single-endpoint dispatch.
//!
//! Older clients post `{operation, payload, token, user_id}` to one URL and
//! expect `{ok, data | message}` back. Domain failures are answered with
//! `200 {ok: false}`; only a bad token changes the status code.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulseboard_core::error::CoreError;
use pulseboard_core::transport::{
    decode_payload, IdPayload, LegacyEnvelope, LegacyOperation, LegacyRequest, PositionPayload,
    SaveDashboardPayload,
};
use pulseboard_core::types::DbId;
use pulseboard_core::widget::WidgetRecord;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::operations;
use crate::state::AppState;

/// POST /legacy/dispatch
pub async fn dispatch(
    State(state): State<AppState>,
    body: Result<Json<LegacyRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Json(LegacyEnvelope::failure(rejection.body_text())).into_response();
        }
    };

    let expected = &state.config.legacy_api_token;
    if expected.is_empty() || request.token != *expected {
        tracing::warn!(operation = %request.operation, "Legacy request with invalid token");
        return (
            StatusCode::FORBIDDEN,
            Json(LegacyEnvelope::failure("Invalid token")),
        )
            .into_response();
    }

    let operation = request.operation.clone();
    let envelope = match run(&state, request).await {
        Ok(data) => LegacyEnvelope::success(data),
        Err(err) => {
            let (_, code, message) = err.classify();
            tracing::debug!(operation = %operation, code, "Legacy operation failed");
            LegacyEnvelope::failure(message)
        }
    };
    Json(envelope).into_response()
}

async fn run(state: &AppState, request: LegacyRequest) -> AppResult<Value> {
    let operation = LegacyOperation::from_str(&request.operation)?;
    let user_id = acting_user(request.user_id)?;
    let payload = request.payload;

    tracing::info!(operation = %operation, user_id, "Legacy dispatch");

    match operation {
        LegacyOperation::SaveDashboard => {
            let save: SaveDashboardPayload = decode_payload(operation, payload)?;
            let dashboard = match save.id.filter(|id| *id > 0) {
                Some(id) => operations::update_dashboard(state, user_id, id, save.dashboard).await?,
                None => operations::create_dashboard(state, user_id, save.dashboard).await?,
            };
            to_value(&dashboard)
        }
        LegacyOperation::DeleteDashboard => {
            let IdPayload { id } = decode_payload(operation, payload)?;
            operations::delete_dashboard(state, user_id, id).await?;
            Ok(serde_json::json!({ "id": id }))
        }
        LegacyOperation::GetUserDashboards => {
            to_value(&operations::list_dashboards(state, user_id).await?)
        }
        LegacyOperation::SaveWidget => {
            let record: WidgetRecord = decode_payload(operation, payload)?;
            to_value(&operations::save_widget(state, user_id, record).await?)
        }
        LegacyOperation::DeleteWidget => {
            let IdPayload { id } = decode_payload(operation, payload)?;
            operations::delete_widget(state, user_id, id).await?;
            Ok(serde_json::json!({ "id": id }))
        }
        LegacyOperation::RefreshWidget => {
            let IdPayload { id } = decode_payload(operation, payload)?;
            to_value(&operations::refresh_widget(state, user_id, id).await?)
        }
        LegacyOperation::GetWidget => {
            let IdPayload { id } = decode_payload(operation, payload)?;
            to_value(&operations::get_widget(state, user_id, id).await?)
        }
        LegacyOperation::UpdateWidgetPosition => {
            let PositionPayload { id, position } = decode_payload(operation, payload)?;
            to_value(&operations::update_widget_position(state, user_id, id, position).await?)
        }
    }
}

fn acting_user(user_id: Option<DbId>) -> AppResult<DbId> {
    user_id.filter(|id| *id > 0).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "A valid user_id is required".to_string(),
        ))
    })
}

fn to_value<T: serde::Serialize>(data: &T) -> AppResult<Value> {
    serde_json::to_value(data)
        .map_err(|e| AppError::InternalError(format!("Failed to encode response: {e}")))
}
