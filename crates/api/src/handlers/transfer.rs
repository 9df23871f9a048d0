//! Handlers for dashboard import/export.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pulseboard_core::transfer::TransferDocument;
use pulseboard_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::ActingUser;
use crate::operations;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboards/{id}/export
pub async fn export_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Path(dashboard_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = operations::export_dashboard(&state, user.user_id, dashboard_id).await?;
    Ok(Json(DataResponse { data: document }))
}

/// GET /api/v1/dashboards/export
///
/// Export every dashboard the acting user owns.
pub async fn export_all(
    user: ActingUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let document = operations::export_all(&state, user.user_id).await?;
    Ok(Json(DataResponse { data: document }))
}

/// POST /api/v1/dashboards/import
///
/// Accepts `dashboard` and `all_dashboards` documents of version 1.x.
pub async fn import(
    user: ActingUser,
    State(state): State<AppState>,
    Json(document): Json<TransferDocument>,
) -> AppResult<impl IntoResponse> {
    let imported = operations::import(&state, user.user_id, document).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: imported })))
}
