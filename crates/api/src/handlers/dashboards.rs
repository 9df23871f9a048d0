//! Handlers for dashboard CRUD and dashboard-wide refresh.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::ActingUser;
use crate::operations;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboards
///
/// List the acting user's dashboards.
pub async fn list_dashboards(
    user: ActingUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dashboards = operations::list_dashboards(&state, user.user_id).await?;
    Ok(Json(DataResponse { data: dashboards }))
}

/// POST /api/v1/dashboards
pub async fn create_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<DashboardInput>,
) -> AppResult<impl IntoResponse> {
    let dashboard = operations::create_dashboard(&state, user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: dashboard })))
}

/// GET /api/v1/dashboards/{id}
///
/// The dashboard with every widget rendered. No webhook is called; widgets
/// show placeholder data until refreshed.
pub async fn get_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Path(dashboard_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = operations::get_dashboard(&state, user.user_id, dashboard_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/dashboards/{id}
///
/// Replace name, description and settings.
pub async fn update_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Path(dashboard_id): Path<DbId>,
    Json(input): Json<DashboardInput>,
) -> AppResult<impl IntoResponse> {
    let dashboard =
        operations::update_dashboard(&state, user.user_id, dashboard_id, input).await?;
    Ok(Json(DataResponse { data: dashboard }))
}

/// DELETE /api/v1/dashboards/{id}
///
/// Delete a dashboard and all of its widgets.
pub async fn delete_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Path(dashboard_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    operations::delete_dashboard(&state, user.user_id, dashboard_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/dashboards/{id}/refresh
///
/// Refresh all widgets concurrently. Per-widget failures are reported in
/// the result list; the request itself succeeds.
pub async fn refresh_dashboard(
    user: ActingUser,
    State(state): State<AppState>,
    Path(dashboard_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let results = operations::refresh_dashboard(&state, user.user_id, dashboard_id).await?;
    Ok(Json(DataResponse { data: results }))
}
