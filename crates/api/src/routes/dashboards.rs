//! Route definitions for dashboards and dashboard transfer.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{dashboards, transfer};
use crate::state::AppState;

/// Dashboard routes mounted at `/dashboards`.
///
/// ```text
/// GET    /               -> list_dashboards
/// POST   /               -> create_dashboard
/// GET    /export         -> export_all
/// POST   /import         -> import
/// GET    /{id}           -> get_dashboard
/// PUT    /{id}           -> update_dashboard
/// DELETE /{id}           -> delete_dashboard
/// POST   /{id}/refresh   -> refresh_dashboard
/// GET    /{id}/export    -> export_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dashboards::list_dashboards).post(dashboards::create_dashboard),
        )
        .route("/export", get(transfer::export_all))
        .route("/import", post(transfer::import))
        .route(
            "/{id}",
            get(dashboards::get_dashboard)
                .put(dashboards::update_dashboard)
                .delete(dashboards::delete_dashboard),
        )
        .route("/{id}/refresh", post(dashboards::refresh_dashboard))
        .route("/{id}/export", get(transfer::export_dashboard))
}
