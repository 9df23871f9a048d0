//! Route definitions for widgets.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::widgets;
use crate::state::AppState;

/// Widget routes mounted at `/widgets`.
///
/// ```text
/// POST   /                -> create_widget
/// GET    /{id}            -> get_widget
/// PUT    /{id}            -> update_widget
/// DELETE /{id}            -> delete_widget
/// PUT    /{id}/position   -> update_position
/// POST   /{id}/refresh    -> refresh_widget
/// POST   /{id}/submit     -> submit_widget (JSON or multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(widgets::create_widget))
        .route(
            "/{id}",
            get(widgets::get_widget)
                .put(widgets::update_widget)
                .delete(widgets::delete_widget),
        )
        .route("/{id}/position", put(widgets::update_position))
        .route("/{id}/refresh", post(widgets::refresh_widget))
        .route("/{id}/submit", post(widgets::submit_widget))
}
