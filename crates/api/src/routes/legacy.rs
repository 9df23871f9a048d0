use axum::routing::post;
use axum::Router;

use crate::handlers::legacy;
use crate::state::AppState;

/// Mount the legacy dispatch endpoint (root level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/legacy/dispatch", post(legacy::dispatch))
}
