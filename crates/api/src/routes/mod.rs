pub mod dashboards;
pub mod health;
pub mod legacy;
pub mod widgets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dashboards                         list, create
/// /dashboards/export                  export all owned dashboards (GET)
/// /dashboards/import                  import a transfer document (POST)
/// /dashboards/{id}                    get, update, delete
/// /dashboards/{id}/refresh            refresh every widget (POST)
/// /dashboards/{id}/export             export one dashboard (GET)
///
/// /widgets                            create
/// /widgets/{id}                       get, update, delete
/// /widgets/{id}/position              move / resize (PUT)
/// /widgets/{id}/refresh               call webhook and render (POST)
/// /widgets/{id}/submit                submit a custom form (POST)
/// ```
///
/// Every route requires the `x-user-id` header.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboards", dashboards::router())
        .nest("/widgets", widgets::router())
}
