use std::sync::Arc;

use pulseboard_core::webhook::WebhookCaller;
use pulseboard_db::DashboardStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Dashboard and widget persistence (PostgreSQL or in-memory).
    pub store: Arc<dyn DashboardStore>,
    /// Executes widget webhooks.
    pub webhooks: Arc<dyn WebhookCaller>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
