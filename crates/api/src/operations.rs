//! Dashboard and widget operations.
//!
//! Shared by the primary REST handlers and the legacy dispatch endpoint so
//! both routes produce identical results. Every operation is scoped to the
//! acting user: entities owned by someone else are reported as not found.

use futures::future::join_all;
use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::error::CoreError;
use pulseboard_core::processor::ViewModel;
use pulseboard_core::transfer::{DashboardExport, TransferDocument};
use pulseboard_core::types::DbId;
use pulseboard_core::webhook::ExtraData;
use pulseboard_core::widget::{Position, RenderedWidget, Widget, WidgetKind, WidgetRecord};
use pulseboard_db::models::dashboard::Dashboard;
use pulseboard_db::DashboardImport;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// A dashboard with its widgets rendered (placeholders until refreshed).
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub dashboard: Dashboard,
    pub widgets: Vec<RenderedWidget>,
}

/// A stored widget together with its current rendering.
#[derive(Debug, Serialize)]
pub struct WidgetView {
    pub widget: WidgetRecord,
    pub rendered: RenderedWidget,
}

/// Outcome of refreshing one widget during a dashboard-wide refresh.
///
/// A failed refresh still carries the placeholder rendering so the
/// dashboard can be drawn.
#[derive(Debug, Serialize)]
pub struct WidgetRefresh {
    pub widget_id: DbId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<RenderedWidget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A dashboard created by an import.
#[derive(Debug, Serialize)]
pub struct ImportedDashboard {
    pub dashboard: Dashboard,
    pub widget_count: usize,
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

fn dashboard_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Dashboard",
        id,
    })
}

fn widget_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Widget",
        id,
    })
}

/// Load a dashboard owned by `user_id`.
pub async fn owned_dashboard(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Dashboard> {
    state
        .store
        .find_dashboard(id)
        .await?
        .filter(|d| d.owner_id == user_id)
        .ok_or_else(|| dashboard_not_found(id))
}

/// Load a widget whose dashboard is owned by `user_id`.
pub async fn owned_widget(state: &AppState, user_id: DbId, id: DbId) -> AppResult<WidgetRecord> {
    let record = state
        .store
        .find_widget(id)
        .await?
        .ok_or_else(|| widget_not_found(id))?;

    let owned = state
        .store
        .find_dashboard(record.dashboard_id)
        .await?
        .is_some_and(|d| d.owner_id == user_id);
    if !owned {
        return Err(widget_not_found(id));
    }
    Ok(record)
}

// ---------------------------------------------------------------------------
// Dashboards
// ---------------------------------------------------------------------------

pub async fn list_dashboards(state: &AppState, user_id: DbId) -> AppResult<Vec<Dashboard>> {
    Ok(state.store.list_dashboards(user_id).await?)
}

pub async fn create_dashboard(
    state: &AppState,
    user_id: DbId,
    input: DashboardInput,
) -> AppResult<Dashboard> {
    let input = input.validated()?;
    let dashboard = state.store.create_dashboard(user_id, &input).await?;

    tracing::info!(
        dashboard_id = dashboard.id,
        user_id,
        name = %dashboard.name,
        "Dashboard created",
    );
    Ok(dashboard)
}

/// Replace a dashboard's name, description and settings.
pub async fn update_dashboard(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    input: DashboardInput,
) -> AppResult<Dashboard> {
    let input = input.validated()?;
    owned_dashboard(state, user_id, id).await?;
    let dashboard = state
        .store
        .update_dashboard(id, &input)
        .await?
        .ok_or_else(|| dashboard_not_found(id))?;

    tracing::info!(dashboard_id = id, user_id, "Dashboard updated");
    Ok(dashboard)
}

pub async fn delete_dashboard(state: &AppState, user_id: DbId, id: DbId) -> AppResult<()> {
    owned_dashboard(state, user_id, id).await?;
    if !state.store.delete_dashboard(id).await? {
        return Err(dashboard_not_found(id));
    }

    tracing::info!(dashboard_id = id, user_id, "Dashboard deleted");
    Ok(())
}

/// A dashboard and its widgets, rendered without calling any webhook.
pub async fn get_dashboard(state: &AppState, user_id: DbId, id: DbId) -> AppResult<DashboardView> {
    let dashboard = owned_dashboard(state, user_id, id).await?;
    let widgets = state
        .store
        .list_widgets(id)
        .await?
        .into_iter()
        .filter_map(|record| {
            let widget_id = record.id;
            match Widget::from_record(record) {
                Ok(widget) => Some(widget.render()),
                Err(e) => {
                    tracing::warn!(widget_id, error = %e, "Skipping widget with invalid stored config");
                    None
                }
            }
        })
        .collect();

    Ok(DashboardView { dashboard, widgets })
}

/// Refresh every widget on a dashboard concurrently.
///
/// Custom-form widgets and widgets without a webhook are rendered as-is.
/// One failing webhook does not affect the others.
pub async fn refresh_dashboard(
    state: &AppState,
    user_id: DbId,
    id: DbId,
) -> AppResult<Vec<WidgetRefresh>> {
    owned_dashboard(state, user_id, id).await?;
    let records = state.store.list_widgets(id).await?;
    let count = records.len();

    let results = join_all(records.into_iter().map(|record| refresh_record(state, record))).await;

    let failed = results.iter().filter(|r| !r.ok).count();
    tracing::info!(dashboard_id = id, user_id, widgets = count, failed, "Dashboard refreshed");
    Ok(results)
}

async fn refresh_record(state: &AppState, record: WidgetRecord) -> WidgetRefresh {
    let widget_id = record.id.unwrap_or_default();
    let mut widget = match Widget::from_record(record) {
        Ok(widget) => widget,
        Err(e) => {
            return WidgetRefresh {
                widget_id,
                ok: false,
                widget: None,
                error: Some(e.to_string()),
            }
        }
    };

    if widget.kind() == WidgetKind::Custom || !widget.has_webhook() {
        return WidgetRefresh {
            widget_id,
            ok: true,
            widget: Some(widget.render()),
            error: None,
        };
    }

    let outcome = widget.refresh(state.webhooks.as_ref()).await.map(|_| ());
    match outcome {
        Ok(()) => WidgetRefresh {
            widget_id,
            ok: true,
            widget: Some(widget.render()),
            error: None,
        },
        Err(e) => {
            tracing::warn!(widget_id, error = %e, "Widget refresh failed");
            WidgetRefresh {
                widget_id,
                ok: false,
                widget: Some(widget.render()),
                error: Some(e.to_string()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn view_of(record: WidgetRecord) -> AppResult<WidgetView> {
    let rendered = Widget::from_record(record.clone())?.render();
    Ok(WidgetView {
        widget: record,
        rendered,
    })
}

pub async fn get_widget(state: &AppState, user_id: DbId, id: DbId) -> AppResult<WidgetView> {
    view_of(owned_widget(state, user_id, id).await?)
}

/// Persist a new widget. Missing config keys take the kind defaults.
pub async fn create_widget(
    state: &AppState,
    user_id: DbId,
    mut record: WidgetRecord,
) -> AppResult<WidgetView> {
    owned_dashboard(state, user_id, record.dashboard_id).await?;
    record.id = None;
    let widget = Widget::from_record(record)?;
    let stored = state.store.create_widget(&widget.to_record()).await?;

    tracing::info!(
        widget_id = stored.id,
        dashboard_id = stored.dashboard_id,
        widget_type = %stored.widget_type,
        "Widget created",
    );
    view_of(stored)
}

/// Replace a widget's configuration wholesale. The kind cannot change.
pub async fn update_widget(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    record: WidgetRecord,
) -> AppResult<WidgetView> {
    let existing = owned_widget(state, user_id, id).await?;
    let mut widget = Widget::from_record(existing)?;
    widget.apply_record(record)?;

    let stored = state
        .store
        .update_widget(id, &widget.to_record())
        .await?
        .ok_or_else(|| widget_not_found(id))?;

    tracing::info!(widget_id = id, user_id, "Widget updated");
    view_of(stored)
}

/// Create when the record has no id, replace otherwise.
pub async fn save_widget(
    state: &AppState,
    user_id: DbId,
    record: WidgetRecord,
) -> AppResult<WidgetView> {
    match record.id.filter(|id| *id > 0) {
        Some(id) => update_widget(state, user_id, id, record).await,
        None => create_widget(state, user_id, record).await,
    }
}

pub async fn delete_widget(state: &AppState, user_id: DbId, id: DbId) -> AppResult<()> {
    owned_widget(state, user_id, id).await?;
    if !state.store.delete_widget(id).await? {
        return Err(widget_not_found(id));
    }

    tracing::info!(widget_id = id, user_id, "Widget deleted");
    Ok(())
}

/// Move or resize a widget. Concurrent updates: last write wins.
pub async fn update_widget_position(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    position: Position,
) -> AppResult<WidgetRecord> {
    owned_widget(state, user_id, id).await?;
    let stored = state
        .store
        .update_widget_position(id, position)
        .await?
        .ok_or_else(|| widget_not_found(id))?;

    tracing::debug!(
        widget_id = id,
        x = position.x,
        y = position.y,
        width = position.width,
        height = position.height,
        "Widget position updated",
    );
    Ok(stored)
}

/// Call the widget's webhook and return the rendering.
pub async fn refresh_widget(state: &AppState, user_id: DbId, id: DbId) -> AppResult<RenderedWidget> {
    let record = owned_widget(state, user_id, id).await?;
    let mut widget = Widget::from_record(record)?;
    if widget.kind() == WidgetKind::Custom {
        return Err(AppError::Core(CoreError::Validation(
            "Custom widgets are refreshed by submitting their form".to_string(),
        )));
    }

    widget.refresh(state.webhooks.as_ref()).await?;
    let rendered = widget.render();

    tracing::info!(widget_id = id, user_id, live = rendered.live, "Widget refreshed");
    Ok(rendered)
}

/// Forward a custom-form submission and return the processed reply.
pub async fn submit_widget(
    state: &AppState,
    user_id: DbId,
    id: DbId,
    form: &ExtraData,
) -> AppResult<ViewModel> {
    let record = owned_widget(state, user_id, id).await?;
    let mut widget = Widget::from_record(record)?;
    let view = widget.submit(state.webhooks.as_ref(), form).await?.clone();

    tracing::info!(widget_id = id, user_id, fields = form.len(), "Form submitted");
    Ok(view)
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

async fn export_of(state: &AppState, dashboard: Dashboard) -> AppResult<DashboardExport> {
    let widgets = state.store.list_widgets(dashboard.id).await?;
    let settings = match dashboard.settings {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(DashboardExport {
        name: dashboard.name,
        description: dashboard.description,
        settings,
        widgets,
    })
}

pub async fn export_dashboard(
    state: &AppState,
    user_id: DbId,
    id: DbId,
) -> AppResult<TransferDocument> {
    let dashboard = owned_dashboard(state, user_id, id).await?;
    let export = export_of(state, dashboard).await?;

    tracing::info!(dashboard_id = id, user_id, widgets = export.widgets.len(), "Dashboard exported");
    Ok(TransferDocument::single(export, chrono::Utc::now()))
}

pub async fn export_all(state: &AppState, user_id: DbId) -> AppResult<TransferDocument> {
    let mut exports = Vec::new();
    for dashboard in state.store.list_dashboards(user_id).await? {
        exports.push(export_of(state, dashboard).await?);
    }

    tracing::info!(user_id, dashboards = exports.len(), "All dashboards exported");
    Ok(TransferDocument::all(exports, chrono::Utc::now()))
}

/// Import dashboards from a transfer document.
///
/// Every dashboard and widget is validated before anything is written, and
/// the whole document is then stored in one all-or-nothing batch. Imported
/// widgets get fresh ids.
pub async fn import(
    state: &AppState,
    user_id: DbId,
    document: TransferDocument,
) -> AppResult<Vec<ImportedDashboard>> {
    let mut batch = Vec::new();
    for export in document.into_dashboards()? {
        let (input, widgets) = export.into_parts()?;
        let widgets = widgets
            .into_iter()
            .map(|mut record| {
                record.id = None;
                Widget::from_record(record).map(|w| w.to_record())
            })
            .collect::<Result<Vec<_>, _>>()?;
        batch.push(DashboardImport { input, widgets });
    }

    let imported = state.store.import_dashboards(user_id, batch).await?;
    Ok(imported
        .into_iter()
        .map(|(dashboard, widgets)| {
            let widget_count = widgets.len();
            tracing::info!(dashboard_id = dashboard.id, user_id, widget_count, "Dashboard imported");
            ImportedDashboard {
                dashboard,
                widget_count,
            }
        })
        .collect())
}
