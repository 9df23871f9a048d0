//! Widget aggregate: kind, configuration, placement and the last bound view.
//!
//! A [`Widget`] decides between live and placeholder data on render and owns
//! the refresh cycle (webhook call → response processor → stored view).

pub mod config;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::processor::{self, placeholder, FormView, ViewModel};
use crate::types::DbId;
use crate::webhook::{ExtraData, WebhookCaller, WebhookDescriptor, WebhookError};

pub use config::{
    ChartConfig, ChartType, CustomConfig, DataConfig, DataDisplay, FieldType, FormField, ListItem,
    WidgetConfig,
};

/// Maximum length of a widget title.
pub const MAX_TITLE_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// WidgetKind
// ---------------------------------------------------------------------------

/// The closed set of widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Data,
    Chart,
    Custom,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Chart => "chart",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "data" => Ok(Self::Data),
            "chart" => Ok(Self::Chart),
            "custom" => Ok(Self::Custom),
            _ => Err(CoreError::Validation(format!(
                "Invalid widget_type: '{s}'. Must be one of: data, chart, custom"
            ))),
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            Self::Data => "Data Widget",
            Self::Chart => "Chart Widget",
            Self::Custom => "Custom Form",
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position / status
// ---------------------------------------------------------------------------

/// Placement on the dashboard canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 50,
            y: 50,
            width: 300,
            height: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetStatus {
    #[default]
    Active,
    Inactive,
}

impl WidgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Invalid widget status: '{s}'. Must be one of: active, inactive"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// The persisted/exchanged shape of a widget.
///
/// Used by the storage boundary, the legacy transport and import/export.
/// The webhook descriptor sits at the top level; a `webhook` key nested in
/// `config` is accepted on input when the top-level one is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    /// Ignored on update; a widget never moves between dashboards.
    #[serde(default)]
    pub dashboard_id: DbId,
    pub widget_type: WidgetKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub webhook: Option<WebhookDescriptor>,
    #[serde(default)]
    pub status: WidgetStatus,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a custom-form submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The widget or the submitted data failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

// ---------------------------------------------------------------------------
// Render output
// ---------------------------------------------------------------------------

/// What the presentation layer receives for one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedWidget {
    pub id: Option<DbId>,
    pub dashboard_id: DbId,
    pub widget_type: WidgetKind,
    pub title: String,
    pub position: Position,
    /// `true` when `view` holds webhook data rather than placeholders.
    pub live: bool,
    pub view: ViewModel,
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Widget {
    id: Option<DbId>,
    pub dashboard_id: DbId,
    pub title: String,
    config: WidgetConfig,
    pub position: Position,
    pub status: WidgetStatus,
    view_model: Option<ViewModel>,
}

impl Widget {
    /// A new, unsaved widget with the default configuration for `kind`.
    pub fn new(dashboard_id: DbId, kind: WidgetKind) -> Self {
        Self {
            id: None,
            dashboard_id,
            title: kind.default_title().to_string(),
            config: WidgetConfig::default_for(kind),
            position: Position::default(),
            status: WidgetStatus::Active,
            view_model: None,
        }
    }

    /// Build a widget from its persisted record, applying kind defaults for
    /// anything missing. A zero id is treated as "new".
    pub fn from_record(record: WidgetRecord) -> Result<Self, CoreError> {
        let kind = record.widget_type;
        let mut config = WidgetConfig::from_json(kind, &record.config)?;
        if let Some(webhook) = record.webhook {
            *config.webhook_mut() = webhook;
        }

        let title = normalize_title(&record.title, kind)?;

        Ok(Self {
            id: record.id.filter(|id| *id > 0),
            dashboard_id: record.dashboard_id,
            title,
            config,
            position: record.position.unwrap_or_default(),
            status: record.status,
            view_model: None,
        })
    }

    pub fn to_record(&self) -> WidgetRecord {
        WidgetRecord {
            id: self.id,
            dashboard_id: self.dashboard_id,
            widget_type: self.kind(),
            title: self.title.clone(),
            config: self.config.settings_json(),
            position: Some(self.position),
            webhook: Some(self.webhook().clone()),
            status: self.status,
        }
    }

    /// Replace title, configuration, position and status wholesale from a
    /// saved record. The kind and the owning dashboard cannot change.
    pub fn apply_record(&mut self, record: WidgetRecord) -> Result<(), CoreError> {
        if record.widget_type != self.kind() {
            return Err(CoreError::Validation(format!(
                "Widget type cannot change from '{}' to '{}'; create a new widget instead",
                self.kind(),
                record.widget_type
            )));
        }
        let dashboard_id = self.dashboard_id;
        let id = self.id;
        *self = Self::from_record(record)?;
        self.dashboard_id = dashboard_id;
        self.id = id;
        Ok(())
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    /// Record the id assigned by storage on first persist.
    pub fn assign_id(&mut self, id: DbId) {
        self.id = Some(id);
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.kind()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Replace the configuration; the kind must stay the same.
    pub fn replace_config(&mut self, config: WidgetConfig) -> Result<(), CoreError> {
        if config.kind() != self.kind() {
            return Err(CoreError::Validation(format!(
                "Widget type cannot change from '{}' to '{}'",
                self.kind(),
                config.kind()
            )));
        }
        self.config = config;
        Ok(())
    }

    pub fn webhook(&self) -> &WebhookDescriptor {
        self.config.webhook()
    }

    pub fn has_webhook(&self) -> bool {
        self.webhook().has_url()
    }

    pub fn view_model(&self) -> Option<&ViewModel> {
        self.view_model.as_ref()
    }

    /// Run the kind's response processor over `response` and keep the result.
    pub fn bind(&mut self, response: &Value) -> &ViewModel {
        self.view_model.insert(processor::process(response, &self.config))
    }

    /// Fetch fresh data through `caller` and bind it.
    ///
    /// A widget without a webhook URL returns [`WebhookError::NoWebhook`]
    /// and `caller` is never invoked.
    pub async fn refresh(&mut self, caller: &dyn WebhookCaller) -> Result<&ViewModel, WebhookError> {
        if !self.has_webhook() {
            return Err(WebhookError::NoWebhook);
        }
        let response = caller
            .call(self.kind(), self.webhook(), &ExtraData::new())
            .await?;
        Ok(self.bind(&response.payload.into_value()))
    }

    /// Send a custom-form submission through `caller` and bind the reply.
    pub async fn submit(
        &mut self,
        caller: &dyn WebhookCaller,
        form: &ExtraData,
    ) -> Result<&ViewModel, SubmitError> {
        let WidgetConfig::Custom(custom) = &self.config else {
            return Err(CoreError::Validation(format!(
                "Only custom widgets accept form submissions, this is a {} widget",
                self.kind()
            ))
            .into());
        };
        custom.validate_submission(form)?;
        if !self.has_webhook() {
            return Err(WebhookError::NoWebhook.into());
        }

        let response = caller.call(self.kind(), self.webhook(), form).await?;
        Ok(self.bind(&response.payload.into_value()))
    }

    /// Produce the view for display: live data when a webhook is configured
    /// and the bound view has its primary field, placeholders otherwise.
    /// Custom widgets always render their form definition.
    pub fn render(&self) -> RenderedWidget {
        let (live, view) = match (&self.config, &self.view_model) {
            (WidgetConfig::Custom(custom), _) => (false, ViewModel::Form(FormView::from(custom))),
            (_, Some(view)) if self.has_webhook() && view.has_primary() => (true, view.clone()),
            (config, _) => (false, placeholder(config)),
        };

        RenderedWidget {
            id: self.id,
            dashboard_id: self.dashboard_id,
            widget_type: self.kind(),
            title: self.title.clone(),
            position: self.position,
            live,
            view,
        }
    }
}

/// Trim a title, default it per kind when blank, and enforce the length cap.
fn normalize_title(title: &str, kind: WidgetKind) -> Result<String, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Ok(kind.default_title().to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Widget title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
