//! Kind-specific widget configuration.
//!
//! Each config is persisted as a camelCase JSON object. Missing keys take
//! the kind defaults, so a partially filled config from an older client or
//! an import still loads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::webhook::{ExtraData, UploadedFile, WebhookDescriptor};

use super::WidgetKind;

/// Maximum number of fields on a custom form.
pub const MAX_FORM_FIELDS: usize = 50;

// ---------------------------------------------------------------------------
// Data widget
// ---------------------------------------------------------------------------

/// Display mode of a data widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDisplay {
    #[default]
    Kpi,
    List,
}

/// One entry of a list widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ListItem {
    pub fn new(label: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            label: label.into(),
            url: url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataConfig {
    pub display_type: DataDisplay,
    /// Caption shown next to the main KPI value.
    pub value1_label: String,
    pub value1_path: String,
    pub value2_path: String,
    /// Optional path to a URL that turns the main value into a link.
    pub value3_url_path: String,
    pub list_path: String,
    pub item_label_path: String,
    pub item_url_path: String,
    /// Cap on rendered list entries; `0` means unlimited.
    pub max_items: usize,
    pub demo_value1: String,
    pub demo_value2: String,
    pub demo_items: Vec<ListItem>,
    pub webhook: WebhookDescriptor,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            display_type: DataDisplay::Kpi,
            value1_label: "Total".into(),
            value1_path: "data.value".into(),
            value2_path: "data.change".into(),
            value3_url_path: String::new(),
            list_path: "data.items".into(),
            item_label_path: "title".into(),
            item_url_path: "url".into(),
            max_items: 10,
            demo_value1: "1,234".into(),
            demo_value2: "+12%".into(),
            demo_items: vec![
                ListItem::new("First item", Some("https://example.com/1")),
                ListItem::new("Second item", Some("https://example.com/2")),
                ListItem::new("Third item", None),
            ],
            webhook: WebhookDescriptor::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chart widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
        }
    }

    /// Literal key paths probed, in order, when `dataPath` is not an array.
    pub fn data_fallbacks(&self) -> &'static [&'static str] {
        match self {
            Self::Line => &["series[0].data", "data", "values", "revenue"],
            Self::Bar => &["series[0].data", "data", "values", "counts"],
            Self::Pie => &["series[0].data", "data", "values", "amounts"],
        }
    }

    /// Literal key paths probed, in order, when `labelsPath` is not an array.
    pub fn label_fallbacks(&self) -> &'static [&'static str] {
        match self {
            Self::Line => &["labels", "months", "dates"],
            Self::Bar => &["labels", "categories"],
            Self::Pie => &["labels", "segments", "categories"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub chart_type: ChartType,
    pub dataset_label: String,
    pub labels_path: String,
    pub data_path: String,
    /// Optional path to a numeric y-axis ceiling.
    pub y_max_path: String,
    pub demo_labels: Vec<String>,
    pub demo_data: Vec<f64>,
    pub webhook: WebhookDescriptor,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Line,
            dataset_label: "Series".into(),
            labels_path: "labels".into(),
            data_path: "data".into(),
            y_max_path: String::new(),
            demo_labels: ["Jan", "Feb", "Mar", "Apr", "May", "Jun"]
                .into_iter()
                .map(String::from)
                .collect(),
            demo_data: vec![12.0, 19.0, 3.0, 5.0, 2.0, 3.0],
            webhook: WebhookDescriptor::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Custom form widget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Number,
    Textarea,
    Select,
    Checkbox,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub options: Vec<String>,
    pub placeholder: String,
}

impl FormField {
    fn new(name: &str, label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required,
            ..Default::default()
        }
    }

    /// Whether a submitted value counts as filled in for this field.
    fn is_filled(&self, value: Option<&Value>) -> bool {
        match (self.field_type, value) {
            (_, None) | (_, Some(Value::Null)) => false,
            (FieldType::File, Some(v)) => UploadedFile::from_value(v).is_some(),
            (FieldType::Checkbox, Some(Value::Bool(b))) => *b,
            (_, Some(Value::String(s))) => !s.trim().is_empty(),
            (_, Some(Value::Array(items))) => !items.is_empty(),
            (_, Some(_)) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomConfig {
    pub fields: Vec<FormField>,
    pub submit_label: String,
    #[serde(alias = "success_message")]
    pub success_message: String,
    #[serde(alias = "error_message")]
    pub error_message: String,
    pub webhook: WebhookDescriptor,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new("name", "Name", FieldType::Text, true),
                FormField::new("email", "Email", FieldType::Email, true),
                FormField::new("message", "Message", FieldType::Textarea, false),
            ],
            submit_label: "Submit".into(),
            success_message: "Form submitted successfully.".into(),
            error_message: "Something went wrong. Please try again.".into(),
            webhook: WebhookDescriptor::default(),
        }
    }
}

impl CustomConfig {
    /// Check a form definition: field names present, unique, within limits.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fields.len() > MAX_FORM_FIELDS {
            return Err(CoreError::Validation(format!(
                "A form may have at most {MAX_FORM_FIELDS} fields"
            )));
        }
        for (i, field) in self.fields.iter().enumerate() {
            let name = field.name.trim();
            if name.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Form field {} has no name",
                    i + 1
                )));
            }
            if self.fields[..i].iter().any(|f| f.name.trim() == name) {
                return Err(CoreError::Validation(format!(
                    "Duplicate form field name '{name}'"
                )));
            }
            if field.field_type == FieldType::Select && field.options.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Select field '{name}' needs at least one option"
                )));
            }
        }
        Ok(())
    }

    /// Check submitted form data against the field definitions.
    pub fn validate_submission(&self, data: &ExtraData) -> Result<(), CoreError> {
        for field in &self.fields {
            let value = data.get(field.name.trim());
            if field.required && !field.is_filled(value) {
                let label = if field.label.is_empty() { &field.name } else { &field.label };
                return Err(CoreError::Validation(format!("{label} is required")));
            }
            if field.field_type == FieldType::Email {
                if let Some(Value::String(s)) = value {
                    let s = s.trim();
                    if !s.is_empty() && !looks_like_email(s) {
                        return Err(CoreError::Validation(format!(
                            "'{s}' is not a valid email address"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tagged config
// ---------------------------------------------------------------------------

/// Configuration of a widget, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetConfig {
    Data(DataConfig),
    Chart(ChartConfig),
    Custom(CustomConfig),
}

impl WidgetConfig {
    pub fn default_for(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Data => Self::Data(DataConfig::default()),
            WidgetKind::Chart => Self::Chart(ChartConfig::default()),
            WidgetKind::Custom => Self::Custom(CustomConfig::default()),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Data(_) => WidgetKind::Data,
            Self::Chart(_) => WidgetKind::Chart,
            Self::Custom(_) => WidgetKind::Custom,
        }
    }

    pub fn webhook(&self) -> &WebhookDescriptor {
        match self {
            Self::Data(c) => &c.webhook,
            Self::Chart(c) => &c.webhook,
            Self::Custom(c) => &c.webhook,
        }
    }

    pub fn webhook_mut(&mut self) -> &mut WebhookDescriptor {
        match self {
            Self::Data(c) => &mut c.webhook,
            Self::Chart(c) => &mut c.webhook,
            Self::Custom(c) => &mut c.webhook,
        }
    }

    /// Parse a stored or submitted config object for `kind`.
    ///
    /// `null` yields the kind defaults; any other non-object is rejected.
    pub fn from_json(kind: WidgetKind, value: &Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::default_for(kind));
        }
        if !value.is_object() {
            return Err(CoreError::Validation(
                "Widget config must be a JSON object".to_string(),
            ));
        }

        let invalid = |e: serde_json::Error| {
            CoreError::Validation(format!("Invalid {kind} widget config: {e}"))
        };
        let config = match kind {
            WidgetKind::Data => Self::Data(serde_json::from_value(value.clone()).map_err(invalid)?),
            WidgetKind::Chart => Self::Chart(serde_json::from_value(value.clone()).map_err(invalid)?),
            WidgetKind::Custom => {
                let custom: CustomConfig = serde_json::from_value(value.clone()).map_err(invalid)?;
                custom.validate()?;
                Self::Custom(custom)
            }
        };
        Ok(config)
    }

    /// Serialise the kind settings without the webhook descriptor, which is
    /// stored alongside the config rather than inside it.
    pub fn settings_json(&self) -> Value {
        let mut value = match self {
            Self::Data(c) => serde_json::to_value(c),
            Self::Chart(c) => serde_json::to_value(c),
            Self::Custom(c) => serde_json::to_value(c),
        }
        .unwrap_or(Value::Null);

        if let Some(obj) = value.as_object_mut() {
            obj.remove("webhook");
        }
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = WidgetConfig::from_json(WidgetKind::Data, &json!({"value1Path": "stats.total"})).unwrap();
        let WidgetConfig::Data(data) = cfg else { panic!("expected data config") };
        assert_eq!(data.value1_path, "stats.total");
        assert_eq!(data.value2_path, "data.change");
        assert_eq!(data.display_type, DataDisplay::Kpi);
    }

    #[test]
    fn null_config_is_default() {
        let cfg = WidgetConfig::from_json(WidgetKind::Chart, &Value::Null).unwrap();
        assert_eq!(cfg, WidgetConfig::default_for(WidgetKind::Chart));
    }

    #[test]
    fn non_object_config_rejected() {
        assert_matches!(
            WidgetConfig::from_json(WidgetKind::Data, &json!([1, 2])),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            WidgetConfig::from_json(WidgetKind::Chart, &json!({"chartType": "radar"})),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn camel_case_keys_on_the_wire() {
        let value = WidgetConfig::default_for(WidgetKind::Data).settings_json();
        assert!(value.get("value1Path").is_some());
        assert!(value.get("value3UrlPath").is_some());
        assert!(value.get("itemLabelPath").is_some());
        assert!(value.get("webhook").is_none());
    }

    #[test]
    fn custom_accepts_snake_case_success_message() {
        let cfg = WidgetConfig::from_json(
            WidgetKind::Custom,
            &json!({"success_message": "Thanks!", "fields": []}),
        )
        .unwrap();
        let WidgetConfig::Custom(custom) = cfg else { panic!("expected custom config") };
        assert_eq!(custom.success_message, "Thanks!");
    }

    #[test]
    fn nested_webhook_is_read_from_config() {
        let cfg = WidgetConfig::from_json(
            WidgetKind::Chart,
            &json!({"webhook": {"url": "https://hooks.test/chart", "method": "POST"}}),
        )
        .unwrap();
        assert_eq!(cfg.webhook().url, "https://hooks.test/chart");
    }

    #[test]
    fn duplicate_form_fields_rejected() {
        let cfg = json!({"fields": [{"name": "a"}, {"name": "a"}]});
        assert_matches!(
            WidgetConfig::from_json(WidgetKind::Custom, &cfg),
            Err(CoreError::Validation(msg)) if msg.contains("Duplicate")
        );
    }

    #[test]
    fn select_without_options_rejected() {
        let cfg = json!({"fields": [{"name": "plan", "type": "select"}]});
        assert!(WidgetConfig::from_json(WidgetKind::Custom, &cfg).is_err());
    }

    #[test]
    fn submission_requires_required_fields() {
        let custom = CustomConfig::default();
        let data = json!({"name": "Ada", "email": "  "});
        let err = custom
            .validate_submission(data.as_object().unwrap())
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Email is required");
    }

    #[test]
    fn submission_checks_email_shape() {
        let custom = CustomConfig::default();
        let data = json!({"name": "Ada", "email": "not-an-email"});
        assert!(custom.validate_submission(data.as_object().unwrap()).is_err());

        let data = json!({"name": "Ada", "email": "ada@example.com"});
        assert!(custom.validate_submission(data.as_object().unwrap()).is_ok());
    }

    #[test]
    fn required_file_needs_completed_upload() {
        let custom = CustomConfig {
            fields: vec![FormField::new("cv", "CV", FieldType::File, true)],
            ..Default::default()
        };
        let failed = json!({"cv": {"name": "cv.pdf", "tmpPath": "", "error": 4, "size": 0}});
        assert!(custom.validate_submission(failed.as_object().unwrap()).is_err());

        let ok = json!({"cv": {"name": "cv.pdf", "tmpPath": "/tmp/cv", "error": 0, "size": 10}});
        assert!(custom.validate_submission(ok.as_object().unwrap()).is_ok());
    }

    #[test]
    fn chart_fallback_order() {
        assert_eq!(
            ChartType::Line.data_fallbacks(),
            &["series[0].data", "data", "values", "revenue"]
        );
    }
}
