//! Response processors: raw webhook payload → per-kind view model.
//!
//! Processors never fail. Missing or malformed fields degrade to sentinel
//! values so one bad field does not blank the whole widget.

pub mod chart;
pub mod custom;
pub mod data;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::widget::config::{
    ChartConfig, ChartType, CustomConfig, DataConfig, DataDisplay, FormField, ListItem,
    WidgetConfig,
};

/// Normalised, render-ready output of a processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewModel {
    Kpi(KpiView),
    List(ListView),
    Chart(ChartView),
    Custom(CustomView),
    /// Form definition rendered by custom widgets before any submission.
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiView {
    pub label: String,
    pub value1: String,
    pub value2: Option<String>,
    /// Makes the main value a hyperlink when present.
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListView {
    pub items: Vec<ListItem>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub chart_type: ChartType,
    pub dataset_label: String,
    pub labels: Vec<String>,
    pub data: Vec<Value>,
    pub y_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomView {
    pub success: bool,
    pub message: String,
    /// The full decoded response, for optional display.
    pub data: Value,
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormView {
    pub fields: Vec<FormField>,
    pub submit_label: String,
}

impl From<&CustomConfig> for FormView {
    fn from(config: &CustomConfig) -> Self {
        Self {
            fields: config.fields.clone(),
            submit_label: config.submit_label.clone(),
        }
    }
}

impl ViewModel {
    /// Whether the field that decides live-vs-placeholder is populated.
    pub fn has_primary(&self) -> bool {
        match self {
            Self::Kpi(kpi) => !kpi.value1.is_empty() && kpi.value1 != data::NOT_AVAILABLE,
            Self::List(list) => !list.items.is_empty(),
            Self::Chart(chart) => !chart.data.is_empty(),
            Self::Custom(_) | Self::Form(_) => false,
        }
    }
}

/// Dispatch `response` to the processor matching the config's kind.
pub fn process(response: &Value, config: &WidgetConfig) -> ViewModel {
    match config {
        WidgetConfig::Data(c) => data::process(response, c),
        WidgetConfig::Chart(c) => ViewModel::Chart(chart::process(response, c)),
        WidgetConfig::Custom(c) => ViewModel::Custom(custom::process(response, c)),
    }
}

/// Placeholder view built from the config's demo values.
pub fn placeholder(config: &WidgetConfig) -> ViewModel {
    match config {
        WidgetConfig::Data(c) => data_placeholder(c),
        WidgetConfig::Chart(c) => ViewModel::Chart(chart_placeholder(c)),
        WidgetConfig::Custom(c) => ViewModel::Form(FormView::from(c)),
    }
}

fn data_placeholder(config: &DataConfig) -> ViewModel {
    match config.display_type {
        DataDisplay::Kpi => ViewModel::Kpi(KpiView {
            label: config.value1_label.clone(),
            value1: config.demo_value1.clone(),
            value2: Some(config.demo_value2.clone()).filter(|v| !v.is_empty()),
            link: None,
        }),
        DataDisplay::List => ViewModel::List(ListView {
            count: config.demo_items.len(),
            items: config.demo_items.clone(),
        }),
    }
}

fn chart_placeholder(config: &ChartConfig) -> ChartView {
    let mut view = ChartView {
        chart_type: config.chart_type,
        dataset_label: config.dataset_label.clone(),
        labels: config.demo_labels.clone(),
        data: config.demo_data.iter().copied().map(Value::from).collect(),
        y_max: None,
    };
    if config.chart_type == ChartType::Pie {
        chart::equalize(&mut view);
    }
    view
}
