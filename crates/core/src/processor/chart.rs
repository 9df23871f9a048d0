//! Chart widget processor (line, bar, pie).

use serde_json::Value;

use crate::path::{display_value, numeric_value, resolve, resolve_array, resolve_first_array};
use crate::widget::config::{ChartConfig, ChartType};

use super::ChartView;

pub fn process(response: &Value, config: &ChartConfig) -> ChartView {
    let kind = config.chart_type;

    let labels = resolve_array(response, &config.labels_path)
        .or_else(|| resolve_first_array(response, kind.label_fallbacks()))
        .map(|items| items.iter().map(label_text).collect())
        .unwrap_or_default();

    let data = resolve_array(response, &config.data_path)
        .or_else(|| resolve_first_array(response, kind.data_fallbacks()))
        .map(|items| items.iter().map(data_point).collect())
        .unwrap_or_default();

    let y_max = if config.y_max_path.trim().is_empty() {
        None
    } else {
        resolve(response, &config.y_max_path).and_then(numeric_value)
    };

    let mut view = ChartView {
        chart_type: kind,
        dataset_label: config.dataset_label.clone(),
        labels,
        data,
        y_max,
    };
    if kind == ChartType::Pie {
        equalize(&mut view);
    }
    view
}

/// Truncate labels and data to the shorter of the two.
pub fn equalize(view: &mut ChartView) {
    let len = view.labels.len().min(view.data.len());
    view.labels.truncate(len);
    view.data.truncate(len);
}

fn label_text(value: &Value) -> String {
    display_value(value).unwrap_or_default()
}

/// Numbers pass through, numeric strings become numbers, anything else
/// becomes `null` (a gap in the series).
fn data_point(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else {
                numeric_value(value).map(Value::from).unwrap_or(Value::Null)
            }
        }
        _ => Value::Null,
    }
}
