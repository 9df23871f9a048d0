//! Data widget processor (KPI and list modes).

use serde_json::Value;

use crate::links::safe_link;
use crate::path::{display_value, numeric_value, resolve, resolve_array};
use crate::widget::config::{DataConfig, DataDisplay, ListItem};

use super::{KpiView, ListView, ViewModel};

/// Shown when the main KPI value cannot be found.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn process(response: &Value, config: &DataConfig) -> ViewModel {
    match config.display_type {
        DataDisplay::Kpi => ViewModel::Kpi(kpi(response, config)),
        DataDisplay::List => ViewModel::List(list(response, config)),
    }
}

fn kpi(response: &Value, config: &DataConfig) -> KpiView {
    let value1 = resolve(response, &config.value1_path)
        .and_then(display_value)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let value2 = resolve(response, &config.value2_path).and_then(format_change);

    let link = resolve(response, &config.value3_url_path)
        .and_then(Value::as_str)
        .and_then(safe_link);

    KpiView {
        label: config.value1_label.clone(),
        value1,
        value2,
        link,
    }
}

/// Render a change value, prefixing positive numbers with `+`.
pub fn format_change(value: &Value) -> Option<String> {
    let text = display_value(value)?;
    match numeric_value(value) {
        Some(n) if n > 0.0 => {
            let text = text.trim();
            if text.starts_with('+') {
                Some(text.to_string())
            } else {
                Some(format!("+{text}"))
            }
        }
        _ => Some(text),
    }
}

fn list(response: &Value, config: &DataConfig) -> ListView {
    // An empty list path addresses a top-level array response.
    let entries = if config.list_path.trim().is_empty() {
        response.as_array()
    } else {
        resolve_array(response, &config.list_path)
    };
    let Some(entries) = entries else {
        return ListView::default();
    };

    let limit = match config.max_items {
        0 => usize::MAX,
        n => n,
    };

    let items: Vec<ListItem> = entries
        .iter()
        .filter_map(|entry| list_item(entry, config))
        .take(limit)
        .collect();

    ListView {
        count: items.len(),
        items,
    }
}

fn list_item(entry: &Value, config: &DataConfig) -> Option<ListItem> {
    let label = if config.item_label_path.trim().is_empty() {
        match entry {
            Value::Object(_) | Value::Array(_) => None,
            scalar => display_value(scalar),
        }
    } else {
        resolve(entry, &config.item_label_path).and_then(display_value)
    };
    let label = label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;

    let url = resolve(entry, &config.item_url_path)
        .and_then(Value::as_str)
        .and_then(safe_link);

    Some(ListItem { label, url })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn kpi_view(response: Value, config: &DataConfig) -> KpiView {
        match process(&response, config) {
            ViewModel::Kpi(kpi) => kpi,
            other => panic!("expected kpi view, got {other:?}"),
        }
    }

    fn list_config() -> DataConfig {
        DataConfig {
            display_type: DataDisplay::List,
            ..Default::default()
        }
    }

    fn list_view(response: Value, config: &DataConfig) -> ListView {
        match process(&response, config) {
            ViewModel::List(list) => list,
            other => panic!("expected list view, got {other:?}"),
        }
    }

    #[test]
    fn missing_value1_is_not_available() {
        let view = kpi_view(json!({"data": {}}), &DataConfig::default());
        assert_eq!(view.value1, "N/A");
        assert_eq!(view.value2, None);
    }

    #[test]
    fn null_value1_is_not_available() {
        let view = kpi_view(json!({"data": {"value": null}}), &DataConfig::default());
        assert_eq!(view.value1, "N/A");
    }

    #[test]
    fn positive_numeric_change_gets_plus() {
        let view = kpi_view(json!({"data": {"value": 100, "change": 5}}), &DataConfig::default());
        assert_eq!(view.value1, "100");
        assert_eq!(view.value2.as_deref(), Some("+5"));
    }

    #[test]
    fn change_formatting_edge_cases() {
        assert_eq!(format_change(&json!(-3)).as_deref(), Some("-3"));
        assert_eq!(format_change(&json!(0)).as_deref(), Some("0"));
        assert_eq!(format_change(&json!(2.5)).as_deref(), Some("+2.5"));
        assert_eq!(format_change(&json!("7")).as_deref(), Some("+7"));
        assert_eq!(format_change(&json!("+7")).as_deref(), Some("+7"));
        assert_eq!(format_change(&json!("12%")).as_deref(), Some("12%"));
        assert_eq!(format_change(&Value::Null), None);
    }

    #[test]
    fn value3_link_must_be_http() {
        let config = DataConfig {
            value3_url_path: "data.link".into(),
            ..Default::default()
        };
        let view = kpi_view(
            json!({"data": {"value": 1, "link": "https://crm.test/deals"}}),
            &config,
        );
        assert_eq!(view.link.as_deref(), Some("https://crm.test/deals"));

        let view = kpi_view(
            json!({"data": {"value": 1, "link": "javascript:alert(1)"}}),
            &config,
        );
        assert_eq!(view.link, None);
    }

    #[test]
    fn string_kpi_value_kept_verbatim() {
        let view = kpi_view(json!({"data": {"value": "$1.2M"}}), &DataConfig::default());
        assert_eq!(view.value1, "$1.2M");
    }

    #[test]
    fn list_extracts_label_and_url_pairs() {
        let response = json!({"data": {"items": [
            {"title": "Deal A", "url": "https://crm.test/a"},
            {"title": "", "url": "https://crm.test/skip"},
            {"title": "Deal B"},
            {"name": "no title"},
            {"title": 42, "url": "not a url"}
        ]}});
        let view = list_view(response, &list_config());
        assert_eq!(view.count, 3);
        assert_eq!(view.items[0], ListItem::new("Deal A", Some("https://crm.test/a")));
        assert_eq!(view.items[1], ListItem::new("Deal B", None));
        assert_eq!(view.items[2], ListItem::new("42", None));
    }

    #[test]
    fn list_path_not_an_array_yields_empty_list() {
        let view = list_view(json!({"data": {"items": "oops"}}), &list_config());
        assert_eq!(view, ListView::default());
    }

    #[test]
    fn list_respects_max_items() {
        let config = DataConfig {
            max_items: 2,
            ..list_config()
        };
        let response = json!({"data": {"items": [{"title": "a"}, {"title": "b"}, {"title": "c"}]}});
        assert_eq!(list_view(response, &config).count, 2);

        let unlimited = DataConfig {
            max_items: 0,
            ..list_config()
        };
        let response = json!({"data": {"items": [{"title": "a"}, {"title": "b"}, {"title": "c"}]}});
        assert_eq!(list_view(response, &unlimited).count, 3);
    }

    #[test]
    fn scalar_entries_with_empty_label_path() {
        let config = DataConfig {
            list_path: String::new(),
            item_label_path: String::new(),
            ..list_config()
        };
        let view = list_view(json!(["alpha", " ", "beta"]), &config);
        assert_eq!(view.count, 2);
        assert_eq!(view.items[1].label, "beta");
    }
}
