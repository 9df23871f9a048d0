//! Custom form widget processor.

use serde_json::{Map, Value};

use crate::links::safe_link;
use crate::path::display_value;
use crate::widget::config::CustomConfig;

use super::CustomView;

pub fn process(response: &Value, config: &CustomConfig) -> CustomView {
    match response {
        Value::String(text) if !text.trim().is_empty() => CustomView {
            success: true,
            message: text.clone(),
            data: response.clone(),
            redirect: None,
        },
        Value::Object(map) => from_object(map, response, config),
        _ => CustomView {
            success: true,
            message: config.success_message.clone(),
            data: response.clone(),
            redirect: None,
        },
    }
}

fn from_object(map: &Map<String, Value>, response: &Value, config: &CustomConfig) -> CustomView {
    let message = map
        .get("message")
        .and_then(display_value)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let redirect = map
        .get("redirect")
        .and_then(Value::as_str)
        .and_then(safe_link);

    let (success, message) = if let Some(error) = map.get("error").filter(|e| is_set(e)) {
        let text = display_value(error)
            .filter(|e| !e.trim().is_empty())
            .or(message)
            .unwrap_or_else(|| config.error_message.clone());
        (false, text)
    } else if map.get("success") == Some(&Value::Bool(false)) {
        (false, message.unwrap_or_else(|| config.error_message.clone()))
    } else {
        (true, message.unwrap_or_else(|| config.success_message.clone()))
    };

    CustomView {
        success,
        message,
        data: response.clone(),
        redirect,
    }
}

/// `null`, `false` and blank strings do not count as an error.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config() -> CustomConfig {
        CustomConfig {
            success_message: "Saved!".into(),
            error_message: "Failed.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn string_response_is_message_verbatim() {
        let view = process(&json!("Thank you, we'll be in touch"), &config());
        assert!(view.success);
        assert_eq!(view.message, "Thank you, we'll be in touch");
    }

    #[test]
    fn blank_string_uses_configured_message() {
        let view = process(&json!(""), &config());
        assert!(view.success);
        assert_eq!(view.message, "Saved!");
    }

    #[test]
    fn error_field_marks_failure() {
        let view = process(&json!({"error": "Email already registered"}), &config());
        assert!(!view.success);
        assert_eq!(view.message, "Email already registered");
    }

    #[test]
    fn success_false_marks_failure() {
        let view = process(&json!({"success": false}), &config());
        assert!(!view.success);
        assert_eq!(view.message, "Failed.");

        let view = process(&json!({"success": false, "message": "Quota exceeded"}), &config());
        assert_eq!(view.message, "Quota exceeded");
    }

    #[test]
    fn success_uses_response_message_when_present() {
        let view = process(&json!({"success": true, "message": "Ticket #12 created"}), &config());
        assert!(view.success);
        assert_eq!(view.message, "Ticket #12 created");

        let view = process(&json!({"id": 12}), &config());
        assert!(view.success);
        assert_eq!(view.message, "Saved!");
        assert_eq!(view.data, json!({"id": 12}));
    }

    #[test]
    fn falsy_error_values_are_ignored() {
        let view = process(&json!({"error": null}), &config());
        assert!(view.success);
        let view = process(&json!({"error": false}), &config());
        assert!(view.success);
        let view = process(&json!({"error": ""}), &config());
        assert!(view.success);
    }

    #[test]
    fn redirect_passes_through_when_valid() {
        let view = process(&json!({"redirect": "https://app.test/thanks"}), &config());
        assert_eq!(view.redirect.as_deref(), Some("https://app.test/thanks"));

        let view = process(&json!({"redirect": "javascript:void(0)"}), &config());
        assert_eq!(view.redirect, None);
    }

    #[test]
    fn non_object_json_is_success() {
        let view = process(&json!([1, 2]), &config());
        assert!(view.success);
        assert_eq!(view.data, json!([1, 2]));
    }
}
