//! Widget row and its conversion to the shared widget record.

use pulseboard_core::error::CoreError;
use pulseboard_core::types::{DbId, Timestamp};
use pulseboard_core::webhook::WebhookDescriptor;
use pulseboard_core::widget::{Position, WidgetKind, WidgetRecord, WidgetStatus};
use sqlx::FromRow;

/// A row from the `widgets` table.
#[derive(Debug, Clone, FromRow)]
pub struct WidgetRow {
    pub id: DbId,
    pub dashboard_id: DbId,
    pub widget_type: String,
    pub title: String,
    pub config: serde_json::Value,
    pub webhook: serde_json::Value,
    pub pos_x: i32,
    pub pos_y: i32,
    pub width: i32,
    pub height: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WidgetRow {
    pub fn into_record(self) -> Result<WidgetRecord, CoreError> {
        let webhook: WebhookDescriptor = if self.webhook.is_null() {
            WebhookDescriptor::default()
        } else {
            serde_json::from_value(self.webhook).map_err(|e| {
                CoreError::Internal(format!("Widget {} has a corrupt webhook: {e}", self.id))
            })?
        };

        Ok(WidgetRecord {
            id: Some(self.id),
            dashboard_id: self.dashboard_id,
            widget_type: WidgetKind::from_str(&self.widget_type)?,
            title: self.title,
            config: self.config,
            position: Some(Position {
                x: self.pos_x,
                y: self.pos_y,
                width: self.width,
                height: self.height,
            }),
            webhook: Some(webhook),
            status: WidgetStatus::from_str(&self.status)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row() -> WidgetRow {
        WidgetRow {
            id: 5,
            dashboard_id: 2,
            widget_type: "chart".into(),
            title: "Revenue".into(),
            config: json!({"chartType": "bar"}),
            webhook: json!({"url": "https://hooks.test/r", "method": "POST"}),
            pos_x: 10,
            pos_y: 20,
            width: 400,
            height: 250,
            status: "active".into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn converts_row_to_record() {
        let record = row().into_record().unwrap();
        assert_eq!(record.id, Some(5));
        assert_eq!(record.widget_type, WidgetKind::Chart);
        assert_eq!(record.position.unwrap().width, 400);
        assert_eq!(record.webhook.unwrap().url, "https://hooks.test/r");
    }

    #[test]
    fn unknown_widget_type_is_rejected() {
        let mut row = row();
        row.widget_type = "gauge".into();
        assert!(row.into_record().is_err());
    }
}
