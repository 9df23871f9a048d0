//! Repository for the `widgets` table.
//!
//! Configuration is stored wholesale as JSONB; the webhook descriptor has
//! its own column so deleting a widget removes it with the row.

use pulseboard_core::types::DbId;
use pulseboard_core::widget::{Position, WidgetRecord};
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::models::widget::WidgetRow;

/// Column list for `widgets` queries.
const COLUMNS: &str = "\
    id, dashboard_id, widget_type, title, config, webhook, \
    pos_x, pos_y, width, height, status, created_at, updated_at";

/// Provides CRUD operations for widgets.
pub struct WidgetRepo;

impl WidgetRepo {
    pub async fn list_by_dashboard(
        pool: &PgPool,
        dashboard_id: DbId,
    ) -> Result<Vec<WidgetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM widgets WHERE dashboard_id = $1 ORDER BY id");
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(dashboard_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WidgetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM widgets WHERE id = $1");
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a widget. The record's `id` is ignored; the database assigns one.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        record: &WidgetRecord,
    ) -> Result<WidgetRow, sqlx::Error> {
        let position = record.position.unwrap_or_default();
        let query = format!(
            "INSERT INTO widgets \
                 (dashboard_id, widget_type, title, config, webhook, pos_x, pos_y, width, height, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(record.dashboard_id)
            .bind(record.widget_type.as_str())
            .bind(&record.title)
            .bind(&record.config)
            .bind(webhook_json(record))
            .bind(position.x)
            .bind(position.y)
            .bind(position.width)
            .bind(position.height)
            .bind(record.status.as_str())
            .fetch_one(executor)
            .await
    }

    /// Replace title, config, webhook, position and status.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        record: &WidgetRecord,
    ) -> Result<Option<WidgetRow>, sqlx::Error> {
        let position = record.position.unwrap_or_default();
        let query = format!(
            "UPDATE widgets SET \
                 title = $2, config = $3, webhook = $4, \
                 pos_x = $5, pos_y = $6, width = $7, height = $8, status = $9 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(id)
            .bind(&record.title)
            .bind(&record.config)
            .bind(webhook_json(record))
            .bind(position.x)
            .bind(position.y)
            .bind(position.width)
            .bind(position.height)
            .bind(record.status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move/resize a widget. Concurrent writers: last write wins.
    pub async fn update_position(
        pool: &PgPool,
        id: DbId,
        position: Position,
    ) -> Result<Option<WidgetRow>, sqlx::Error> {
        let query = format!(
            "UPDATE widgets SET pos_x = $2, pos_y = $3, width = $4, height = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(id)
            .bind(position.x)
            .bind(position.y)
            .bind(position.width)
            .bind(position.height)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM widgets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn webhook_json(record: &WidgetRecord) -> serde_json::Value {
    record
        .webhook
        .as_ref()
        .and_then(|w| serde_json::to_value(w).ok())
        .unwrap_or_else(|| serde_json::json!({}))
}
