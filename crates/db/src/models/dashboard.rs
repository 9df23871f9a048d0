//! Dashboard entity.

use pulseboard_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dashboards` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Dashboard {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
    pub settings: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
