//! Repository for the `dashboards` table.

use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::models::dashboard::Dashboard;

/// Column list for `dashboards` queries.
const COLUMNS: &str = "id, owner_id, name, description, settings, created_at, updated_at";

/// Provides CRUD operations for dashboards.
pub struct DashboardRepo;

impl DashboardRepo {
    /// List a user's dashboards, oldest first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Dashboard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dashboards WHERE owner_id = $1 ORDER BY id");
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dashboards WHERE id = $1");
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a dashboard. Accepts the pool or an open transaction.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
        input: &DashboardInput,
    ) -> Result<Dashboard, sqlx::Error> {
        let query = format!(
            "INSERT INTO dashboards (owner_id, name, description, settings) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(serde_json::Value::Object(input.settings.clone()))
            .fetch_one(executor)
            .await
    }

    /// Replace every editable field. Returns `None` if the row is gone.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &DashboardInput,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!(
            "UPDATE dashboards SET name = $2, description = $3, settings = $4 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(serde_json::Value::Object(input.settings.clone()))
            .fetch_optional(pool)
            .await
    }

    /// Delete a dashboard; its widgets go with it (`ON DELETE CASCADE`).
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dashboards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
