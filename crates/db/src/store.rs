//! Storage seam used by the server.
//!
//! [`DashboardStore`] is the persistence collaborator: the server only ever
//! talks to it, never to repositories directly. [`PgStore`] backs it with
//! PostgreSQL; `MemoryStore` keeps everything in process.

use async_trait::async_trait;
use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::error::CoreError;
use pulseboard_core::transfer::rebind_widgets;
use pulseboard_core::types::DbId;
use pulseboard_core::widget::{Position, WidgetRecord};

use crate::models::dashboard::Dashboard;
use crate::models::widget::WidgetRow;
use crate::repositories::{DashboardRepo, WidgetRepo};
use crate::DbPool;

/// One dashboard of an import batch with the widgets to create under it.
#[derive(Debug, Clone)]
pub struct DashboardImport {
    pub input: DashboardInput,
    /// Ids and `dashboard_id` are replaced on insert.
    pub widgets: Vec<WidgetRecord>,
}

/// Dashboard and widget persistence.
///
/// Lookups return `Ok(None)` / `Ok(false)` for missing rows; errors are
/// reserved for storage faults.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn list_dashboards(&self, owner_id: DbId) -> Result<Vec<Dashboard>, sqlx::Error>;
    async fn find_dashboard(&self, id: DbId) -> Result<Option<Dashboard>, sqlx::Error>;
    async fn create_dashboard(
        &self,
        owner_id: DbId,
        input: &DashboardInput,
    ) -> Result<Dashboard, sqlx::Error>;
    async fn update_dashboard(
        &self,
        id: DbId,
        input: &DashboardInput,
    ) -> Result<Option<Dashboard>, sqlx::Error>;
    /// Deletes the dashboard and all of its widgets.
    async fn delete_dashboard(&self, id: DbId) -> Result<bool, sqlx::Error>;

    async fn list_widgets(&self, dashboard_id: DbId) -> Result<Vec<WidgetRecord>, sqlx::Error>;
    async fn find_widget(&self, id: DbId) -> Result<Option<WidgetRecord>, sqlx::Error>;
    /// Persist a new widget and return it with its assigned id.
    async fn create_widget(&self, record: &WidgetRecord) -> Result<WidgetRecord, sqlx::Error>;
    async fn update_widget(
        &self,
        id: DbId,
        record: &WidgetRecord,
    ) -> Result<Option<WidgetRecord>, sqlx::Error>;
    async fn update_widget_position(
        &self,
        id: DbId,
        position: Position,
    ) -> Result<Option<WidgetRecord>, sqlx::Error>;
    async fn delete_widget(&self, id: DbId) -> Result<bool, sqlx::Error>;

    /// Create every dashboard of `batch` with its widgets, all or nothing.
    /// Returns the created dashboards with their stored widgets, in order.
    async fn import_dashboards(
        &self,
        owner_id: DbId,
        batch: Vec<DashboardImport>,
    ) -> Result<Vec<(Dashboard, Vec<WidgetRecord>)>, sqlx::Error>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`DashboardStore`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn to_record(row: WidgetRow) -> Result<WidgetRecord, sqlx::Error> {
    row.into_record()
        .map_err(|e: CoreError| sqlx::Error::Decode(Box::new(e)))
}

#[async_trait]
impl DashboardStore for PgStore {
    async fn list_dashboards(&self, owner_id: DbId) -> Result<Vec<Dashboard>, sqlx::Error> {
        DashboardRepo::list_by_owner(&self.pool, owner_id).await
    }

    async fn find_dashboard(&self, id: DbId) -> Result<Option<Dashboard>, sqlx::Error> {
        DashboardRepo::find_by_id(&self.pool, id).await
    }

    async fn create_dashboard(
        &self,
        owner_id: DbId,
        input: &DashboardInput,
    ) -> Result<Dashboard, sqlx::Error> {
        DashboardRepo::create(&self.pool, owner_id, input).await
    }

    async fn update_dashboard(
        &self,
        id: DbId,
        input: &DashboardInput,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        DashboardRepo::update(&self.pool, id, input).await
    }

    async fn delete_dashboard(&self, id: DbId) -> Result<bool, sqlx::Error> {
        DashboardRepo::delete(&self.pool, id).await
    }

    async fn list_widgets(&self, dashboard_id: DbId) -> Result<Vec<WidgetRecord>, sqlx::Error> {
        WidgetRepo::list_by_dashboard(&self.pool, dashboard_id)
            .await?
            .into_iter()
            .map(to_record)
            .collect()
    }

    async fn find_widget(&self, id: DbId) -> Result<Option<WidgetRecord>, sqlx::Error> {
        WidgetRepo::find_by_id(&self.pool, id)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn create_widget(&self, record: &WidgetRecord) -> Result<WidgetRecord, sqlx::Error> {
        to_record(WidgetRepo::create(&self.pool, record).await?)
    }

    async fn update_widget(
        &self,
        id: DbId,
        record: &WidgetRecord,
    ) -> Result<Option<WidgetRecord>, sqlx::Error> {
        WidgetRepo::update(&self.pool, id, record)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn update_widget_position(
        &self,
        id: DbId,
        position: Position,
    ) -> Result<Option<WidgetRecord>, sqlx::Error> {
        WidgetRepo::update_position(&self.pool, id, position)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn delete_widget(&self, id: DbId) -> Result<bool, sqlx::Error> {
        WidgetRepo::delete(&self.pool, id).await
    }

    async fn import_dashboards(
        &self,
        owner_id: DbId,
        batch: Vec<DashboardImport>,
    ) -> Result<Vec<(Dashboard, Vec<WidgetRecord>)>, sqlx::Error> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let mut imported = Vec::with_capacity(batch.len());
        for DashboardImport { input, widgets } in batch {
            let dashboard = DashboardRepo::create(&mut *tx, owner_id, &input).await?;
            let mut stored = Vec::with_capacity(widgets.len());
            for record in rebind_widgets(widgets, dashboard.id) {
                stored.push(to_record(WidgetRepo::create(&mut *tx, &record).await?)?);
            }
            imported.push((dashboard, stored));
        }

        tx.commit().await?;
        Ok(imported)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}
