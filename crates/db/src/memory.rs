//! In-process [`DashboardStore`] used when no `DATABASE_URL` is configured
//! and by the API integration tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use pulseboard_core::dashboard::DashboardInput;
use pulseboard_core::transfer::rebind_widgets;
use pulseboard_core::types::DbId;
use pulseboard_core::widget::{Position, WidgetRecord};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::models::dashboard::Dashboard;
use crate::store::{DashboardImport, DashboardStore};

#[derive(Default)]
struct Tables {
    last_dashboard_id: DbId,
    last_widget_id: DbId,
    dashboards: BTreeMap<DbId, Dashboard>,
    widgets: BTreeMap<DbId, WidgetRecord>,
}

impl Tables {
    fn insert_dashboard(&mut self, owner_id: DbId, input: &DashboardInput) -> Dashboard {
        self.last_dashboard_id += 1;
        let now = chrono::Utc::now();
        let dashboard = Dashboard {
            id: self.last_dashboard_id,
            owner_id,
            name: input.name.clone(),
            description: input.description.clone(),
            settings: Value::Object(input.settings.clone()),
            created_at: now,
            updated_at: now,
        };
        self.dashboards.insert(dashboard.id, dashboard.clone());
        dashboard
    }

    /// Caller checks that the owning dashboard exists.
    fn insert_widget(&mut self, record: &WidgetRecord) -> WidgetRecord {
        self.last_widget_id += 1;
        let id = self.last_widget_id;
        let mut stored = record.clone();
        stored.id = Some(id);
        stored.position = Some(record.position.unwrap_or_default());
        self.widgets.insert(id, stored.clone());
        stored
    }
}

/// Volatile store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn list_dashboards(&self, owner_id: DbId) -> Result<Vec<Dashboard>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .dashboards
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_dashboard(&self, id: DbId) -> Result<Option<Dashboard>, sqlx::Error> {
        Ok(self.tables.read().await.dashboards.get(&id).cloned())
    }

    async fn create_dashboard(
        &self,
        owner_id: DbId,
        input: &DashboardInput,
    ) -> Result<Dashboard, sqlx::Error> {
        Ok(self.tables.write().await.insert_dashboard(owner_id, input))
    }

    async fn update_dashboard(
        &self,
        id: DbId,
        input: &DashboardInput,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.dashboards.get_mut(&id).map(|dashboard| {
            dashboard.name = input.name.clone();
            dashboard.description = input.description.clone();
            dashboard.settings = Value::Object(input.settings.clone());
            dashboard.updated_at = chrono::Utc::now();
            dashboard.clone()
        }))
    }

    async fn delete_dashboard(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.write().await;
        let removed = tables.dashboards.remove(&id).is_some();
        if removed {
            tables.widgets.retain(|_, w| w.dashboard_id != id);
        }
        Ok(removed)
    }

    async fn list_widgets(&self, dashboard_id: DbId) -> Result<Vec<WidgetRecord>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .widgets
            .values()
            .filter(|w| w.dashboard_id == dashboard_id)
            .cloned()
            .collect())
    }

    async fn find_widget(&self, id: DbId) -> Result<Option<WidgetRecord>, sqlx::Error> {
        Ok(self.tables.read().await.widgets.get(&id).cloned())
    }

    async fn create_widget(&self, record: &WidgetRecord) -> Result<WidgetRecord, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if !tables.dashboards.contains_key(&record.dashboard_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(tables.insert_widget(record))
    }

    async fn update_widget(
        &self,
        id: DbId,
        record: &WidgetRecord,
    ) -> Result<Option<WidgetRecord>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.widgets.get_mut(&id).map(|stored| {
            stored.title = record.title.clone();
            stored.config = record.config.clone();
            stored.webhook = record.webhook.clone();
            stored.position = Some(record.position.unwrap_or_default());
            stored.status = record.status;
            stored.clone()
        }))
    }

    async fn update_widget_position(
        &self,
        id: DbId,
        position: Position,
    ) -> Result<Option<WidgetRecord>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.widgets.get_mut(&id).map(|stored| {
            stored.position = Some(position);
            stored.clone()
        }))
    }

    async fn delete_widget(&self, id: DbId) -> Result<bool, sqlx::Error> {
        Ok(self.tables.write().await.widgets.remove(&id).is_some())
    }

    async fn import_dashboards(
        &self,
        owner_id: DbId,
        batch: Vec<DashboardImport>,
    ) -> Result<Vec<(Dashboard, Vec<WidgetRecord>)>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        let mut imported = Vec::with_capacity(batch.len());
        for DashboardImport { input, widgets } in batch {
            let dashboard = tables.insert_dashboard(owner_id, &input);
            let mut stored = Vec::with_capacity(widgets.len());
            for record in rebind_widgets(widgets, dashboard.id) {
                stored.push(tables.insert_widget(&record));
            }
            imported.push((dashboard, stored));
        }
        Ok(imported)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
