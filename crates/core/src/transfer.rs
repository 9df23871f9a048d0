//! Dashboard import/export document.
//!
//! Exported as JSON. The `type` tag selects the payload: one dashboard, all
//! of a user's dashboards, or a settings object. Widget records round-trip
//! unchanged except for `id` and `dashboard_id`, which import reassigns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dashboard::DashboardInput;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::widget::WidgetRecord;

/// Version written into every exported document.
pub const EXPORT_VERSION: &str = "1.0";

/// Major version accepted on import.
pub const SUPPORTED_MAJOR_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferDocument {
    Dashboard {
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exported_at: Option<Timestamp>,
        dashboard: DashboardExport,
    },
    AllDashboards {
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exported_at: Option<Timestamp>,
        dashboards: Vec<DashboardExport>,
    },
    Settings {
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exported_at: Option<Timestamp>,
        settings: Map<String, Value>,
    },
}

/// A dashboard and its widgets as carried in a transfer document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardExport {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub widgets: Vec<WidgetRecord>,
}

impl TransferDocument {
    pub fn single(dashboard: DashboardExport, exported_at: Timestamp) -> Self {
        Self::Dashboard {
            version: EXPORT_VERSION.to_string(),
            exported_at: Some(exported_at),
            dashboard,
        }
    }

    pub fn all(dashboards: Vec<DashboardExport>, exported_at: Timestamp) -> Self {
        Self::AllDashboards {
            version: EXPORT_VERSION.to_string(),
            exported_at: Some(exported_at),
            dashboards,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Self::Dashboard { version, .. }
            | Self::AllDashboards { version, .. }
            | Self::Settings { version, .. } => version,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Dashboard { .. } => "dashboard",
            Self::AllDashboards { .. } => "all_dashboards",
            Self::Settings { .. } => "settings",
        }
    }

    /// Validate the document for import and return the dashboards it carries.
    ///
    /// Settings documents are rejected: there is no settings store to
    /// import them into.
    pub fn into_dashboards(self) -> Result<Vec<DashboardExport>, CoreError> {
        check_version(self.version())?;
        match self {
            Self::Dashboard { dashboard, .. } => Ok(vec![dashboard]),
            Self::AllDashboards { dashboards, .. } => {
                if dashboards.is_empty() {
                    return Err(CoreError::Validation(
                        "Import document contains no dashboards".to_string(),
                    ));
                }
                Ok(dashboards)
            }
            Self::Settings { .. } => Err(CoreError::Validation(
                "Settings documents cannot be imported".to_string(),
            )),
        }
    }
}

impl DashboardExport {
    /// Split into the validated dashboard input and its widget records.
    pub fn into_parts(self) -> Result<(DashboardInput, Vec<WidgetRecord>), CoreError> {
        let input = DashboardInput {
            name: self.name,
            description: self.description,
            settings: self.settings,
        }
        .validated()?;
        Ok((input, self.widgets))
    }
}

/// Detach imported widget records from their source: clear ids and point
/// them at the newly created dashboard.
pub fn rebind_widgets(widgets: Vec<WidgetRecord>, dashboard_id: DbId) -> Vec<WidgetRecord> {
    widgets
        .into_iter()
        .map(|mut record| {
            record.id = None;
            record.dashboard_id = dashboard_id;
            record
        })
        .collect()
}

/// Accept `"1"`, `"1.0"`, `"1.2.3"`; reject other majors and garbage.
pub fn check_version(version: &str) -> Result<(), CoreError> {
    let major = version
        .trim()
        .split('.')
        .next()
        .and_then(|m| m.parse::<u32>().ok());
    match major {
        Some(SUPPORTED_MAJOR_VERSION) => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "Unsupported export version '{version}'. Expected {SUPPORTED_MAJOR_VERSION}.x"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::widget::WidgetKind;

    fn record(id: DbId) -> WidgetRecord {
        WidgetRecord {
            id: Some(id),
            dashboard_id: 7,
            widget_type: WidgetKind::Chart,
            title: "Revenue".into(),
            config: json!({"chartType": "bar"}),
            position: None,
            webhook: None,
            status: Default::default(),
        }
    }

    #[test]
    fn parses_dashboard_document() {
        let doc: TransferDocument = serde_json::from_value(json!({
            "type": "dashboard",
            "version": "1.0",
            "dashboard": {"name": "Ops", "widgets": []}
        }))
        .unwrap();
        assert_eq!(doc.type_name(), "dashboard");
        let dashboards = doc.into_dashboards().unwrap();
        assert_eq!(dashboards[0].name, "Ops");
    }

    #[test]
    fn export_carries_version_tag() {
        let doc = TransferDocument::single(
            DashboardExport {
                name: "Ops".into(),
                description: String::new(),
                settings: Map::new(),
                widgets: vec![record(3)],
            },
            chrono::Utc::now(),
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "dashboard");
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["dashboard"]["widgets"][0]["widget_type"], "chart");
    }

    #[test]
    fn rejects_other_major_versions() {
        assert!(check_version("1").is_ok());
        assert!(check_version("1.4").is_ok());
        assert_matches!(check_version("2.0"), Err(CoreError::Validation(_)));
        assert_matches!(check_version("v1"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn settings_documents_are_not_importable() {
        let doc = TransferDocument::Settings {
            version: "1.0".into(),
            exported_at: None,
            settings: Map::new(),
        };
        assert_matches!(doc.into_dashboards(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_all_dashboards_rejected() {
        let doc = TransferDocument::all(Vec::new(), chrono::Utc::now());
        assert!(doc.into_dashboards().is_err());
    }

    #[test]
    fn rebind_clears_ids() {
        let widgets = rebind_widgets(vec![record(3), record(4)], 99);
        assert!(widgets.iter().all(|w| w.id.is_none() && w.dashboard_id == 99));
        assert_eq!(widgets[0].config, json!({"chartType": "bar"}));
    }

    #[test]
    fn into_parts_validates_name() {
        let export = DashboardExport {
            name: "  ".into(),
            description: String::new(),
            settings: Map::new(),
            widgets: Vec::new(),
        };
        assert!(export.into_parts().is_err());
    }
}
