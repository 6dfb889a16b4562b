//! Dashboard export and import

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::widgets::Widget;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EXPORT_VERSION: &str = "1.0.0";

fn default_version() -> String {
    EXPORT_VERSION.to_string()
}

/// Exported dashboard layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardExport {
    pub widgets: Vec<Widget>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

/// Suggested download name, e.g. `finboard-config-2024-08-30.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("finboard-config-{}.json", date.format("%Y-%m-%d"))
}

pub fn export_dashboard(state: &AppState) -> DashboardExport {
    DashboardExport {
        widgets: state.widgets(),
        timestamp: Utc::now(),
        version: default_version(),
    }
}

/// Pretty-printed export document
pub fn export_json(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_dashboard(state))?)
}

/// Write the export into `dir` under the suggested file name
pub fn export_to_dir(state: &AppState, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    std::fs::write(&path, export_json(state)?)?;
    info!("Dashboard exported to {:?}", path);
    Ok(path)
}

/// Parse and validate an export document without applying it
pub fn parse_import(text: &str) -> Result<DashboardExport> {
    let config: DashboardExport = serde_json::from_str(text).map_err(|e| {
        warn!("Invalid configuration file: {}", e);
        AppError::Validation(format!("Invalid configuration file: {}", e))
    })?;

    let mut seen = HashSet::new();
    for widget in &config.widgets {
        if !seen.insert(widget.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid configuration file: duplicate widget id '{}'",
                widget.id
            )));
        }
    }

    Ok(config)
}

/// Replace the dashboard with an imported layout. On any error the current
/// layout is left as it was.
pub fn import_dashboard(state: &AppState, text: &str) -> Result<Vec<Widget>> {
    let config = parse_import(text)?;
    info!(
        "Importing {} widgets (version {}, exported {})",
        config.widgets.len(),
        config.version,
        config.timestamp
    );

    let mut registry = state.registry.write();
    registry.reorder(config.widgets);
    state.scheduler.sync(registry.list());
    Ok(registry.list().to_vec())
}

pub fn import_from_file(state: &AppState, path: &Path) -> Result<Vec<Widget>> {
    let text = std::fs::read_to_string(path)?;
    import_dashboard(state, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use serde_json::json;

    #[test]
    fn test_export_document() {
        let state = test_state();
        let export = export_dashboard(&state);
        assert_eq!(export.version, "1.0.0");
        assert_eq!(export.widgets.len(), 3);

        let value: serde_json::Value = serde_json::from_str(&export_json(&state).unwrap()).unwrap();
        assert_eq!(value["widgets"][1]["type"], "finance-cards");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 30).unwrap();
        assert_eq!(export_file_name(date), "finboard-config-2024-08-30.json");
    }

    #[test]
    fn test_invalid_import_leaves_registry_unchanged() {
        let state = test_state();
        let before = state.widgets();

        let err = import_dashboard(&state, "{ not json").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration file"));
        assert_eq!(state.widgets(), before);

        let unknown_type = json!({
            "widgets": [{ "id": "a", "type": "heatmap", "title": "x", "config": {} }]
        });
        assert!(import_dashboard(&state, &unknown_type.to_string()).is_err());
        assert_eq!(state.widgets(), before);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let doc = json!({
            "widgets": [
                { "id": "a", "type": "chart", "title": "A" },
                { "id": "a", "type": "chart", "title": "B" }
            ]
        });
        let err = parse_import(&doc.to_string()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_applies_and_resyncs() {
        let state = test_state();
        state.sync_scheduler();

        let doc = json!({
            "widgets": [{
                "id": "w1", "type": "chart", "title": "MSFT", "config": { "symbol": "MSFT" }
            }],
            "timestamp": "2024-08-30T10:00:00.000Z",
            "version": "1.0.0"
        });
        let widgets = import_dashboard(&state, &doc.to_string()).unwrap();

        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].id, "w1");
        assert_eq!(state.scheduler.attached_count(), 1);
        assert!(state.scheduler.is_attached("w1"));
        state.scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let source = test_state();
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(&source, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("finboard-config-"));

        let target = test_state();
        target.registry.write().remove("2");
        let widgets = import_from_file(&target, &path).unwrap();
        assert_eq!(widgets, source.widgets());

        let missing = dir.path().join("missing.json");
        assert!(matches!(import_from_file(&target, &missing), Err(AppError::Io(_))));
        target.scheduler.shutdown();
    }
}
