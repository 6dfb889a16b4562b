//! Widget commands

use crate::error::{AppError, Result};
use crate::scheduler::RefreshJob;
use crate::state::AppState;
use crate::widgets::{
    template_for, widget_templates, Widget, WidgetKind, WidgetSize, WidgetTemplate, WidgetType,
    WidgetUpdate,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AddWidgetRequest {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateWidgetRequest {
    pub title: Option<String>,
    pub size: Option<WidgetSize>,
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MoveWidgetRequest {
    pub from: usize,
    pub to: usize,
}

fn required_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Widget title is required".to_string()));
    }
    Ok(title.to_string())
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Widget '{}' not found", id))
}

/// Add-widget catalog
pub fn get_widget_types() -> Vec<WidgetTemplate> {
    widget_templates()
}

pub fn list_widgets(state: &AppState) -> Vec<Widget> {
    state.widgets()
}

pub fn get_widget(state: &AppState, id: &str) -> Result<Widget> {
    state.widget(id).ok_or_else(|| not_found(id))
}

/// Create a widget from the catalog and start polling for it
pub fn add_widget(state: &AppState, request: AddWidgetRequest) -> Result<Widget> {
    let title = required_title(&request.title)?;
    let template = template_for(request.widget_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown widget type: {}", request.widget_type.as_str()))
    })?;

    let widget = template.instantiate(&title);
    {
        let mut registry = state.registry.write();
        registry.add(widget.clone());
        state.scheduler.attach(&widget);
    }

    info!("Added {} widget {} '{}'", widget.widget_type().as_str(), widget.id, widget.title);
    Ok(widget)
}

pub fn remove_widget(state: &AppState, id: &str) -> Result<Widget> {
    let removed = {
        let mut registry = state.registry.write();
        let removed = registry.remove(id).ok_or_else(|| not_found(id))?;
        state.scheduler.detach(id);
        removed
    };

    info!("Removed widget {}", id);
    Ok(removed)
}

/// Merge title, size and config changes into a widget
pub fn update_widget(state: &AppState, id: &str, request: UpdateWidgetRequest) -> Result<Widget> {
    let current = get_widget(state, id)?;

    let title = request.title.as_deref().map(required_title).transpose()?;
    let kind = request
        .config
        .as_ref()
        .map(|config| WidgetKind::from_config(current.widget_type(), config))
        .transpose()?;

    let update = WidgetUpdate {
        title,
        size: request.size,
        kind,
    };

    let mut registry = state.registry.write();
    let previous = registry.get(id).map(RefreshJob::for_widget).ok_or_else(|| not_found(id))?;
    if !registry.update(id, update) {
        return Err(not_found(id));
    }
    let updated = registry.get(id).cloned().ok_or_else(|| not_found(id))?;

    // Attach under the registry lock so a concurrent remove cannot strand a timer
    if RefreshJob::for_widget(&updated) != previous {
        state.scheduler.attach(&updated);
    }

    Ok(updated)
}

pub fn rename_widget(state: &AppState, id: &str, title: &str) -> Result<Widget> {
    update_widget(
        state,
        id,
        UpdateWidgetRequest {
            title: Some(title.to_string()),
            ..Default::default()
        },
    )
}

/// Replace the whole widget sequence
pub fn reorder_widgets(state: &AppState, widgets: Vec<Widget>) -> Vec<Widget> {
    let mut registry = state.registry.write();
    registry.reorder(widgets);
    state.scheduler.sync(registry.list());
    registry.list().to_vec()
}

/// Drag-and-drop move from one index to another
pub fn move_widget(state: &AppState, request: MoveWidgetRequest) -> Result<Vec<Widget>> {
    let moved = state.registry.write().move_widget(request.from, request.to);
    if !moved {
        return Err(AppError::Validation(format!(
            "Cannot move widget from {} to {}",
            request.from, request.to
        )));
    }
    Ok(state.widgets())
}

/// Fetch now instead of waiting for the next tick
pub fn refresh_widget(state: &AppState, id: &str) -> Result<()> {
    if state.widget(id).is_none() {
        return Err(not_found(id));
    }
    state.scheduler.refresh_now(id)?;
    Ok(())
}

/// One-off fetch written into the widget's own status fields
pub async fn snapshot_widget(state: &AppState, id: &str) -> Result<Widget> {
    let widget = get_widget(state, id)?;
    state.registry.write().set_widget_loading(id, true);

    let (data, error) = match &widget.kind {
        WidgetKind::StockTable(config) => {
            let fetched = state.gateway.fetch_quotes(&config.symbols).await;
            (serde_json::to_value(&fetched.data), fetched.error)
        }
        WidgetKind::FinanceCards(_) => {
            let fetched = state.gateway.fetch_top_gainers().await;
            (serde_json::to_value(&fetched.data), fetched.error)
        }
        WidgetKind::Chart(config) => {
            let fetched = state.gateway.fetch_daily_bars(&config.symbol).await;
            (serde_json::to_value(&fetched.data), fetched.error)
        }
    };

    let mut registry = state.registry.write();
    match data {
        Ok(data) => {
            registry.set_widget_data(id, data);
            if let Some(error) = error {
                registry.set_widget_error(id, error);
            }
        }
        Err(e) => registry.set_widget_error(id, format!("Failed to fetch data: {}", e)),
    }

    registry.get(id).cloned().ok_or_else(|| not_found(id))
}
