//! Widget Registry
//!
//! Ordered, in-memory collection of widgets. Sequence order is display order.
//! All operations are total: unknown ids are silently ignored.

use super::types::{Widget, WidgetUpdate};
use chrono::Utc;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    widgets: Vec<Widget>,
}

impl WidgetRegistry {
    pub fn new(widgets: Vec<Widget>) -> Self {
        Self { widgets }
    }

    /// Append a widget at the end
    pub fn add(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    /// Remove a widget by id, returning it when present
    pub fn remove(&mut self, id: &str) -> Option<Widget> {
        let index = self.position(id)?;
        Some(self.widgets.remove(index))
    }

    /// Merge the provided fields into the matching widget.
    /// Returns false when no widget matched.
    pub fn update(&mut self, id: &str, update: WidgetUpdate) -> bool {
        let Some(widget) = self.get_mut(id) else {
            return false;
        };

        if let Some(title) = update.title {
            widget.title = title;
        }
        if let Some(size) = update.size {
            widget.size = Some(size);
        }
        if let Some(kind) = update.kind {
            widget.kind = kind;
        }
        true
    }

    /// Replace the whole sequence as given. Not validated against the
    /// current contents.
    pub fn reorder(&mut self, widgets: Vec<Widget>) {
        self.widgets = widgets;
    }

    /// Drag gesture: take the widget at `from` and insert it at `to`.
    /// Out-of-range indexes leave the sequence untouched.
    pub fn move_widget(&mut self, from: usize, to: usize) -> bool {
        if from >= self.widgets.len() || to >= self.widgets.len() {
            return false;
        }

        let mut items = self.widgets.clone();
        let moved = items.remove(from);
        items.insert(to, moved);
        self.reorder(items);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn list(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn ids(&self) -> Vec<String> {
        self.widgets.iter().map(|w| w.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    // ========================================================================
    // Legacy per-widget status
    // ========================================================================

    pub fn set_widget_loading(&mut self, id: &str, loading: bool) {
        if let Some(widget) = self.get_mut(id) {
            widget.loading = loading;
        }
    }

    pub fn set_widget_data(&mut self, id: &str, data: Value) {
        if let Some(widget) = self.get_mut(id) {
            widget.data = Some(data);
            widget.last_updated = Some(Utc::now());
            widget.loading = false;
            widget.error = None;
        }
    }

    pub fn set_widget_error(&mut self, id: &str, error: impl Into<String>) {
        if let Some(widget) = self.get_mut(id) {
            widget.error = Some(error.into());
            widget.loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::types::{
        default_widgets, template_for, HeightClass, WidgetKind, WidgetSize, WidgetType, WidthClass,
    };
    use serde_json::json;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::new(default_widgets())
    }

    #[test]
    fn test_add_then_remove_restores_sequence() {
        let mut registry = registry();
        let before = registry.list().to_vec();

        let widget = template_for(WidgetType::Chart).unwrap().instantiate("TSLA");
        let id = widget.id.clone();
        registry.add(widget);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.list().last().unwrap().id, id);

        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.title, "TSLA");
        assert_eq!(registry.list(), before.as_slice());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut registry = registry();
        assert!(registry.remove("nope").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_update_title_only() {
        let mut registry = registry();
        let before = registry.list().to_vec();

        assert!(registry.update("2", WidgetUpdate::title("X")));

        let after = registry.list();
        assert_eq!(after[1].title, "X");
        assert_eq!(after[1].kind, before[1].kind);
        assert_eq!(after[1].size, before[1].size);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn test_update_size_and_kind() {
        let mut registry = registry();
        let kind =
            WidgetKind::from_config(WidgetType::Chart, &json!({ "symbol": "msft" })).unwrap();
        let size = WidgetSize::new(WidthClass::Quarter, HeightClass::Large);

        assert!(registry.update(
            "3",
            WidgetUpdate {
                size: Some(size),
                kind: Some(kind.clone()),
                ..Default::default()
            }
        ));
        let widget = registry.get("3").unwrap();
        assert_eq!(widget.size, Some(size));
        assert_eq!(widget.kind, kind);
        assert_eq!(widget.title, "AAPL Price Chart");

        assert!(!registry.update("missing", WidgetUpdate::title("Y")));
    }

    #[test]
    fn test_reorder_replaces_exactly() {
        let mut registry = registry();
        let mut items = registry.list().to_vec();
        let first = items.remove(0);
        items.push(first);

        registry.reorder(items.clone());
        assert_eq!(registry.ids(), vec!["2", "3", "1"]);
        assert_eq!(registry.list(), items.as_slice());

        let mut single = WidgetRegistry::new(default_widgets().into_iter().take(1).collect());
        let same = single.list().to_vec();
        single.reorder(same.clone());
        assert_eq!(single.list(), same.as_slice());
    }

    #[test]
    fn test_move_widget() {
        let mut registry = registry();
        assert!(registry.move_widget(0, 2));
        assert_eq!(registry.ids(), vec!["2", "3", "1"]);

        assert!(registry.move_widget(2, 0));
        assert_eq!(registry.ids(), vec!["1", "2", "3"]);

        assert!(!registry.move_widget(0, 3));
        assert_eq!(registry.ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_legacy_status_setters() {
        let mut registry = registry();

        registry.set_widget_loading("1", true);
        assert!(registry.get("1").unwrap().loading);

        registry.set_widget_error("1", "upstream down");
        let widget = registry.get("1").unwrap();
        assert!(!widget.loading);
        assert_eq!(widget.error.as_deref(), Some("upstream down"));

        registry.set_widget_data("1", json!([1, 2, 3]));
        let widget = registry.get("1").unwrap();
        assert!(widget.error.is_none());
        assert!(widget.last_updated.is_some());
        assert_eq!(widget.data, Some(json!([1, 2, 3])));

        registry.set_widget_loading("ghost", true);
        assert!(!registry.contains("ghost"));
    }
}
