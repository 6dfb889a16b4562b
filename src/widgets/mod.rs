//! Dashboard widgets: descriptors, templates and the ordered registry

pub mod registry;
pub mod types;

pub use registry::WidgetRegistry;
pub use types::{
    default_widgets, generate_widget_id, template_for, widget_templates, ChartConfig,
    FinanceCardsConfig, HeightClass, StockTableConfig, Widget, WidgetKind, WidgetSize,
    WidgetTemplate, WidgetType, WidgetUpdate, WidthClass,
};
