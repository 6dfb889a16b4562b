//! Widget descriptors
//!
//! A widget's configuration is a tagged variant per widget type. On the wire
//! (export files and the HTTP API) widgets keep the open `type` + `config`
//! object layout, decoded leniently: missing keys take defaults and unknown
//! keys are ignored.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use uuid::Uuid;

pub const DEFAULT_TABLE_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Widget type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    StockTable,
    FinanceCards,
    Chart,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::StockTable => "stock-table",
            WidgetType::FinanceCards => "finance-cards",
            WidgetType::Chart => "chart",
        }
    }
}

fn default_table_symbols() -> Vec<String> {
    DEFAULT_TABLE_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_cards_category() -> String {
    "gainers".to_string()
}

fn default_cards_count() -> usize {
    5
}

fn default_chart_symbol() -> String {
    "AAPL".to_string()
}

fn default_chart_period() -> String {
    "1D".to_string()
}

fn default_chart_type() -> String {
    "line".to_string()
}

/// Trim, uppercase and drop empty tickers
pub fn normalize_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    symbols
        .into_iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTableConfig {
    #[serde(default = "default_table_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceCardsConfig {
    /// Which movers list to show; only "gainers" is served upstream
    #[serde(rename = "type", default = "default_cards_category")]
    pub category: String,
    #[serde(default = "default_cards_count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default = "default_chart_symbol")]
    pub symbol: String,
    #[serde(default = "default_chart_period")]
    pub period: String,
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
}

/// Widget variant with its own configuration
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    StockTable(StockTableConfig),
    FinanceCards(FinanceCardsConfig),
    Chart(ChartConfig),
}

impl WidgetKind {
    pub fn widget_type(&self) -> WidgetType {
        match self {
            WidgetKind::StockTable(_) => WidgetType::StockTable,
            WidgetKind::FinanceCards(_) => WidgetType::FinanceCards,
            WidgetKind::Chart(_) => WidgetType::Chart,
        }
    }

    /// Decode an open config object for the given type
    pub fn from_config(widget_type: WidgetType, config: &Value) -> Result<Self> {
        let config = if config.is_null() { json!({}) } else { config.clone() };

        let kind = match widget_type {
            WidgetType::StockTable => {
                let mut table: StockTableConfig = serde_json::from_value(config)?;
                table.symbols = normalize_symbols(&table.symbols);
                if table.symbols.is_empty() {
                    table.symbols = default_table_symbols();
                }
                WidgetKind::StockTable(table)
            }
            WidgetType::FinanceCards => WidgetKind::FinanceCards(serde_json::from_value(config)?),
            WidgetType::Chart => {
                let mut chart: ChartConfig = serde_json::from_value(config)?;
                chart.symbol = chart.symbol.trim().to_uppercase();
                if chart.symbol.is_empty() {
                    chart.symbol = default_chart_symbol();
                }
                WidgetKind::Chart(chart)
            }
        };

        Ok(kind)
    }

    /// Encode back to the open config object
    pub fn config_json(&self) -> Value {
        let encoded = match self {
            WidgetKind::StockTable(c) => serde_json::to_value(c),
            WidgetKind::FinanceCards(c) => serde_json::to_value(c),
            WidgetKind::Chart(c) => serde_json::to_value(c),
        };
        // Plain derive-only structs always encode
        encoded.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthClass {
    Full,
    Half,
    Quarter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightClass {
    Small,
    Medium,
    Large,
}

/// Display size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSize {
    pub width: WidthClass,
    pub height: HeightClass,
}

impl WidgetSize {
    pub const fn new(width: WidthClass, height: HeightClass) -> Self {
        Self { width, height }
    }
}

/// A dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WidgetRecord", into = "WidgetRecord")]
pub struct Widget {
    pub id: String,
    pub kind: WidgetKind,
    pub title: String,
    pub size: Option<WidgetSize>,

    // Legacy single-shot fetch status
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub data: Option<Value>,
}

impl Widget {
    pub fn new(id: impl Into<String>, kind: WidgetKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            size: None,
            loading: false,
            error: None,
            last_updated: None,
            data: None,
        }
    }

    pub fn with_size(mut self, size: WidgetSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn widget_type(&self) -> WidgetType {
        self.kind.widget_type()
    }
}

/// Wire layout of a widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRecord {
    id: String,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    title: String,
    #[serde(default)]
    config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<WidgetSize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl TryFrom<WidgetRecord> for Widget {
    type Error = AppError;

    fn try_from(record: WidgetRecord) -> Result<Self> {
        if record.id.trim().is_empty() {
            return Err(AppError::Validation("Widget id must not be empty".to_string()));
        }

        Ok(Widget {
            kind: WidgetKind::from_config(record.widget_type, &record.config)?,
            id: record.id,
            title: record.title,
            size: record.size,
            loading: record.loading,
            error: record.error,
            last_updated: record.last_updated,
            data: record.data,
        })
    }
}

impl From<Widget> for WidgetRecord {
    fn from(widget: Widget) -> Self {
        WidgetRecord {
            widget_type: widget.kind.widget_type(),
            config: widget.kind.config_json(),
            id: widget.id,
            title: widget.title,
            size: widget.size,
            loading: widget.loading,
            error: widget.error,
            last_updated: widget.last_updated,
            data: widget.data,
        }
    }
}

/// Partial update merged into an existing widget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetUpdate {
    pub title: Option<String>,
    pub size: Option<WidgetSize>,
    pub kind: Option<WidgetKind>,
}

impl WidgetUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// Fresh unique widget id: `widget-<unix millis>-<9 random chars>`
pub fn generate_widget_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("widget-{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Entry of the add-widget catalog
#[derive(Debug, Clone, Serialize)]
pub struct WidgetTemplate {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "config", serialize_with = "serialize_kind_config")]
    pub kind: WidgetKind,
    pub size: WidgetSize,
}

fn serialize_kind_config<S: Serializer>(
    kind: &WidgetKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    kind.config_json().serialize(serializer)
}

impl WidgetTemplate {
    /// Build a new widget from this template with a fresh id
    pub fn instantiate(&self, title: &str) -> Widget {
        Widget::new(generate_widget_id(), self.kind.clone(), title).with_size(self.size)
    }
}

/// Catalog offered when adding a widget
pub fn widget_templates() -> Vec<WidgetTemplate> {
    vec![
        WidgetTemplate {
            widget_type: WidgetType::StockTable,
            name: "Stock Table",
            description: "Display stock prices in a searchable, paginated table",
            kind: WidgetKind::StockTable(StockTableConfig {
                symbols: normalize_symbols(["AAPL", "GOOGL", "MSFT"]),
                refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            }),
            size: WidgetSize::new(WidthClass::Full, HeightClass::Medium),
        },
        WidgetTemplate {
            widget_type: WidgetType::FinanceCards,
            name: "Finance Cards",
            description: "Show market movers and performance data in card format",
            kind: WidgetKind::FinanceCards(FinanceCardsConfig {
                category: default_cards_category(),
                count: default_cards_count(),
            }),
            size: WidgetSize::new(WidthClass::Half, HeightClass::Medium),
        },
        WidgetTemplate {
            widget_type: WidgetType::Chart,
            name: "Price Chart",
            description: "Interactive charts with technical indicators",
            kind: WidgetKind::Chart(ChartConfig {
                symbol: default_chart_symbol(),
                period: default_chart_period(),
                chart_type: default_chart_type(),
            }),
            size: WidgetSize::new(WidthClass::Half, HeightClass::Medium),
        },
    ]
}

pub fn template_for(widget_type: WidgetType) -> Option<WidgetTemplate> {
    widget_templates()
        .into_iter()
        .find(|t| t.widget_type == widget_type)
}

/// Layout shown on first start
pub fn default_widgets() -> Vec<Widget> {
    let medium = |width| WidgetSize::new(width, HeightClass::Medium);

    vec![
        Widget::new(
            "1",
            WidgetKind::StockTable(StockTableConfig {
                symbols: default_table_symbols(),
                refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            }),
            "Market Overview",
        )
        .with_size(medium(WidthClass::Full)),
        Widget::new(
            "2",
            WidgetKind::FinanceCards(FinanceCardsConfig {
                category: default_cards_category(),
                count: default_cards_count(),
            }),
            "Market Movers",
        )
        .with_size(medium(WidthClass::Half)),
        Widget::new(
            "3",
            WidgetKind::Chart(ChartConfig {
                symbol: default_chart_symbol(),
                period: default_chart_period(),
                chart_type: default_chart_type(),
            }),
            "AAPL Price Chart",
        )
        .with_size(medium(WidthClass::Half)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout_round_trip() {
        let widget = default_widgets().remove(0);
        let value = serde_json::to_value(&widget).unwrap();

        assert_eq!(value["type"], "stock-table");
        assert_eq!(value["config"]["symbols"][4], "TSLA");
        assert_eq!(value["config"]["refreshInterval"], 30000);
        assert_eq!(value["size"]["width"], "full");
        assert!(value.get("loading").is_none());

        let back: Widget = serde_json::from_value(value).unwrap();
        assert_eq!(back, widget);
    }

    #[test]
    fn test_lenient_config_decoding() {
        let widget: Widget = serde_json::from_value(json!({
            "id": "w1",
            "type": "stock-table",
            "title": "Tech",
            "config": { "symbols": [" nvda ", "", "amd"], "theme": "dark" }
        }))
        .unwrap();
        match widget.kind {
            WidgetKind::StockTable(ref c) => {
                assert_eq!(c.symbols, vec!["NVDA", "AMD"]);
                assert_eq!(c.refresh_interval, 30_000);
            }
            ref other => panic!("unexpected kind {:?}", other),
        }
        assert!(widget.size.is_none());

        let chart: Widget = serde_json::from_value(json!({
            "id": "w2",
            "type": "chart",
            "title": "Chart"
        }))
        .unwrap();
        assert_eq!(
            chart.kind,
            WidgetKind::Chart(ChartConfig {
                symbol: "AAPL".to_string(),
                period: "1D".to_string(),
                chart_type: "line".to_string(),
            })
        );

        let cards: Widget = serde_json::from_value(json!({
            "id": "w3",
            "type": "finance-cards",
            "title": "Movers",
            "config": { "type": "gainers", "count": 3 }
        }))
        .unwrap();
        assert_eq!(cards.kind.config_json(), json!({ "type": "gainers", "count": 3 }));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: std::result::Result<Widget, _> = serde_json::from_value(json!({
            "id": "w1",
            "type": "heatmap",
            "title": "Heat",
            "config": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_ids_unique_and_shaped() {
        let a = generate_widget_id();
        let b = generate_widget_id();
        assert_ne!(a, b);

        let parts: Vec<&str> = a.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "widget");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_templates() {
        let templates = widget_templates();
        assert_eq!(templates.len(), 3);

        let table = template_for(WidgetType::StockTable).unwrap();
        let widget = table.instantiate("My Stocks");
        assert_eq!(widget.title, "My Stocks");
        assert!(widget.id.starts_with("widget-"));
        assert_eq!(widget.size, Some(WidgetSize::new(WidthClass::Full, HeightClass::Medium)));

        let value = serde_json::to_value(&templates[2]).unwrap();
        assert_eq!(value["type"], "chart");
        assert_eq!(value["config"]["chartType"], "line");
    }
}
