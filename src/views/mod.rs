//! Presentation state
//!
//! Derives what each widget renders from the registry and the cache:
//! formatted quote rows, ranked mover cards and the chart summary. Views are
//! plain serializable structs; nothing here performs I/O.

pub mod format;

use crate::cache::{CacheEntry, MarketDataCache};
use crate::market::types::{DailyBar, Quote};
use crate::widgets::{
    ChartConfig, FinanceCardsConfig, StockTableConfig, Widget, WidgetKind, WidgetSize, WidgetType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use format::{
    format_price, format_signed, format_signed_percent, format_volume, time_since_update,
};

pub const TABLE_PAGE_SIZE: usize = 10;
pub const MAX_CARDS: usize = 5;
pub const MAX_CHART_POINTS: usize = 30;

/// Search and pagination input for the stock table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub volume: String,
    pub positive: bool,
}

impl From<&Quote> for StockRow {
    fn from(quote: &Quote) -> Self {
        StockRow {
            symbol: quote.symbol.clone(),
            name: quote.name.clone(),
            price: format_price(quote.price),
            change: format_signed(quote.change),
            change_percent: format_signed_percent(quote.change_percent),
            volume: format_volume(quote.volume),
            positive: quote.change >= 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTableView {
    pub search: String,
    pub rows: Vec<StockRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub summary: Option<String>,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceCard {
    pub rank: usize,
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceCardsView {
    pub category: String,
    pub cards: Vec<FinanceCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub subtitle: String,
    pub chart_type: String,
    pub points: Vec<ChartPoint>,
    pub current_price: String,
    pub change: String,
    pub change_percent: String,
    pub positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewBody {
    StockTable(StockTableView),
    FinanceCards(FinanceCardsView),
    Chart(ChartView),
}

/// Everything one widget panel renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    pub id: String,
    pub title: String,
    pub widget_type: WidgetType,
    pub size: Option<WidgetSize>,
    /// Spinner only while nothing can be shown yet
    pub loading: bool,
    pub error: Option<String>,
    pub updated: String,
    pub body: ViewBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub widgets: Vec<WidgetView>,
    /// Welcome state
    pub empty: bool,
}

fn stock_table_view(entry: &CacheEntry<Quote>, query: &ViewQuery) -> StockTableView {
    let search = query.search.as_deref().unwrap_or("").trim().to_string();
    let needle = search.to_lowercase();

    let matches: Vec<&Quote> = entry
        .data
        .iter()
        .filter(|q| {
            needle.is_empty()
                || q.symbol.to_lowercase().contains(&needle)
                || q.name.to_lowercase().contains(&needle)
        })
        .collect();

    let total = matches.len();
    let total_pages = total.div_ceil(TABLE_PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);
    let start = (page - 1) * TABLE_PAGE_SIZE;
    let end = (start + TABLE_PAGE_SIZE).min(total);

    let rows: Vec<StockRow> = matches[start.min(total)..end]
        .iter()
        .map(|q| StockRow::from(*q))
        .collect();

    let (summary, empty_message) = if total == 0 {
        let message = if entry.data.is_empty() {
            "No stock data available"
        } else {
            "No stocks match your search"
        };
        (None, Some(message.to_string()))
    } else {
        (Some(format!("Showing {} to {} of {} results", start + 1, end, total)), None)
    };

    StockTableView {
        search,
        rows,
        page,
        total_pages,
        total,
        summary,
        empty_message,
    }
}

fn finance_cards_view(config: &FinanceCardsConfig, entry: &CacheEntry<Quote>) -> FinanceCardsView {
    let cards = entry
        .data
        .iter()
        .take(config.count.min(MAX_CARDS))
        .enumerate()
        .map(|(i, quote)| {
            let positive = quote.change >= 0.0;
            FinanceCard {
                rank: i + 1,
                symbol: quote.symbol.clone(),
                name: quote.name.clone(),
                price: format_price(quote.price),
                change: format_signed(quote.change),
                // Sign prefix follows the absolute change
                change_percent: format!(
                    "{}{:.2}%",
                    if positive { "+" } else { "" },
                    quote.change_percent
                ),
                positive,
            }
        })
        .collect();

    FinanceCardsView {
        category: config.category.clone(),
        cards,
    }
}

fn chart_view(config: &ChartConfig, bars: &[DailyBar]) -> ChartView {
    let recent = &bars[bars.len().saturating_sub(MAX_CHART_POINTS)..];

    let points = recent
        .iter()
        .map(|bar| ChartPoint {
            label: bar.date.format("%b %-d").to_string(),
            price: bar.close,
        })
        .collect();

    let current = recent.last().map(|b| b.close).unwrap_or(0.0);
    let previous = if recent.len() >= 2 {
        recent[recent.len() - 2].close
    } else {
        0.0
    };
    let change = current - previous;
    let percent = if previous != 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };

    ChartView {
        subtitle: format!("{} • {}", config.symbol, config.period),
        chart_type: config.chart_type.clone(),
        points,
        current_price: format_price(current),
        change: format_signed(change),
        change_percent: format_signed_percent(percent),
        positive: change >= 0.0,
    }
}

struct Status {
    loading: bool,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl<T> From<&CacheEntry<T>> for Status {
    fn from(entry: &CacheEntry<T>) -> Self {
        Status {
            loading: entry.loading && entry.data.is_empty(),
            error: entry.error.clone(),
            last_updated: entry.last_updated,
        }
    }
}

/// Build the view of one widget
pub fn widget_view(
    widget: &Widget,
    cache: &MarketDataCache,
    query: &ViewQuery,
    now: DateTime<Utc>,
) -> WidgetView {
    let (status, body) = match &widget.kind {
        WidgetKind::StockTable(StockTableConfig { symbols, .. }) => {
            let entry = cache.quotes(symbols);
            (Status::from(&entry), ViewBody::StockTable(stock_table_view(&entry, query)))
        }
        WidgetKind::FinanceCards(config) => {
            let entry = cache.gainers();
            (Status::from(&entry), ViewBody::FinanceCards(finance_cards_view(config, &entry)))
        }
        WidgetKind::Chart(config) => {
            let entry = cache.chart(&config.symbol);
            (Status::from(&entry), ViewBody::Chart(chart_view(config, &entry.data)))
        }
    };

    WidgetView {
        id: widget.id.clone(),
        title: widget.title.clone(),
        widget_type: widget.widget_type(),
        size: widget.size,
        loading: status.loading,
        error: status.error,
        updated: time_since_update(status.last_updated, now),
        body,
    }
}

/// Views of all widgets in display order
pub fn dashboard_view(
    widgets: &[Widget],
    cache: &MarketDataCache,
    now: DateTime<Utc>,
) -> DashboardView {
    let query = ViewQuery::default();
    DashboardView {
        widgets: widgets
            .iter()
            .map(|w| widget_view(w, cache, &query, now))
            .collect(),
        empty: widgets.is_empty(),
    }
}
