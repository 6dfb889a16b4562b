//! Market data and view commands
//!
//! Reads come from the cache only; fetching is the scheduler's job.

use crate::cache::CacheEntry;
use crate::error::{AppError, Result};
use crate::market::types::{DailyBar, Quote};
use crate::state::AppState;
use crate::views::{self, DashboardView, ViewQuery, WidgetView};
use crate::widgets::types::normalize_symbols;
use chrono::Utc;
use tracing::info;

/// Cached quotes for a symbol list, e.g. `AAPL,MSFT`
pub fn get_quotes(state: &AppState, symbols: &str) -> Result<CacheEntry<Quote>> {
    let symbols = normalize_symbols(symbols.split(','));
    if symbols.is_empty() {
        return Err(AppError::Validation("At least one symbol is required".to_string()));
    }
    Ok(state.cache.quotes(&symbols))
}

pub fn get_gainers(state: &AppState) -> CacheEntry<Quote> {
    state.cache.gainers()
}

pub fn get_chart(state: &AppState, symbol: &str) -> CacheEntry<DailyBar> {
    state.cache.chart(&symbol.trim().to_uppercase())
}

pub fn clear_cache(state: &AppState) {
    state.cache.clear_cache();
    info!("Market data cache cleared");
}

pub fn clear_errors(state: &AppState) {
    state.cache.clear_errors();
}

/// Render every widget in display order
pub fn get_dashboard(state: &AppState) -> DashboardView {
    views::dashboard_view(&state.widgets(), &state.cache, Utc::now())
}

/// Render one widget with table search and paging applied
pub fn get_widget_view(state: &AppState, id: &str, query: &ViewQuery) -> Result<WidgetView> {
    let widget = state
        .widget(id)
        .ok_or_else(|| AppError::NotFound(format!("Widget '{}' not found", id)))?;
    Ok(views::widget_view(&widget, &state.cache, query, Utc::now()))
}
