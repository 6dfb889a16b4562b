//! Quote Gateway
//!
//! Normalizes provider responses into `Quote` and `DailyBar` records.
//! Every failure (transport, HTTP status, API error, rate limit, malformed
//! payload) is absorbed here and replaced with deterministic sample data, so
//! callers always receive something renderable. The reason is kept alongside
//! the data for display.

use crate::error::{AppError, Result};
use crate::market::fallback;
use crate::market::types::{DailyBar, Quote};
use crate::market::MarketDataProvider;
use chrono::NaiveDate;
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum number of daily bars kept for a chart
pub const MAX_DAILY_BARS: usize = 30;

/// Maximum number of gainers reported
pub const MAX_GAINERS: usize = 5;

/// Gateway result: always-renderable data plus the reason it is degraded, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub error: Option<String>,
}

impl<T> Fetched<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    pub fn degraded(data: T, error: impl Into<String>) -> Self {
        Self {
            data,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Gateway in front of a market data provider
pub struct QuoteGateway {
    provider: Arc<dyn MarketDataProvider>,
}

impl QuoteGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Fetch one quote per symbol, concurrently. Output order matches input.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Fetched<Vec<Quote>> {
        info!("QuoteGateway::fetch_quotes - {} symbols", symbols.len());

        let requests = symbols.iter().map(|symbol| async move {
            let result = self
                .provider
                .global_quote(symbol)
                .await
                .and_then(|body| parse_global_quote(symbol, &body));

            match result {
                Ok(quote) => (quote, None),
                Err(e) => {
                    warn!("Error fetching data for {}: {}", symbol, e);
                    (fallback::quote_or_empty(symbol), Some(format!("{}: {}", symbol, e)))
                }
            }
        });

        let (quotes, failures): (Vec<Quote>, Vec<Option<String>>) =
            join_all(requests).await.into_iter().unzip();

        let failures: Vec<String> = failures.into_iter().flatten().collect();
        if failures.is_empty() {
            Fetched::ok(quotes)
        } else {
            Fetched::degraded(
                quotes,
                format!("Showing sample data for {}", failures.join("; ")),
            )
        }
    }

    /// Fetch up to 30 most recent daily bars, oldest first
    pub async fn fetch_daily_bars(&self, symbol: &str) -> Fetched<Vec<DailyBar>> {
        info!("QuoteGateway::fetch_daily_bars - {}", symbol);

        let result = self
            .provider
            .daily_series(symbol)
            .await
            .and_then(|body| parse_daily_series(&body));

        match result {
            Ok(bars) => Fetched::ok(bars),
            Err(e) => {
                warn!("Error fetching chart data for {}: {}", symbol, e);
                Fetched::degraded(
                    fallback::sample_daily_bars(),
                    format!("Showing sample chart data: {}", e),
                )
            }
        }
    }

    /// Fetch the top gainers reported upstream (at most five)
    pub async fn fetch_top_gainers(&self) -> Fetched<Vec<Quote>> {
        info!("QuoteGateway::fetch_top_gainers");

        let result = self
            .provider
            .top_gainers_losers()
            .await
            .and_then(|body| parse_top_gainers(&body));

        match result {
            Ok(gainers) => Fetched::ok(gainers),
            Err(e) => {
                warn!("Error fetching market gainers: {}", e);
                Fetched::degraded(
                    fallback::sample_gainers(),
                    format!("Showing sample market movers: {}", e),
                )
            }
        }
    }
}

// ========================================================================
// Payload parsing
// ========================================================================

/// Lenient float parse: numbers or numeric strings, anything else is 0
fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Lenient volume parse; negative or non-numeric values become 0
fn volume(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| number(value).max(0.0) as u64),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .unwrap_or_else(|_| number(value).max(0.0) as u64),
        _ => 0,
    }
}

pub(crate) fn parse_global_quote(requested: &str, body: &Value) -> Result<Quote> {
    let quote = body
        .get("Global Quote")
        .filter(|q| q.is_object())
        .ok_or_else(|| {
            AppError::MalformedPayload(format!("No quote data for symbol: {}", requested))
        })?;

    let symbol = quote
        .get("01. symbol")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::MalformedPayload(format!("No quote data for symbol: {}", requested))
        })?;

    Ok(Quote {
        symbol: symbol.to_string(),
        name: fallback::company_name(requested),
        price: number(quote.get("05. price")),
        change: number(quote.get("09. change")),
        change_percent: number(quote.get("10. change percent")),
        volume: volume(quote.get("06. volume")),
    })
}

pub(crate) fn parse_daily_series(body: &Value) -> Result<Vec<DailyBar>> {
    let series = body
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::MalformedPayload("No time series data available".to_string()))?;

    let mut bars: Vec<DailyBar> = series
        .iter()
        .filter_map(|(date, day)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            Some(DailyBar {
                date,
                open: number(day.get("1. open")),
                high: number(day.get("2. high")),
                low: number(day.get("3. low")),
                close: number(day.get("4. close")),
                volume: volume(day.get("5. volume")),
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(AppError::MalformedPayload("Time series contains no valid dates".to_string()));
    }

    // Newest first, keep the most recent window, then flip to chronological
    bars.sort_by(|a, b| b.date.cmp(&a.date));
    bars.truncate(MAX_DAILY_BARS);
    bars.reverse();

    Ok(bars)
}

pub(crate) fn parse_top_gainers(body: &Value) -> Result<Vec<Quote>> {
    let gainers = body
        .get("top_gainers")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::MalformedPayload("No gainers data available".to_string()))?;

    Ok(gainers
        .iter()
        .take(MAX_GAINERS)
        .map(|item| {
            let ticker = item
                .get("ticker")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .unwrap_or("N/A");

            Quote {
                symbol: ticker.to_string(),
                name: fallback::company_name(ticker),
                price: number(item.get("price")),
                change: number(item.get("change_amount")),
                change_percent: number(item.get("change_percentage")),
                volume: 0,
            }
        })
        .collect())
}
