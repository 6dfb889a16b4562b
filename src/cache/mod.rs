//! Market Data Cache
//!
//! Holds the last payload per data kind together with its loading flag,
//! error message and last-updated time. Entries are shared by every widget
//! that reads the same key and are written by whichever fetch settles last.

use crate::market::types::{DailyBar, Quote};
use crate::services::Fetched;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Identifies one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// Quotes for an ordered symbol list
    Quotes(Vec<String>),
    Gainers,
    /// Daily bars for one symbol
    Chart(String),
}

impl DataKey {
    fn quotes_key(symbols: &[String]) -> String {
        symbols.join(",")
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKey::Quotes(symbols) => write!(f, "quotes[{}]", Self::quotes_key(symbols)),
            DataKey::Gainers => write!(f, "gainers"),
            DataKey::Chart(symbol) => write!(f, "chart[{}]", symbol),
        }
    }
}

/// Last known state of one data kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Fetches begun and not yet settled, failed or abandoned
    #[serde(skip)]
    in_flight: u32,
    /// Bumped on every settle or fail
    #[serde(skip)]
    revision: u64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
            last_updated: None,
            in_flight: 0,
            revision: 0,
        }
    }
}

/// Returned by `begin`, handed back to `abandon` when the result is discarded
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    revision: u64,
    cleared_error: Option<String>,
}

impl<T> CacheEntry<T> {
    fn begin(&mut self) -> Pending {
        self.loading = true;
        self.in_flight += 1;
        Pending {
            revision: self.revision,
            cleared_error: self.error.take(),
        }
    }

    fn finish(&mut self) {
        self.loading = false;
        self.in_flight = self.in_flight.saturating_sub(1);
        self.revision += 1;
    }

    /// Apply a whole-call gateway outcome.
    ///
    /// Success replaces the payload and clears the error. A degraded outcome
    /// records the error and keeps whatever payload is already present; the
    /// substitute data is only installed when the entry has nothing to show.
    fn settle(&mut self, fetched: Fetched<Vec<T>>) {
        self.finish();
        match fetched.error {
            None => {
                self.data = fetched.data;
                self.error = None;
                self.last_updated = Some(Utc::now());
            }
            Some(error) => {
                if self.data.is_empty() {
                    self.data = fetched.data;
                    self.last_updated = Some(Utc::now());
                }
                self.error = Some(error);
            }
        }
    }

    /// Apply a per-symbol batch. Symbols that fell back carry their own
    /// sample rows, so the batch always replaces the payload.
    fn settle_batch(&mut self, fetched: Fetched<Vec<T>>) {
        self.finish();
        self.data = fetched.data;
        self.error = fetched.error;
        self.last_updated = Some(Utc::now());
    }

    fn fail(&mut self, error: String) {
        self.finish();
        self.error = Some(error);
    }

    fn abandon(&mut self, pending: Pending) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.loading = false;
        }
        if self.revision == pending.revision && self.error.is_none() {
            self.error = pending.cleared_error;
        }
    }
}

/// In-memory cache shared by all widgets
#[derive(Default)]
pub struct MarketDataCache {
    quotes: DashMap<String, CacheEntry<Quote>>,
    gainers: RwLock<CacheEntry<Quote>>,
    charts: DashMap<String, CacheEntry<DailyBar>>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<R>(
        &self,
        key: &DataKey,
        quotes: impl FnOnce(&mut CacheEntry<Quote>) -> R,
        bars: impl FnOnce(&mut CacheEntry<DailyBar>) -> R,
    ) -> R {
        match key {
            DataKey::Quotes(symbols) => {
                quotes(&mut self.quotes.entry(DataKey::quotes_key(symbols)).or_default())
            }
            DataKey::Gainers => quotes(&mut self.gainers.write()),
            DataKey::Chart(symbol) => bars(&mut self.charts.entry(symbol.clone()).or_default()),
        }
    }

    /// Mark a fetch as started for `key`
    pub fn begin(&self, key: &DataKey) -> Pending {
        debug!("Cache begin: {}", key);
        self.with_entry(key, CacheEntry::begin, CacheEntry::begin)
    }

    /// Settle a quotes or gainers fetch
    pub fn settle_quotes(&self, key: &DataKey, fetched: Fetched<Vec<Quote>>) {
        debug!("Cache settle: {} (degraded: {})", key, fetched.is_degraded());
        match key {
            DataKey::Quotes(symbols) => self
                .quotes
                .entry(DataKey::quotes_key(symbols))
                .or_default()
                .settle_batch(fetched),
            DataKey::Gainers => self.gainers.write().settle(fetched),
            DataKey::Chart(_) => tracing::warn!("Ignoring quote payload for {}", key),
        }
    }

    /// Settle a chart fetch
    pub fn settle_chart(&self, symbol: &str, fetched: Fetched<Vec<DailyBar>>) {
        debug!("Cache settle: chart[{}] (degraded: {})", symbol, fetched.is_degraded());
        self.charts
            .entry(symbol.to_string())
            .or_default()
            .settle(fetched);
    }

    /// Record a failure that produced no payload at all
    pub fn fail(&self, key: &DataKey, error: impl Into<String>) {
        let error = error.into();
        self.with_entry(key, |e| e.fail(error.clone()), |e| e.fail(error.clone()));
    }

    /// Undo the `begin` of a fetch whose result was discarded
    pub fn abandon(&self, key: &DataKey, pending: Pending) {
        let bars_pending = pending.clone();
        self.with_entry(key, |e| e.abandon(pending), |e| e.abandon(bars_pending));
    }

    pub fn quotes(&self, symbols: &[String]) -> CacheEntry<Quote> {
        self.quotes
            .get(&DataKey::quotes_key(symbols))
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn gainers(&self) -> CacheEntry<Quote> {
        self.gainers.read().clone()
    }

    pub fn chart(&self, symbol: &str) -> CacheEntry<DailyBar> {
        self.charts.get(symbol).map(|e| e.clone()).unwrap_or_default()
    }

    /// Drop all payloads
    pub fn clear_cache(&self) {
        self.quotes.clear();
        self.charts.clear();
        *self.gainers.write() = CacheEntry::default();
    }

    /// Clear every error message, keeping payloads
    pub fn clear_errors(&self) {
        for mut entry in self.quotes.iter_mut() {
            entry.error = None;
        }
        for mut entry in self.charts.iter_mut() {
            entry.error = None;
        }
        self.gainers.write().error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fallback;

    fn aapl_key() -> DataKey {
        DataKey::Quotes(vec!["AAPL".to_string()])
    }

    fn live_quote(price: f64) -> Quote {
        Quote {
            price,
            ..Quote::empty("AAPL", "Apple Inc.")
        }
    }

    #[test]
    fn test_success_replaces_payload() {
        let cache = MarketDataCache::new();
        let key = aapl_key();

        cache.begin(&key);
        assert!(cache.quotes(&["AAPL".to_string()]).loading);

        cache.settle_quotes(&key, Fetched::ok(vec![live_quote(1.0)]));
        cache.settle_quotes(&key, Fetched::ok(vec![live_quote(2.0)]));

        let entry = cache.quotes(&["AAPL".to_string()]);
        assert!(!entry.loading);
        assert!(entry.error.is_none());
        assert!(entry.last_updated.is_some());
        assert_eq!(entry.data, vec![live_quote(2.0)]);
    }

    #[test]
    fn test_failure_keeps_stale_payload() {
        let cache = MarketDataCache::new();
        let key = DataKey::Chart("AAPL".to_string());
        let live = fallback::sample_daily_bars()[..2].to_vec();

        cache.settle_chart("AAPL", Fetched::ok(live.clone()));
        let updated = cache.chart("AAPL").last_updated;

        cache.begin(&key);
        cache.settle_chart(
            "AAPL",
            Fetched::degraded(fallback::sample_daily_bars(), "rate limited"),
        );

        let entry = cache.chart("AAPL");
        assert_eq!(entry.data, live);
        assert_eq!(entry.error.as_deref(), Some("rate limited"));
        assert_eq!(entry.last_updated, updated);
        assert!(!entry.loading);
    }

    #[test]
    fn test_partial_quote_batch_replaces_payload() {
        let cache = MarketDataCache::new();
        let symbols = vec!["AAPL".to_string(), "IBM".to_string()];
        let key = DataKey::Quotes(symbols.clone());
        let ibm = |price| Quote {
            price,
            ..Quote::empty("IBM", "IBM")
        };

        cache.settle_quotes(&key, Fetched::ok(vec![live_quote(180.0), ibm(100.0)]));
        let first = cache.quotes(&symbols).last_updated;

        // AAPL refreshed, IBM fell back to its zero quote
        cache.begin(&key);
        cache.settle_quotes(
            &key,
            Fetched::degraded(
                vec![live_quote(200.0), fallback::quote_or_empty("IBM")],
                "Showing sample data for IBM: HTTP error! status: 500",
            ),
        );

        let entry = cache.quotes(&symbols);
        assert_eq!(entry.data[0].price, 200.0);
        assert_eq!(entry.data[1].price, 0.0);
        assert!(entry.error.as_deref().unwrap().contains("IBM"));
        assert!(entry.last_updated >= first);
        assert!(!entry.loading);
    }

    #[test]
    fn test_abandon_keeps_other_fetch_loading() {
        let cache = MarketDataCache::new();
        let key = DataKey::Chart("AAPL".to_string());
        cache.settle_chart("AAPL", Fetched::degraded(fallback::sample_daily_bars(), "HTTP 500"));

        let discarded = cache.begin(&key);
        cache.begin(&key);
        cache.abandon(&key, discarded);

        // The other fetch is still running
        let entry = cache.chart("AAPL");
        assert!(entry.loading);
        assert_eq!(entry.error.as_deref(), Some("HTTP 500"));

        cache.settle_chart("AAPL", Fetched::ok(fallback::sample_daily_bars()));
        assert!(!cache.chart("AAPL").loading);
    }

    #[test]
    fn test_abandon_restores_cleared_error() {
        let cache = MarketDataCache::new();
        let key = DataKey::Gainers;
        cache.settle_quotes(&key, Fetched::degraded(fallback::sample_gainers(), "upstream down"));

        let pending = cache.begin(&key);
        assert!(cache.gainers().error.is_none());
        cache.abandon(&key, pending);

        let entry = cache.gainers();
        assert!(!entry.loading);
        assert_eq!(entry.error.as_deref(), Some("upstream down"));

        // A settle in between wins over the restored error
        let pending = cache.begin(&key);
        cache.begin(&key);
        cache.settle_quotes(&key, Fetched::ok(fallback::sample_gainers()));
        cache.abandon(&key, pending);
        assert!(cache.gainers().error.is_none());
    }

    #[test]
    fn test_failure_on_empty_entry_installs_fallback() {
        let cache = MarketDataCache::new();
        cache.begin(&DataKey::Gainers);
        cache.settle_quotes(
            &DataKey::Gainers,
            Fetched::degraded(fallback::sample_gainers(), "upstream down"),
        );

        let entry = cache.gainers();
        assert_eq!(entry.data, fallback::sample_gainers());
        assert_eq!(entry.error.as_deref(), Some("upstream down"));
    }

    #[test]
    fn test_reverse_order_settlement_last_wins() {
        let cache = MarketDataCache::new();
        let key = DataKey::Chart("AAPL".to_string());

        // Two overlapping fetches: the failing one settles first
        cache.begin(&key);
        cache.begin(&key);
        cache.settle_chart("AAPL", Fetched::degraded(fallback::sample_daily_bars(), "HTTP 500"));
        let live = fallback::sample_daily_bars()[..2].to_vec();
        cache.settle_chart("AAPL", Fetched::ok(live.clone()));

        let entry = cache.chart("AAPL");
        assert_eq!(entry.data, live);
        assert!(entry.error.is_none());
        assert!(!entry.loading);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = MarketDataCache::new();
        cache.settle_quotes(&aapl_key(), Fetched::ok(vec![live_quote(1.0)]));

        let other = vec!["AAPL".to_string(), "MSFT".to_string()];
        assert!(cache.quotes(&other).data.is_empty());
        assert!(cache.chart("AAPL").last_updated.is_none());
    }

    #[test]
    fn test_fail_abandon_and_clear() {
        let cache = MarketDataCache::new();
        let key = aapl_key();

        cache.settle_quotes(&key, Fetched::ok(vec![live_quote(1.0)]));
        cache.begin(&key);
        cache.fail(&key, "task panicked");
        let entry = cache.quotes(&["AAPL".to_string()]);
        assert_eq!(entry.error.as_deref(), Some("task panicked"));
        assert_eq!(entry.data.len(), 1);

        let pending = cache.begin(&DataKey::Gainers);
        cache.abandon(&DataKey::Gainers, pending);
        assert!(!cache.gainers().loading);

        cache.clear_errors();
        assert!(cache.quotes(&["AAPL".to_string()]).error.is_none());
        assert_eq!(cache.quotes(&["AAPL".to_string()]).data.len(), 1);

        cache.clear_cache();
        assert!(cache.quotes(&["AAPL".to_string()]).data.is_empty());
    }
}
