//! Per-widget refresh scheduler
//!
//! Each attached widget owns one periodic timer task. The first tick fires
//! immediately (the mount fetch); later ticks fire every 30 seconds for quotes
//! and gainers and every 60 seconds for charts. Every tick spawns an
//! independent fetch, so fetches for the same key may overlap and the last
//! one to settle wins.
//!
//! Attaching a widget assigns it a new generation. A fetch only writes into the
//! cache if its generation is still the live one for that widget, so results
//! that arrive after a widget was detached (or re-configured) are dropped.

use crate::cache::{DataKey, MarketDataCache};
use crate::config::RefreshIntervals;
use crate::error::{AppError, Result};
use crate::market::types::{DailyBar, Quote};
use crate::services::{Fetched, QuoteGateway};
use crate::widgets::{Widget, WidgetKind};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// What a widget polls for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshJob {
    Quotes(Vec<String>),
    Gainers,
    Chart(String),
}

impl RefreshJob {
    pub fn for_widget(widget: &Widget) -> Self {
        match &widget.kind {
            WidgetKind::StockTable(config) => RefreshJob::Quotes(config.symbols.clone()),
            WidgetKind::FinanceCards(_) => RefreshJob::Gainers,
            WidgetKind::Chart(config) => RefreshJob::Chart(config.symbol.clone()),
        }
    }

    pub fn key(&self) -> DataKey {
        match self {
            RefreshJob::Quotes(symbols) => DataKey::Quotes(symbols.clone()),
            RefreshJob::Gainers => DataKey::Gainers,
            RefreshJob::Chart(symbol) => DataKey::Chart(symbol.clone()),
        }
    }

    pub fn period(&self, intervals: &RefreshIntervals) -> Duration {
        match self {
            RefreshJob::Quotes(_) => intervals.quotes,
            RefreshJob::Gainers => intervals.gainers,
            RefreshJob::Chart(_) => intervals.chart,
        }
    }
}

struct TimerHandle {
    job: RefreshJob,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Gateway result for one fetch, before it is written to the cache
enum Outcome {
    Quotes(Fetched<Vec<Quote>>),
    Chart(String, Fetched<Vec<DailyBar>>),
}

struct Inner {
    gateway: Arc<QuoteGateway>,
    cache: Arc<MarketDataCache>,
    intervals: RefreshIntervals,
    /// Live generation per widget id. Only written while holding the
    /// widget's `timers` entry.
    generations: DashMap<String, u64>,
    timers: DashMap<String, TimerHandle>,
    next_generation: AtomicU64,
}

impl Inner {
    fn is_live(&self, widget_id: &str, generation: u64) -> bool {
        self.generations
            .get(widget_id)
            .map(|g| *g == generation)
            .unwrap_or(false)
    }

    async fn fetch(self: Arc<Self>, job: RefreshJob) -> Outcome {
        match job {
            RefreshJob::Quotes(symbols) => {
                Outcome::Quotes(self.gateway.fetch_quotes(&symbols).await)
            }
            RefreshJob::Gainers => Outcome::Quotes(self.gateway.fetch_top_gainers().await),
            RefreshJob::Chart(symbol) => {
                let fetched = self.gateway.fetch_daily_bars(&symbol).await;
                Outcome::Chart(symbol, fetched)
            }
        }
    }

    /// Run one fetch on its own task. The result is written only if the
    /// generation is still live when it settles; a dead fetch task is
    /// recorded as a failure.
    fn spawn_fetch(
        self: &Arc<Self>,
        widget_id: String,
        generation: u64,
        job: RefreshJob,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let key = job.key();
            let pending = inner.cache.begin(&key);
            let fetch = tokio::spawn(Arc::clone(&inner).fetch(job));

            match fetch.await {
                Ok(outcome) if inner.is_live(&widget_id, generation) => match outcome {
                    Outcome::Quotes(fetched) => inner.cache.settle_quotes(&key, fetched),
                    Outcome::Chart(symbol, fetched) => inner.cache.settle_chart(&symbol, fetched),
                },
                Ok(_) => {
                    warn!(
                        "Discarding late {} result for detached widget {} (generation {})",
                        key, widget_id, generation
                    );
                    inner.cache.abandon(&key, pending);
                }
                Err(e) => {
                    error!("Refresh task for widget {} failed: {}", widget_id, e);
                    if inner.is_live(&widget_id, generation) {
                        inner.cache.fail(&key, format!("Failed to refresh data: {}", e));
                    } else {
                        inner.cache.abandon(&key, pending);
                    }
                }
            }

            debug!("Refresh settled: widget {} {}", widget_id, key);
        })
    }

    async fn run_timer(self: Arc<Self>, widget_id: String, generation: u64, job: RefreshJob) {
        let period = job.period(&self.intervals);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.is_live(&widget_id, generation) {
                break;
            }
            self.spawn_fetch(widget_id.clone(), generation, job.clone());
        }
    }

    /// Publish a new generation and start its timer. Callers hold the
    /// widget's `timers` entry.
    fn start_timer(self: &Arc<Self>, widget_id: &str, job: RefreshJob) -> TimerHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        // Publish the generation before the first tick can fire
        self.generations.insert(widget_id.to_string(), generation);

        let timer = Arc::clone(self).run_timer(widget_id.to_string(), generation, job.clone());
        let handle = tokio::spawn(timer);

        info!(
            "Attached widget {} ({}) every {}s, generation {}",
            widget_id,
            job.key(),
            job.period(&self.intervals).as_secs(),
            generation
        );

        TimerHandle {
            job,
            generation,
            handle,
        }
    }
}

/// Cancellable periodic refresh tasks keyed by widget id
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    pub fn new(
        gateway: Arc<QuoteGateway>,
        cache: Arc<MarketDataCache>,
        intervals: RefreshIntervals,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                cache,
                intervals,
                generations: DashMap::new(),
                timers: DashMap::new(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Start polling for a widget. Re-attaching with an unchanged job keeps
    /// the running task; a changed job replaces it under a new generation.
    pub fn attach(&self, widget: &Widget) -> u64 {
        let job = RefreshJob::for_widget(widget);

        match self.inner.timers.entry(widget.id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().job == job {
                    return entry.get().generation;
                }
                let timer = self.inner.start_timer(&widget.id, job);
                let generation = timer.generation;
                entry.insert(timer).handle.abort();
                generation
            }
            Entry::Vacant(entry) => {
                let timer = self.inner.start_timer(&widget.id, job);
                let generation = timer.generation;
                entry.insert(timer);
                generation
            }
        }
    }

    /// Stop polling for a widget. In-flight fetches keep running but their
    /// results are discarded.
    pub fn detach(&self, widget_id: &str) -> bool {
        match self.inner.timers.entry(widget_id.to_string()) {
            Entry::Occupied(entry) => {
                self.inner.generations.remove(widget_id);
                entry.remove().handle.abort();
                info!("Detached widget {}", widget_id);
                true
            }
            Entry::Vacant(_) => {
                self.inner.generations.remove(widget_id);
                false
            }
        }
    }

    /// Fetch now, out of band, for an attached widget
    pub fn refresh_now(&self, widget_id: &str) -> Result<JoinHandle<()>> {
        let (generation, job) = self
            .inner
            .timers
            .get(widget_id)
            .map(|t| (t.generation, t.job.clone()))
            .ok_or_else(|| AppError::NotFound(format!("Widget '{}' is not scheduled", widget_id)))?;

        info!("Manual refresh for widget {}", widget_id);
        Ok(self.inner.spawn_fetch(widget_id.to_string(), generation, job))
    }

    /// Reconcile running tasks with the given widget list
    pub fn sync(&self, widgets: &[Widget]) {
        let wanted: HashSet<&str> = widgets.iter().map(|w| w.id.as_str()).collect();

        let stale: Vec<String> = self
            .inner
            .timers
            .iter()
            .filter(|entry| !wanted.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();

        for id in stale {
            self.detach(&id);
        }

        for widget in widgets {
            self.attach(widget);
        }
    }

    /// Abort every timer
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.inner.timers.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.detach(&id);
        }
        info!("Refresh scheduler stopped");
    }

    pub fn generation(&self, widget_id: &str) -> Option<u64> {
        self.inner.generations.get(widget_id).map(|g| *g)
    }

    pub fn is_attached(&self, widget_id: &str) -> bool {
        self.inner.timers.contains_key(widget_id)
    }

    pub fn attached_count(&self) -> usize {
        self.inner.timers.len()
    }
}
