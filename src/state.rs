//! Application state management

use crate::cache::MarketDataCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::market::{AlphaVantageProvider, MarketDataProvider};
use crate::scheduler::RefreshScheduler;
use crate::services::QuoteGateway;
use crate::widgets::{default_widgets, Widget, WidgetRegistry};
use parking_lot::RwLock;
use std::sync::Arc;

/// Application state shared across all commands
pub struct AppState {
    pub config: AppConfig,

    /// Dashboard layout in display order
    pub registry: RwLock<WidgetRegistry>,

    /// Latest market data per key
    pub cache: Arc<MarketDataCache>,

    /// Normalizing client for the market data API
    pub gateway: Arc<QuoteGateway>,

    /// Per-widget refresh tasks
    pub scheduler: RefreshScheduler,
}

impl AppState {
    /// Create application state backed by the configured Alpha Vantage endpoint
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = Arc::new(AlphaVantageProvider::new(&config.provider)?);
        Ok(Self::with_provider(config, provider))
    }

    /// Create application state over any market data provider.
    /// The registry starts with the default dashboard.
    pub fn with_provider(config: AppConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        tracing::info!("Market data provider: {}", provider.id());

        let cache = Arc::new(MarketDataCache::new());
        let gateway = Arc::new(QuoteGateway::new(provider));
        let scheduler =
            RefreshScheduler::new(Arc::clone(&gateway), Arc::clone(&cache), config.intervals);

        Self {
            config,
            registry: RwLock::new(WidgetRegistry::new(default_widgets())),
            cache,
            gateway,
            scheduler,
        }
    }

    /// Snapshot of the widget list
    pub fn widgets(&self) -> Vec<Widget> {
        self.registry.read().list().to_vec()
    }

    pub fn widget(&self, id: &str) -> Option<Widget> {
        self.registry.read().get(id).cloned()
    }

    /// Bring refresh tasks in line with the registry
    pub fn sync_scheduler(&self) {
        let registry = self.registry.read();
        self.scheduler.sync(registry.list());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::quote_gateway::tests::ScriptedProvider;

    /// State over a scripted provider with no upstream data
    pub(crate) fn test_state() -> Arc<AppState> {
        test_state_with(ScriptedProvider::default())
    }

    pub(crate) fn test_state_with(provider: ScriptedProvider) -> Arc<AppState> {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        Arc::new(AppState::with_provider(config, Arc::new(provider)))
    }

    #[test]
    fn test_new_state_has_default_dashboard() {
        let state = test_state();
        let ids: Vec<String> = state.widgets().iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(state.widget("2").is_some());
        assert!(state.widget("9").is_none());
    }

    #[tokio::test]
    async fn test_sync_scheduler_follows_registry() {
        let state = test_state();
        state.sync_scheduler();
        assert_eq!(state.scheduler.attached_count(), 3);

        state.registry.write().remove("1");
        state.sync_scheduler();
        assert_eq!(state.scheduler.attached_count(), 2);
        assert!(!state.scheduler.is_attached("1"));

        state.scheduler.shutdown();
    }

    #[test]
    fn test_new_with_alpha_vantage() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert!(AppState::new(config).is_ok());
    }
}
