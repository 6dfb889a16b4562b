//! Market data provider module

pub mod alpha_vantage;
pub mod fallback;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use alpha_vantage::AlphaVantageProvider;

/// Upstream market-data API that all provider implementations must implement.
///
/// Implementations return the raw JSON body after screening out transport
/// failures, non-2xx statuses, API-reported errors and rate-limit notices.
/// Shaping the body into records is the gateway's job.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider ID (e.g., "alpha_vantage")
    fn id(&self) -> &'static str;

    /// Latest quote for one symbol
    async fn global_quote(&self, symbol: &str) -> Result<Value>;

    /// Daily time series for one symbol
    async fn daily_series(&self, symbol: &str) -> Result<Value>;

    /// Top gainers/losers/most-active lists
    async fn top_gainers_losers(&self) -> Result<Value>;
}
