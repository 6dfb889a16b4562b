//! Runtime configuration
//!
//! Everything is read from environment variables so the binary can run
//! without a settings store. `AppConfig::from_lookup` takes any key lookup,
//! which keeps parsing testable without touching the process environment.

use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_API_KEY: &str = "demo";

/// Upstream market-data API settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Url,
    pub timeout: Duration,
}

/// Refresh periods per data kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub quotes: Duration,
    pub gainers: Duration,
    pub chart: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            quotes: Duration::from_secs(30),
            gainers: Duration::from_secs(30),
            chart: Duration::from_secs(60),
        }
    }
}

/// HTTP command surface settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub intervals: RefreshIntervals,
    /// Dashboard file imported at startup instead of the default layout
    pub dashboard_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("FINBOARD_API_KEY")
            .or_else(|| get("ALPHA_VANTAGE_API_KEY"))
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let base_url = get("FINBOARD_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| {
                AppError::Config(format!("Invalid FINBOARD_BASE_URL '{}': {}", base_url, e))
            })?;

        let timeout_secs: u64 = parse_or(&get, "FINBOARD_HTTP_TIMEOUT_SECS", 30)?;
        let quotes_secs: u64 = parse_or(&get, "FINBOARD_QUOTES_INTERVAL_SECS", 30)?;
        let chart_secs: u64 = parse_or(&get, "FINBOARD_CHART_INTERVAL_SECS", 60)?;

        if quotes_secs == 0 || chart_secs == 0 {
            return Err(AppError::Config("Refresh intervals must be at least 1 second".to_string()));
        }

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            server: ServerConfig {
                host: get("FINBOARD_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_or(&get, "FINBOARD_PORT", 5174)?,
            },
            intervals: RefreshIntervals {
                quotes: Duration::from_secs(quotes_secs),
                gainers: Duration::from_secs(quotes_secs),
                chart: Duration::from_secs(chart_secs),
            },
            dashboard_file: get("FINBOARD_DASHBOARD").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
