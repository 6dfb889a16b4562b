//! Common market data types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time price/volume record for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

impl Quote {
    /// Zero-valued quote carrying only identity
    pub fn empty(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            volume: 0,
        }
    }
}

/// One day of open/high/low/close/volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
