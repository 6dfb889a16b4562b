//! Static sample data served when the upstream API is unavailable

use super::types::{DailyBar, Quote};
use chrono::NaiveDate;

const COMPANIES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corp."),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("NVDA", "NVIDIA Corp."),
    ("META", "Meta Platforms Inc."),
];

// (symbol, name, price, change, change %, volume)
const SAMPLE_QUOTES: &[(&str, &str, f64, f64, f64, u64)] = &[
    ("AAPL", "Apple Inc.", 175.84, 2.41, 1.39, 50_127_900),
    ("GOOGL", "Alphabet Inc.", 138.32, 0.87, 0.63, 25_384_700),
    ("MSFT", "Microsoft Corp.", 338.11, -1.23, -0.36, 22_929_400),
    ("AMZN", "Amazon.com Inc.", 145.86, -0.94, -0.64, 31_827_500),
    ("TSLA", "Tesla Inc.", 248.50, 4.12, 1.69, 45_692_800),
];

const SAMPLE_GAINERS: &[(&str, &str, f64, f64, f64, u64)] = &[
    ("NVDA", "NVIDIA Corp.", 465.23, 23.45, 5.31, 38_945_600),
    ("AMD", "Advanced Micro Devices", 142.67, 8.91, 6.67, 25_384_700),
    ("PLTR", "Palantir Technologies", 28.45, 1.67, 6.24, 15_384_700),
];

// (year, month, day, open, high, low, close, volume)
const SAMPLE_BARS: &[(i32, u32, u32, f64, f64, f64, f64, u64)] = &[
    (2024, 8, 26, 170.00, 172.50, 169.80, 171.25, 48_567_800),
    (2024, 8, 27, 171.30, 173.90, 170.45, 172.87, 52_341_900),
    (2024, 8, 28, 172.90, 176.25, 171.80, 175.84, 50_127_900),
    (2024, 8, 29, 175.90, 177.45, 174.30, 176.12, 48_934_200),
    (2024, 8, 30, 176.00, 178.90, 175.50, 178.45, 52_341_600),
];

/// Resolve a display name for a ticker, falling back to the ticker itself
pub fn company_name(symbol: &str) -> String {
    COMPANIES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| symbol.to_string())
}

fn to_quote(row: &(&str, &str, f64, f64, f64, u64)) -> Quote {
    let (symbol, name, price, change, change_percent, volume) = *row;
    Quote {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        change_percent,
        volume,
    }
}

/// Sample quote for a single symbol, if one exists
pub fn sample_quote(symbol: &str) -> Option<Quote> {
    SAMPLE_QUOTES.iter().find(|row| row.0 == symbol).map(to_quote)
}

/// Fallback for one symbol: the sample if present, otherwise a zero quote
pub fn quote_or_empty(symbol: &str) -> Quote {
    sample_quote(symbol).unwrap_or_else(|| Quote::empty(symbol, &company_name(symbol)))
}

pub fn sample_gainers() -> Vec<Quote> {
    SAMPLE_GAINERS.iter().map(to_quote).collect()
}

/// Five-day sample series, oldest first
pub fn sample_daily_bars() -> Vec<DailyBar> {
    SAMPLE_BARS
        .iter()
        .filter_map(|&(y, m, d, open, high, low, close, volume)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| DailyBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            })
        })
        .collect()
}
