//! Display formatting for prices, volumes and update times

use chrono::{DateTime, Utc};

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// USD currency with thousands separators, e.g. `$1,234.50`
pub fn format_price(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

/// Compact volume: `1.5M`, `12.3K` or the plain integer
pub fn format_volume(volume: u64) -> String {
    if volume >= 1_000_000 {
        format!("{:.1}M", volume as f64 / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.1}K", volume as f64 / 1_000.0)
    } else {
        volume.to_string()
    }
}

/// Two decimals with a `+` prefix for non-negative values
pub fn format_signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

pub fn format_signed_percent(value: f64) -> String {
    format!("{}%", format_signed(value))
}

/// Relative age of the last update: `""`, `Ns ago` or `Nm ago`
pub fn time_since_update(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last_updated else {
        return String::new();
    };

    let seconds = (now - last).num_seconds().max(0);
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else {
        format!("{}m ago", seconds / 60)
    }
}
