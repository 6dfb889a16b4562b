//! Scheduler module
//!
//! Runs the periodic market data refresh for every mounted widget.

mod refresh;

pub use refresh::{RefreshJob, RefreshScheduler};
