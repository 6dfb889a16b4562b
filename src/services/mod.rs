//! Services Layer
//!
//! Business logic shared between the command functions and the scheduler.
//!
//! # Architecture
//!
//! ```text
//! HTTP API --> Commands ──┐
//!                         ├──> QuoteGateway --> MarketDataProvider
//! Scheduler ──────────────┘
//! ```

pub mod quote_gateway;

pub use quote_gateway::{Fetched, QuoteGateway};
