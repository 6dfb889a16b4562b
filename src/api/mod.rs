//! Local HTTP API
//!
//! JSON endpoints a browser dashboard drives: widget management, rendered
//! views, cached market data and configuration export/import.

pub mod handlers;
mod server;
mod types;

pub use server::{router, ApiServer};
pub use types::{ApiResponse, Empty, QuotesQuery};
