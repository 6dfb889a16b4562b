//! Commands
//!
//! Every operation the front-end can invoke, as plain functions over
//! `AppState`. The HTTP layer in `api` is a thin wrapper around these.

pub mod dashboard;
pub mod market;
pub mod widgets;
