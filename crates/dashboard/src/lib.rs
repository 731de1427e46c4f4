//! Home Ops dashboard server: HTTP API and configuration over the monitoring core

pub mod api;
pub mod config;
