//! Monitoring core for the home-lab operations dashboard
//!
//! This crate provides:
//! - Service reachability probes and a rolling 24h response-time history
//! - A fault-isolated background scheduler
//! - Container health, resource and published-port views over Docker
//! - Pi-hole DNS filter statistics
//! - Webhook notifications with alert deduplication
//! - Health checks and Prometheus metrics

pub mod containers;
pub mod dns;
pub mod error;
pub mod health;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod observability;
pub mod probe;
pub mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthReport, Readiness};
pub use models::*;
pub use observability::MonitorMetrics;
