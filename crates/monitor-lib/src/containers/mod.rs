//! Container health, resource and port views
//!
//! Nothing here keeps state between calls: every view is rebuilt from the
//! runtime on request.

mod aggregator;
mod ports;

pub use aggregator::{cpu_percent, memory_percent, ContainerListing, HealthAggregator};
pub use ports::dedupe;
