//! Service response-time monitoring
//!
//! [`Scheduler`] drives a [`MonitorPass`] on a fixed interval; each pass asks
//! the [`ServiceTracker`] to probe every target concurrently and records the
//! tick into the [`RollingStore`], which the HTTP layer reads from.

mod scheduler;
mod store;
mod tracker;


pub use scheduler::{
    MonitorPass, Scheduler, SchedulerState, Tick, TickSummary, DEFAULT_MONITOR_INTERVAL,
};
pub use store::{RollingStore, DEFAULT_RETENTION};
pub use tracker::ServiceTracker;
