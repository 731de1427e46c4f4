//! Background monitoring scheduler
//!
//! Runs one pass immediately on start and then one pass per interval. Every
//! pass runs in its own task behind a failure boundary: an error or panic is
//! logged and the next pass still happens on schedule.

use super::ServiceTracker;
use crate::containers::HealthAggregator;
use crate::health::{components, HealthRegistry};
use crate::models::HealthStatus;
use crate::notify::Alerter;
use crate::observability::MonitorMetrics;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Default interval between passes (1 minute)
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Work executed on every scheduler tick
#[async_trait]
pub trait Tick: Send + Sync {
    async fn run(&self) -> Result<TickSummary>;
}

/// Outcome of a successful pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub probed: usize,
    pub failed: usize,
    pub alerts_sent: usize,
    pub unhealthy_containers: usize,
}

/// The standard monitoring pass: probe everything, alert on failures,
/// optionally watch container health, and publish the outcome to the
/// health registry
pub struct MonitorPass {
    tracker: Arc<ServiceTracker>,
    alerter: Option<Arc<Alerter>>,
    health: Option<HealthRegistry>,
    containers: Option<HealthAggregator>,
}

impl MonitorPass {
    pub fn new(tracker: Arc<ServiceTracker>) -> Self {
        Self {
            tracker,
            alerter: None,
            health: None,
            containers: None,
        }
    }

    pub fn with_alerter(mut self, alerter: Arc<Alerter>) -> Self {
        self.alerter = Some(alerter);
        self
    }

    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    /// Also check container health on every pass
    pub fn with_container_watch(mut self, aggregator: HealthAggregator) -> Self {
        self.containers = Some(aggregator);
        self
    }

    /// Returns the number of unhealthy containers and alerts sent for them
    async fn watch_containers(&self, aggregator: &HealthAggregator) -> Result<(usize, usize)> {
        let records = match aggregator.container_health().await {
            Ok(records) => records,
            Err(e) => {
                if let Some(health) = &self.health {
                    health
                        .set_unhealthy(components::RUNTIME, e.to_string())
                        .await;
                }
                return Err(e.into());
            }
        };

        if let Some(health) = &self.health {
            health.set_healthy(components::RUNTIME).await;
        }
        let alerts_sent = match &self.alerter {
            Some(alerter) => alerter.process_container_health(&records).await,
            None => 0,
        };

        let unhealthy = records
            .iter()
            .filter(|r| r.health == HealthStatus::Unhealthy)
            .count();
        Ok((unhealthy, alerts_sent))
    }
}

#[async_trait]
impl Tick for MonitorPass {
    async fn run(&self) -> Result<TickSummary> {
        let results = self.tracker.track_all().await;
        let failed = results.iter().filter(|r| !r.succeeded).count();

        let mut alerts_sent = match &self.alerter {
            Some(alerter) => alerter.process_tick(&results).await,
            None => 0,
        };

        if let Some(health) = &self.health {
            if failed == 0 {
                health.set_healthy(components::SCHEDULER).await;
            } else {
                health
                    .set_degraded(
                        components::SCHEDULER,
                        format!("{} of {} targets unreachable", failed, results.len()),
                    )
                    .await;
            }
        }

        let mut unhealthy_containers = 0;
        if let Some(aggregator) = &self.containers {
            let (unhealthy, container_alerts) = self.watch_containers(aggregator).await?;
            unhealthy_containers = unhealthy;
            alerts_sent += container_alerts;
        }

        Ok(TickSummary {
            probed: results.len(),
            failed,
            alerts_sent,
            unhealthy_containers,
        })
    }
}

/// Lifecycle of a [`Scheduler`]; `Running` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Drives a [`Tick`] on a fixed interval.
///
/// Dropping the scheduler stops the loop; passes already in flight finish.
pub struct Scheduler {
    tick: Arc<dyn Tick>,
    metrics: Option<MonitorMetrics>,
    started: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(tick: Arc<dyn Tick>) -> Self {
        Self {
            tick,
            metrics: None,
            started: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> SchedulerState {
        if self.started.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Start the recurring loop on the current Tokio runtime.
    ///
    /// The first pass is triggered immediately without blocking the caller.
    /// Passes are not serialized against each other. Starting an already
    /// running scheduler is a no-op.
    pub fn start(&self, every: Duration) -> Result<()> {
        if every.is_zero() {
            anyhow::bail!("Scheduler interval must be greater than zero");
        }

        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Monitoring scheduler already running, ignoring start");
            return Ok(());
        }

        info!(
            interval_ms = every.as_millis() as u64,
            "Starting monitoring scheduler"
        );

        let tick = self.tick.clone();
        let metrics = self.metrics.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick_number = 0u64;

            loop {
                // The first tick of a Tokio interval completes immediately
                ticker.tick().await;
                tick_number += 1;
                tokio::spawn(run_isolated(tick.clone(), tick_number, metrics.clone()));
            }
        });

        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let handle = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Monitoring scheduler stopped");
        }
    }
}

/// Run one pass, containing any error or panic
async fn run_isolated(tick: Arc<dyn Tick>, tick_number: u64, metrics: Option<MonitorMetrics>) {
    let start = Instant::now();
    let outcome = AssertUnwindSafe(tick.run()).catch_unwind().await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(summary)) => {
            if let Some(m) = &metrics {
                m.inc_ticks();
            }
            info!(
                tick = tick_number,
                probed = summary.probed,
                failed = summary.failed,
                alerts_sent = summary.alerts_sent,
                unhealthy_containers = summary.unhealthy_containers,
                elapsed_ms = elapsed_ms,
                "Service response times updated"
            );
        }
        Ok(Err(e)) => {
            if let Some(m) = &metrics {
                m.inc_tick_failures();
            }
            error!(tick = tick_number, error = %e, "Monitoring pass failed");
        }
        Err(panic) => {
            if let Some(m) = &metrics {
                m.inc_tick_failures();
            }
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(tick = tick_number, panic = %message, "Monitoring pass panicked");
        }
    }
}
