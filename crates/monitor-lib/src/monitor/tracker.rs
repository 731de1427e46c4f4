//! Service tracker
//!
//! Probes every configured target concurrently and records the whole tick
//! into the rolling store once all probes have resolved.

use super::RollingStore;
use crate::models::{ProbeResult, Target};
use crate::observability::MonitorMetrics;
use crate::probe::Prober;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// Runs one probe per target per tick and feeds the store
pub struct ServiceTracker {
    targets: Arc<[Target]>,
    prober: Arc<dyn Prober>,
    store: Arc<RollingStore>,
    metrics: Option<MonitorMetrics>,
}

impl ServiceTracker {
    pub fn new(targets: Vec<Target>, prober: Arc<dyn Prober>, store: Arc<RollingStore>) -> Self {
        Self {
            targets: targets.into(),
            prober,
            store,
            metrics: None,
        }
    }

    /// Report probe latency and failures to Prometheus
    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        metrics.set_targets_configured(self.targets.len() as i64);
        self.metrics = Some(metrics);
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn store(&self) -> &Arc<RollingStore> {
        &self.store
    }

    /// Probe every target once.
    ///
    /// Results come back in configured target order regardless of which probe
    /// resolves first. Nothing is recorded until every probe has resolved, and
    /// the whole tick shares one timestamp.
    pub async fn track_all(&self) -> Vec<ProbeResult> {
        let start = Instant::now();

        let results = join_all(self.targets.iter().map(|t| self.prober.probe(t))).await;

        let now = chrono::Utc::now().timestamp_millis();
        self.store.record_batch(&results, now);

        if let Some(metrics) = &self.metrics {
            for result in &results {
                metrics.observe_probe(result);
            }
        }

        debug!(
            targets = results.len(),
            failed = results.iter().filter(|r| !r.succeeded).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tick probes resolved"
        );

        results
    }
}
