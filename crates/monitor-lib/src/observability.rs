//! Prometheus metrics for the monitoring core
//!
//! Metrics are registered once in the default registry and shared by every
//! [`MonitorMetrics`] handle, so `prometheus::gather()` sees them all.

use crate::models::ProbeResult;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;

/// Probe latency buckets in seconds, topping out at the probe timeout
const PROBE_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    probe_duration_seconds: Histogram,
    probe_failures: IntCounterVec,
    targets_configured: IntGauge,
    ticks: IntCounter,
    tick_failures: IntCounter,
    alerts_sent: IntCounter,
    stats_omitted: IntCounter,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            probe_duration_seconds: register_histogram!(
                "homeops_probe_duration_seconds",
                "Wall-clock time of service reachability probes",
                PROBE_BUCKETS.to_vec()
            )
            .expect("Failed to register probe_duration_seconds"),

            probe_failures: register_int_counter_vec!(
                "homeops_probe_failures_total",
                "Probes that got no HTTP response",
                &["service"]
            )
            .expect("Failed to register probe_failures_total"),

            targets_configured: register_int_gauge!(
                "homeops_targets_configured",
                "Number of configured monitoring targets"
            )
            .expect("Failed to register targets_configured"),

            ticks: register_int_counter!(
                "homeops_ticks_total",
                "Monitoring passes that completed"
            )
            .expect("Failed to register ticks_total"),

            tick_failures: register_int_counter!(
                "homeops_tick_failures_total",
                "Monitoring passes that failed or panicked"
            )
            .expect("Failed to register tick_failures_total"),

            alerts_sent: register_int_counter!(
                "homeops_alerts_sent_total",
                "Webhook alerts delivered"
            )
            .expect("Failed to register alerts_sent_total"),

            stats_omitted: register_int_counter!(
                "homeops_container_stats_omitted_total",
                "Containers left out of a resource snapshot because their stats query failed"
            )
            .expect("Failed to register container_stats_omitted_total"),
        }
    }
}

/// Cheap handle to the process-wide metrics
#[derive(Clone)]
pub struct MonitorMetrics {
    inner: &'static MetricsInner,
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MonitorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorMetrics").finish_non_exhaustive()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(MetricsInner::new),
        }
    }

    /// Record one probe outcome
    pub fn observe_probe(&self, result: &ProbeResult) {
        self.inner
            .probe_duration_seconds
            .observe(result.duration_ms as f64 / 1000.0);
        if !result.succeeded {
            self.inner
                .probe_failures
                .with_label_values(&[result.name.as_str()])
                .inc();
        }
    }

    pub fn set_targets_configured(&self, count: i64) {
        self.inner.targets_configured.set(count);
    }

    pub fn inc_ticks(&self) {
        self.inner.ticks.inc();
    }

    pub fn inc_tick_failures(&self) {
        self.inner.tick_failures.inc();
    }

    pub fn inc_alerts_sent(&self) {
        self.inner.alerts_sent.inc();
    }

    pub fn inc_stats_omitted(&self) {
        self.inner.stats_omitted.inc();
    }
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
