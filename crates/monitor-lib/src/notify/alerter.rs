//! Service-down alerting with deduplication
//!
//! Turns failed probe results into webhook alerts. A target that keeps
//! failing is alerted at most once per deduplication window; a successful
//! probe clears its suppression so the next outage alerts right away.

use super::WebhookNotifier;
use crate::models::{ContainerHealthRecord, HealthStatus, ProbeResult};
use crate::observability::MonitorMetrics;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default deduplication window (15 minutes)
const DEFAULT_DEDUP_WINDOW_SECS: u64 = 15 * 60;

/// Alert classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    ServiceDown,
    ContainerHealth,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::ServiceDown => write!(f, "service_down"),
            AlertKind::ContainerHealth => write!(f, "container_health"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    kind: AlertKind,
    subject: String,
}

impl DedupKey {
    fn new(kind: AlertKind, subject: &str) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
        }
    }
}

/// Alert emitter with per-subject deduplication
pub struct Alerter {
    notifier: WebhookNotifier,
    webhook_url: String,
    dedup_window: Duration,
    /// Last emission time per alert key
    recent_alerts: DashMap<DedupKey, Instant>,
    metrics: Option<MonitorMetrics>,
}

impl Alerter {
    /// Create an alerter with the default 15 minute deduplication window
    pub fn new(notifier: WebhookNotifier, webhook_url: impl Into<String>) -> Self {
        Self {
            notifier,
            webhook_url: webhook_url.into(),
            dedup_window: Duration::from_secs(DEFAULT_DEDUP_WINDOW_SECS),
            recent_alerts: DashMap::new(),
            metrics: None,
        }
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether an alert for this subject was emitted inside the window
    pub fn should_suppress(&self, kind: AlertKind, subject: &str) -> bool {
        self.recent_alerts
            .get(&DedupKey::new(kind, subject))
            .map(|last| last.elapsed() < self.dedup_window)
            .unwrap_or(false)
    }

    /// Remember that an alert was emitted and drop expired entries
    pub fn record_alert(&self, kind: AlertKind, subject: &str) {
        debug!(kind = %kind, subject = %subject, "Recording alert emission");
        self.recent_alerts
            .insert(DedupKey::new(kind, subject), Instant::now());
        self.recent_alerts
            .retain(|_, time| time.elapsed() < self.dedup_window);
    }

    /// Forget a subject so its next failure alerts immediately
    pub fn clear(&self, kind: AlertKind, subject: &str) {
        self.recent_alerts.remove(&DedupKey::new(kind, subject));
    }

    /// Alert on every failed result that isn't suppressed.
    ///
    /// Returns the number of alerts delivered. Delivery failures are logged
    /// and leave the subject unsuppressed so the next tick retries.
    pub async fn process_tick(&self, results: &[ProbeResult]) -> usize {
        let mut pending = Vec::new();

        for result in results {
            if result.succeeded {
                if self.should_suppress(AlertKind::ServiceDown, &result.name) {
                    info!(service = %result.name, "Service recovered");
                }
                self.clear(AlertKind::ServiceDown, &result.name);
            } else if !self.should_suppress(AlertKind::ServiceDown, &result.name) {
                pending.push(result);
            }
        }

        let deliveries = pending.iter().map(|result| async move {
            let outcome = self
                .notifier
                .send_service_down_alert(&self.webhook_url, &result.name, result.error.as_deref())
                .await;
            (result, outcome)
        });

        let mut sent = 0;
        for (result, outcome) in join_all(deliveries).await {
            if outcome.success {
                self.record_alert(AlertKind::ServiceDown, &result.name);
                if let Some(m) = &self.metrics {
                    m.inc_alerts_sent();
                }
                sent += 1;
            } else {
                warn!(
                    service = %result.name,
                    error = ?outcome.error,
                    "Failed to deliver service down alert"
                );
            }
        }

        sent
    }

    /// Alert on containers whose health check reports unhealthy.
    ///
    /// Same suppression rules as [`process_tick`](Self::process_tick); a
    /// container that reports healthy again clears its suppression.
    pub async fn process_container_health(&self, records: &[ContainerHealthRecord]) -> usize {
        let mut sent = 0;

        for record in records {
            match record.health {
                HealthStatus::Unhealthy => {
                    if self.should_suppress(AlertKind::ContainerHealth, &record.name) {
                        continue;
                    }
                    let outcome = self
                        .notifier
                        .send_health_alert(&self.webhook_url, &record.name, &record.health.to_string())
                        .await;
                    if outcome.success {
                        self.record_alert(AlertKind::ContainerHealth, &record.name);
                        if let Some(m) = &self.metrics {
                            m.inc_alerts_sent();
                        }
                        sent += 1;
                    } else {
                        warn!(
                            container = %record.name,
                            error = ?outcome.error,
                            "Failed to deliver container health alert"
                        );
                    }
                }
                HealthStatus::Healthy => self.clear(AlertKind::ContainerHealth, &record.name),
                HealthStatus::Starting | HealthStatus::None => {}
            }
        }

        sent
    }
}
