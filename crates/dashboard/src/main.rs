//! Home Ops dashboard server
//!
//! Serves the monitoring API and runs the background service monitor.

use anyhow::Result;
use dashboard::{api, config::DashboardConfig};
use monitor_lib::{
    containers::HealthAggregator,
    dns::PiholeClient,
    health::{components, HealthRegistry},
    monitor::{MonitorPass, RollingStore, Scheduler, ServiceTracker},
    notify::{Alerter, WebhookNotifier},
    observability::MonitorMetrics,
    probe::HttpProber,
    runtime::DockerRuntime,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DASHBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = DASHBOARD_VERSION, "Starting homeops-dashboard");

    let config = DashboardConfig::load()?;
    info!(
        port = config.port,
        targets = config.targets.len(),
        interval_ms = config.monitor_interval_ms,
        alerts = config.webhook_url.is_some(),
        "Dashboard configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SCHEDULER).await;
    health_registry.register(components::RUNTIME).await;
    health_registry.register(components::DNS_FILTER).await;

    let metrics = MonitorMetrics::new();

    let runtime = Arc::new(DockerRuntime::connect(&config.docker_socket)?);
    let containers = HealthAggregator::new(runtime).with_metrics(metrics.clone());

    let store = Arc::new(RollingStore::new());
    let tracker = Arc::new(
        ServiceTracker::new(
            config.targets.clone(),
            Arc::new(HttpProber::new()?),
            store.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    let notifier = WebhookNotifier::new()?;

    let mut pass = MonitorPass::new(tracker.clone()).with_health(health_registry.clone());
    if let Some(webhook_url) = &config.webhook_url {
        let alerter = Alerter::new(notifier.clone(), webhook_url.clone())
            .with_dedup_window(config.alert_dedup_window())
            .with_metrics(metrics.clone());
        pass = pass.with_alerter(Arc::new(alerter));
    }
    if config.watch_containers {
        pass = pass.with_container_watch(containers.clone());
    }

    let scheduler = Scheduler::new(Arc::new(pass)).with_metrics(metrics);
    scheduler.start(config.monitor_interval())?;

    let app_state = Arc::new(api::AppState {
        store,
        tracker,
        containers,
        pihole: PiholeClient::new(&config.pihole_url)?,
        notifier,
        health_registry: health_registry.clone(),
    });

    health_registry.set_ready(true).await;

    api::serve(config.port, app_state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
