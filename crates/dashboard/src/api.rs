//! HTTP API for the dashboard: monitoring data, Docker views, health checks
//! and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{
    containers::HealthAggregator,
    dns::{DnsFilterStats, PiholeClient},
    health::{components, ComponentStatus, HealthRegistry},
    monitor::{RollingStore, ServiceTracker},
    notify::WebhookNotifier,
    observability,
    RuntimeError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RollingStore>,
    pub tracker: Arc<ServiceTracker>,
    pub containers: HealthAggregator,
    pub pihole: PiholeClient,
    pub notifier: WebhookNotifier,
    pub health_registry: HealthRegistry,
}

/// Error body returned by every failing handler
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input (400)
    BadRequest(String),
    /// Internal server error (500)
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl AppState {
    /// Record the outcome of a runtime call in the health registry
    async fn observe_runtime<T>(
        &self,
        route: &str,
        result: Result<T, RuntimeError>,
    ) -> ApiResult<T> {
        match result {
            Ok(value) => {
                self.health_registry.set_healthy(components::RUNTIME).await;
                Ok(value)
            }
            Err(e) => {
                error!(route = %route, error = %e, "Container runtime request failed");
                self.health_registry
                    .set_unhealthy(components::RUNTIME, e.to_string())
                    .await;
                Err(e.into())
            }
        }
    }
}

async fn api_health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}

async fn docker_containers(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let result = state.containers.containers().await;
    let containers = state.observe_runtime("/api/docker/containers", result).await?;
    Ok(Json(json!({ "containers": containers })))
}

async fn docker_ports(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let result = state.containers.port_bindings().await;
    let ports = state.observe_runtime("/api/docker/ports", result).await?;
    Ok(Json(json!({ "ports": ports })))
}

async fn container_health(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let result = state.containers.container_health().await;
    let health = state.observe_runtime("/api/monitoring/health", result).await?;
    Ok(Json(json!({ "health": health })))
}

async fn container_resources(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let result = state.containers.resource_stats().await;
    let stats = state
        .observe_runtime("/api/monitoring/resources", result)
        .await?;
    Ok(Json(json!({ "stats": stats })))
}

async fn pihole_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.pihole.summary().await;
    match &stats {
        DnsFilterStats::Healthy(_) => {
            state
                .health_registry
                .set_healthy(components::DNS_FILTER)
                .await
        }
        DnsFilterStats::Unhealthy { error } => {
            state
                .health_registry
                .set_degraded(components::DNS_FILTER, error.clone())
                .await
        }
    }
    Json(stats)
}

async fn pihole_dns(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pihole.check_dns().await)
}

async fn response_times(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "response_times": state.store.latest() }))
}

async fn response_time_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "history": state.store.history() }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyTestRequest {
    pub webhook_url: Option<String>,
    pub message: Option<String>,
}

async fn notify_test(
    State(state): State<Arc<AppState>>,
    body: Option<Json<NotifyTestRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = body.map(|Json(b)| b);
    let webhook_url = request
        .as_ref()
        .and_then(|r| r.webhook_url.as_deref())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("webhookUrl is required".to_string()))?;
    let message = request
        .as_ref()
        .and_then(|r| r.message.as_deref())
        .filter(|m| !m.is_empty());

    Ok(Json(state.notifier.send_test(webhook_url, message).await))
}

async fn check_services(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Manual service check requested");
    let results = state.tracker.track_all().await;
    Json(json!({ "results": results }))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> ApiResult<impl IntoResponse> {
    let body = observability::render().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/docker/containers", get(docker_containers))
        .route("/api/docker/ports", get(docker_ports))
        .route("/api/monitoring/health", get(container_health))
        .route("/api/monitoring/resources", get(container_resources))
        .route("/api/monitoring/pihole/stats", get(pihole_stats))
        .route("/api/monitoring/pihole/dns", get(pihole_dns))
        .route("/api/monitoring/response-times", get(response_times))
        .route(
            "/api/monitoring/response-times/history",
            get(response_time_history),
        )
        .route("/api/monitoring/notify/test", post(notify_test))
        .route("/api/monitoring/check-services", post(check_services))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
