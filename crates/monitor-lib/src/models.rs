//! Core data models for the monitoring core

use serde::{Deserialize, Serialize};

/// Length of the abbreviated container id shown to users
pub const SHORT_ID_LEN: usize = 12;

/// IPv4 wildcard bind address
pub const WILDCARD_V4: &str = "0.0.0.0";

/// IPv6 wildcard bind address
pub const WILDCARD_V6: &str = "::";

/// A named endpoint polled for reachability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(alias = "url")]
    pub endpoint: String,
}

impl Target {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Outcome of a single probe.
///
/// `status` is present iff `succeeded`, `error` iff not. Use the
/// constructors to keep that pairing intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    #[serde(rename = "url")]
    pub endpoint: String,
    /// Elapsed wall-clock time in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(rename = "success")]
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    /// A probe that got a transport-level HTTP response
    pub fn success(target: &Target, duration_ms: u64, status: u16) -> Self {
        Self {
            name: target.name.clone(),
            endpoint: target.endpoint.clone(),
            duration_ms,
            succeeded: true,
            status: Some(status),
            error: None,
        }
    }

    /// A probe that never got a response
    pub fn failure(target: &Target, duration_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            name: target.name.clone(),
            endpoint: target.endpoint.clone(),
            duration_ms,
            succeeded: false,
            status: None,
            error: Some(reason.into()),
        }
    }
}

/// A probe result stamped by the store on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedResult {
    /// Insertion time, epoch milliseconds
    pub timestamp: i64,
    #[serde(flatten)]
    pub result: ProbeResult,
}

/// A single container port as reported by the runtime, tagged with its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPortBinding {
    pub container_id: String,
    pub container_name: String,
    pub private_port: u16,
    pub public_port: Option<u16>,
    pub protocol: String,
    pub ip: Option<String>,
}

/// One published port after deduplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPortBinding {
    pub container_name: String,
    pub container_id: String,
    pub private_port: u16,
    pub public_port: u16,
    pub protocol: String,
    pub ip: String,
}

impl From<CanonicalPortBinding> for RawPortBinding {
    fn from(binding: CanonicalPortBinding) -> Self {
        Self {
            container_id: binding.container_id,
            container_name: binding.container_name,
            private_port: binding.private_port,
            public_port: Some(binding.public_port),
            protocol: binding.protocol,
            ip: Some(binding.ip),
        }
    }
}

/// Health check status reported for a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
    /// The container declares no health check
    None,
}

impl HealthStatus {
    /// Parse the runtime's health string, falling back to `None`
    pub fn from_runtime(status: Option<&str>) -> Self {
        match status.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("starting") => HealthStatus::Starting,
            Some("healthy") => HealthStatus::Healthy,
            Some("unhealthy") => HealthStatus::Unhealthy,
            _ => HealthStatus::None,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Starting => write!(f, "starting"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::None => write!(f, "none"),
        }
    }
}

/// Lifecycle and health snapshot of one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerHealthRecord {
    pub name: String,
    pub id: String,
    pub state: String,
    pub health: HealthStatus,
    pub running: bool,
    pub restart_count: u64,
    pub started_at: String,
}

/// CPU and memory snapshot of one container, pre-rendered to two decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResourceRecord {
    pub name: String,
    pub id: String,
    pub cpu_percent: String,
    /// Megabytes
    pub memory_usage: String,
    /// Megabytes
    pub memory_limit: String,
    pub memory_percent: String,
}

/// Truncate a runtime id to its short form
pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Display name of a container: its first runtime name without the leading slash
pub fn display_name(names: &[String]) -> String {
    names
        .first()
        .map(|n| n.strip_prefix('/').unwrap_or(n).to_string())
        .unwrap_or_default()
}
