//! Container runtime inspection
//!
//! The monitoring core only sees the runtime through [`ContainerRuntime`],
//! which returns plain records shaped after the Docker Engine API. The
//! production implementation talks to the Docker socket via bollard.

mod docker;

pub use docker::DockerRuntime;

use crate::error::RuntimeResult;
use crate::models::{display_name, short_id, RawPortBinding};
use serde::{Deserialize, Serialize};

pub use async_trait::async_trait;

/// Container as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    pub status: String,
    pub ports: Vec<PortMapping>,
}

impl ContainerSummary {
    pub fn name(&self) -> String {
        display_name(&self.names)
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }

    /// Flatten this container's ports into owner-tagged bindings
    pub fn raw_bindings(&self) -> impl Iterator<Item = RawPortBinding> + '_ {
        let name = self.name();
        let id = self.short_id();
        self.ports.iter().map(move |port| RawPortBinding {
            container_id: id.clone(),
            container_name: name.clone(),
            private_port: port.private_port,
            public_port: port.public_port,
            protocol: port.protocol.clone(),
            ip: port.ip.clone(),
        })
    }
}

/// Port entry in the Docker listing format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    #[serde(rename = "IP", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,
    #[serde(rename = "PublicPort", skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
    #[serde(rename = "Type")]
    pub protocol: String,
}

/// Subset of an inspect response consumed by the health aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInspect {
    pub state: InspectState,
    pub restart_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectState {
    pub status: String,
    pub running: bool,
    pub health: Option<String>,
    pub started_at: String,
}

/// One-shot resource statistics sample
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    pub cpu_stats: CpuStats,
    pub precpu_stats: CpuStats,
    pub memory_stats: MemoryStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Cumulative container CPU time, nanoseconds
    pub total_usage: u64,
    /// Cumulative host CPU time, nanoseconds
    pub system_cpu_usage: u64,
    pub online_cpus: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Bytes
    pub usage: u64,
    /// Bytes
    pub limit: u64,
}

/// Read-only access to a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers, optionally including stopped ones
    async fn list_containers(&self, include_stopped: bool) -> RuntimeResult<Vec<ContainerSummary>>;

    /// Inspect a single container
    async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInspect>;

    /// Take a single resource statistics sample
    async fn stats(&self, id: &str) -> RuntimeResult<ContainerStats>;
}
