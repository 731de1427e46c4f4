//! Docker Engine implementation of [`ContainerRuntime`]

use super::{
    async_trait, ContainerInspect, ContainerRuntime, ContainerStats, ContainerSummary, CpuStats,
    InspectState, MemoryStats, PortMapping,
};
use crate::error::{RuntimeError, RuntimeResult};
use bollard::container::{InspectContainerOptions, ListContainersOptions, Stats, StatsOptions};
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerInspectResponse, Port};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;
use tracing::{debug, info};

/// Socket request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Container runtime backed by the local Docker daemon
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the Docker daemon over a unix socket
    pub fn connect(socket_path: &str) -> RuntimeResult<Self> {
        let docker =
            Docker::connect_with_socket(socket_path, DEFAULT_TIMEOUT_SECS, API_DEFAULT_VERSION)
                .map_err(|e| RuntimeError::Connection {
                    message: e.to_string(),
                })?;

        info!(socket = %socket_path, "Connected to Docker daemon");
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self, include_stopped: bool) -> RuntimeResult<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all: include_stopped,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| map_error(e, None))?;

        containers
            .into_iter()
            .map(|c| {
                Ok(ContainerSummary {
                    id: c.id.ok_or(RuntimeError::MissingField { field: "Id" })?,
                    names: c.names.unwrap_or_default(),
                    image: c.image.unwrap_or_default(),
                    state: c.state.unwrap_or_default(),
                    status: c.status.unwrap_or_default(),
                    ports: c
                        .ports
                        .unwrap_or_default()
                        .into_iter()
                        .map(convert_port)
                        .collect(),
                })
            })
            .collect()
    }

    async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInspect> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_error(e, Some(id)))?;

        convert_inspect(response)
    }

    async fn stats(&self, id: &str) -> RuntimeResult<ContainerStats> {
        // one_shot=false makes the daemon wait for a second sample so precpu_stats is populated
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };

        let sample = self
            .docker
            .stats(id, Some(options))
            .next()
            .await
            .ok_or_else(|| RuntimeError::EmptyStats { id: id.to_string() })?
            .map_err(|e| map_error(e, Some(id)))?;

        debug!(container_id = %id, "Received stats sample");
        Ok(convert_stats(sample))
    }
}

fn convert_port(port: Port) -> PortMapping {
    PortMapping {
        ip: port.ip.filter(|ip| !ip.is_empty()),
        private_port: port.private_port,
        public_port: port.public_port,
        protocol: port.typ.map(|t| t.to_string()).unwrap_or_default(),
    }
}

fn convert_inspect(response: ContainerInspectResponse) -> RuntimeResult<ContainerInspect> {
    let state = response
        .state
        .ok_or(RuntimeError::MissingField { field: "State" })?;

    Ok(ContainerInspect {
        state: InspectState {
            status: state.status.map(|s| s.to_string()).unwrap_or_default(),
            running: state.running.unwrap_or(false),
            health: state
                .health
                .and_then(|h| h.status)
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty()),
            started_at: state.started_at.unwrap_or_default(),
        },
        restart_count: response.restart_count.unwrap_or(0).max(0) as u64,
    })
}

fn convert_stats(sample: Stats) -> ContainerStats {
    let cpu = |stats: &bollard::container::CPUStats| CpuStats {
        total_usage: stats.cpu_usage.total_usage,
        system_cpu_usage: stats.system_cpu_usage.unwrap_or(0),
        // Older daemons omit online_cpus; fall back to the per-cpu breakdown
        online_cpus: stats.online_cpus.unwrap_or_else(|| {
            stats
                .cpu_usage
                .percpu_usage
                .as_ref()
                .map(|p| p.len() as u64)
                .unwrap_or(1)
        }),
    };

    ContainerStats {
        cpu_stats: cpu(&sample.cpu_stats),
        precpu_stats: cpu(&sample.precpu_stats),
        memory_stats: MemoryStats {
            usage: sample.memory_stats.usage.unwrap_or(0),
            limit: sample.memory_stats.limit.unwrap_or(0),
        },
    }
}

fn map_error(err: BollardError, id: Option<&str>) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => match id {
            Some(id) => RuntimeError::NotFound { id: id.to_string() },
            None => RuntimeError::Api { message },
        },
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::Api { message },
        other => RuntimeError::Connection {
            message: other.to_string(),
        },
    }
}
