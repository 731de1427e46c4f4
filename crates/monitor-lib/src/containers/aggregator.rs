//! Per-request container snapshots built from live runtime data

use super::ports::dedupe;
use crate::error::RuntimeResult;
use crate::models::{
    CanonicalPortBinding, ContainerHealthRecord, ContainerResourceRecord, HealthStatus,
    RawPortBinding,
};
use crate::observability::MonitorMetrics;
use crate::runtime::{ContainerRuntime, ContainerStats, ContainerSummary, PortMapping};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Container row of the `/api/docker/containers` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerListing {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
    pub ports: Vec<PortMapping>,
}

impl From<ContainerSummary> for ContainerListing {
    fn from(summary: ContainerSummary) -> Self {
        Self {
            id: summary.short_id(),
            name: summary.name(),
            image: summary.image,
            state: summary.state,
            status: summary.status,
            ports: summary.ports,
        }
    }
}

/// Read-only aggregation over a [`ContainerRuntime`]
#[derive(Clone)]
pub struct HealthAggregator {
    runtime: Arc<dyn ContainerRuntime>,
    metrics: Option<MonitorMetrics>,
}

impl HealthAggregator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Every container, stopped ones included, in listing order
    pub async fn containers(&self) -> RuntimeResult<Vec<ContainerListing>> {
        let containers = self.runtime.list_containers(true).await?;
        Ok(containers.into_iter().map(ContainerListing::from).collect())
    }

    /// Health record per running container, in listing order.
    ///
    /// Inspections run one after another and the first failure fails the
    /// whole call.
    pub async fn container_health(&self) -> RuntimeResult<Vec<ContainerHealthRecord>> {
        let containers = self.runtime.list_containers(false).await?;
        let mut records = Vec::with_capacity(containers.len());

        for container in containers {
            let inspect = self.runtime.inspect(&container.id).await?;
            records.push(ContainerHealthRecord {
                name: container.name(),
                id: container.short_id(),
                state: inspect.state.status,
                health: HealthStatus::from_runtime(inspect.state.health.as_deref()),
                running: inspect.state.running,
                restart_count: inspect.restart_count,
                started_at: inspect.state.started_at,
            });
        }

        Ok(records)
    }

    /// Resource snapshot per running container.
    ///
    /// Stats are queried concurrently. A container whose query fails is left
    /// out; the others keep listing order.
    pub async fn resource_stats(&self) -> RuntimeResult<Vec<ContainerResourceRecord>> {
        let containers = self.runtime.list_containers(false).await?;

        let samples = join_all(containers.iter().map(|c| self.runtime.stats(&c.id))).await;

        let records = containers
            .iter()
            .zip(samples)
            .filter_map(|(container, sample)| match sample {
                Ok(stats) => Some(resource_record(container, &stats)),
                Err(e) => {
                    warn!(
                        container = %container.name(),
                        error = %e,
                        "Failed to get stats for container"
                    );
                    if let Some(m) = &self.metrics {
                        m.inc_stats_omitted();
                    }
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(
            listed = containers.len(),
            reported = records.len(),
            "Container resource snapshot built"
        );
        Ok(records)
    }

    /// Canonical published ports of running containers
    pub async fn port_bindings(&self) -> RuntimeResult<Vec<CanonicalPortBinding>> {
        let containers = self.runtime.list_containers(false).await?;
        let raw: Vec<RawPortBinding> = containers
            .iter()
            .flat_map(ContainerSummary::raw_bindings)
            .collect();
        Ok(dedupe(&raw))
    }
}

fn resource_record(container: &ContainerSummary, stats: &ContainerStats) -> ContainerResourceRecord {
    let usage = stats.memory_stats.usage;
    let limit = stats.memory_stats.limit;

    ContainerResourceRecord {
        name: container.name(),
        id: container.short_id(),
        cpu_percent: format!("{:.2}", cpu_percent(stats)),
        memory_usage: format!("{:.2}", usage as f64 / BYTES_PER_MB),
        memory_limit: format!("{:.2}", limit as f64 / BYTES_PER_MB),
        memory_percent: format!("{:.2}", memory_percent(usage, limit)),
    }
}

/// CPU usage over the sampling interval, scaled to the number of online CPUs.
/// Zero when either counter went backwards or stood still.
pub fn cpu_percent(stats: &ContainerStats) -> f64 {
    let cpu_delta =
        stats.cpu_stats.total_usage as i128 - stats.precpu_stats.total_usage as i128;
    let system_delta = stats.cpu_stats.system_cpu_usage as i128
        - stats.precpu_stats.system_cpu_usage as i128;

    if cpu_delta <= 0 || system_delta <= 0 {
        return 0.0;
    }

    (cpu_delta as f64 / system_delta as f64) * stats.cpu_stats.online_cpus as f64 * 100.0
}

pub fn memory_percent(usage: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    usage as f64 / limit as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::runtime::{async_trait, ContainerInspect, CpuStats, InspectState, MemoryStats};
    use std::collections::HashMap;

    /// In-memory runtime with per-container scripted failures
    #[derive(Default)]
    struct FakeRuntime {
        containers: Vec<ContainerSummary>,
        stopped: Vec<ContainerSummary>,
        inspects: HashMap<String, ContainerInspect>,
        failing_stats: Vec<String>,
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn list_containers(
            &self,
            include_stopped: bool,
        ) -> RuntimeResult<Vec<ContainerSummary>> {
            let mut all = self.containers.clone();
            if include_stopped {
                all.extend(self.stopped.clone());
            }
            Ok(all)
        }

        async fn inspect(&self, id: &str) -> RuntimeResult<ContainerInspect> {
            self.inspects
                .get(id)
                .cloned()
                .ok_or_else(|| RuntimeError::NotFound { id: id.to_string() })
        }

        async fn stats(&self, id: &str) -> RuntimeResult<ContainerStats> {
            if self.failing_stats.iter().any(|f| f == id) {
                return Err(RuntimeError::NotFound { id: id.to_string() });
            }
            Ok(sample(2_000_000, 1_000_000, 20_000_000, 10_000_000, 2))
        }
    }

    fn summary(id: &str, name: &str) -> ContainerSummary {
        ContainerSummary {
            id: format!("{id}0123456789abcdef"),
            names: vec![format!("/{name}")],
            image: format!("{name}:latest"),
            state: "running".to_string(),
            status: "Up 2 hours".to_string(),
            ports: vec![],
        }
    }

    fn sample(cpu: u64, precpu: u64, system: u64, presystem: u64, cpus: u64) -> ContainerStats {
        ContainerStats {
            cpu_stats: CpuStats {
                total_usage: cpu,
                system_cpu_usage: system,
                online_cpus: cpus,
            },
            precpu_stats: CpuStats {
                total_usage: precpu,
                system_cpu_usage: presystem,
                online_cpus: cpus,
            },
            memory_stats: MemoryStats {
                usage: 256 * 1_048_576,
                limit: 1024 * 1_048_576,
            },
        }
    }

    fn inspect(health: Option<&str>) -> ContainerInspect {
        ContainerInspect {
            state: InspectState {
                status: "running".to_string(),
                running: true,
                health: health.map(str::to_string),
                started_at: "2024-05-01T10:00:00Z".to_string(),
            },
            restart_count: 2,
        }
    }

    #[test]
    fn test_cpu_percent() {
        // 1M of 10M system ns on 2 cpus
        let stats = sample(2_000_000, 1_000_000, 20_000_000, 10_000_000, 2);
        assert!((cpu_percent(&stats) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_percent_guards() {
        // Counter reset
        assert_eq!(cpu_percent(&sample(1, 5, 20, 10, 4)), 0.0);
        // No system progress
        assert_eq!(cpu_percent(&sample(5, 1, 10, 10, 4)), 0.0);
        // Empty sample
        assert_eq!(cpu_percent(&ContainerStats::default()), 0.0);
    }

    #[test]
    fn test_memory_percent() {
        assert_eq!(memory_percent(512, 1024), 50.0);
        assert_eq!(memory_percent(512, 0), 0.0);
    }

    #[test]
    fn test_resource_record_formatting() {
        let record = resource_record(
            &summary("aaa", "pihole"),
            &sample(2_000_000, 1_000_000, 20_000_000, 10_000_000, 2),
        );

        assert_eq!(record.name, "pihole");
        assert_eq!(record.id.len(), 12);
        assert_eq!(record.cpu_percent, "20.00");
        assert_eq!(record.memory_usage, "256.00");
        assert_eq!(record.memory_limit, "1024.00");
        assert_eq!(record.memory_percent, "25.00");
    }

    #[tokio::test]
    async fn test_resource_stats_omits_failed_container() {
        let one = summary("one", "nginx");
        let two = summary("two", "immich");
        let three = summary("three", "pihole");
        let runtime = FakeRuntime {
            failing_stats: vec![two.id.clone()],
            containers: vec![one, two, three],
            ..Default::default()
        };

        let stats = HealthAggregator::new(Arc::new(runtime))
            .resource_stats()
            .await
            .unwrap();

        let names: Vec<_> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["nginx", "pihole"]);
    }

    #[tokio::test]
    async fn test_container_health_defaults_to_none() {
        let a = summary("aaa", "pihole");
        let b = summary("bbb", "nginx");
        let mut inspects = HashMap::new();
        inspects.insert(a.id.clone(), inspect(Some("healthy")));
        inspects.insert(b.id.clone(), inspect(None));

        let runtime = FakeRuntime {
            containers: vec![a, b],
            inspects,
            ..Default::default()
        };

        let health = HealthAggregator::new(Arc::new(runtime))
            .container_health()
            .await
            .unwrap();

        assert_eq!(health.len(), 2);
        assert_eq!(health[0].name, "pihole");
        assert_eq!(health[0].health, HealthStatus::Healthy);
        assert_eq!(health[0].id, "aaa012345678");
        assert_eq!(health[0].restart_count, 2);
        assert_eq!(health[1].health, HealthStatus::None);
        assert_eq!(
            serde_json::to_value(&health[1]).unwrap()["health"],
            "none"
        );
    }

    #[tokio::test]
    async fn test_container_health_fails_wholesale() {
        let a = summary("aaa", "pihole");
        let b = summary("bbb", "gone");
        let mut inspects = HashMap::new();
        inspects.insert(a.id.clone(), inspect(Some("healthy")));

        let runtime = FakeRuntime {
            containers: vec![a, b],
            inspects,
            ..Default::default()
        };

        let err = HealthAggregator::new(Arc::new(runtime))
            .container_health()
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_containers_include_stopped() {
        let mut stopped = summary("ccc", "backup");
        stopped.state = "exited".to_string();
        let runtime = FakeRuntime {
            containers: vec![summary("aaa", "pihole")],
            stopped: vec![stopped],
            ..Default::default()
        };

        let listing = HealthAggregator::new(Arc::new(runtime))
            .containers()
            .await
            .unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].name, "backup");
        assert_eq!(listing[1].state, "exited");
    }

    #[tokio::test]
    async fn test_port_bindings_dedupes_running_containers() {
        let mut nginx = summary("aaa", "nginx");
        nginx.ports = vec![
            PortMapping {
                ip: Some("::".to_string()),
                private_port: 80,
                public_port: Some(8080),
                protocol: "tcp".to_string(),
            },
            PortMapping {
                ip: Some("0.0.0.0".to_string()),
                private_port: 80,
                public_port: Some(8080),
                protocol: "tcp".to_string(),
            },
            PortMapping {
                ip: None,
                private_port: 443,
                public_port: None,
                protocol: "tcp".to_string(),
            },
        ];
        let runtime = FakeRuntime {
            containers: vec![nginx],
            ..Default::default()
        };

        let ports = HealthAggregator::new(Arc::new(runtime))
            .port_bindings()
            .await
            .unwrap();

        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].container_name, "nginx");
        assert_eq!(ports[0].container_id, "aaa012345678");
        assert_eq!(ports[0].ip, "0.0.0.0");
    }
}
