//! Container runtime commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::runtime::PortMapping;
use tabled::Tabled;

use crate::client::{ApiClient, ContainerList, HealthList, PortList, ResourceList};
use crate::output::{color_percent, color_status, print_json, print_rows, OutputFormat};

#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Public")]
    public_port: u16,
    #[tabled(rename = "Private")]
    private_port: u16,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Container")]
    container: String,
}

#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Restarts")]
    restarts: u64,
    #[tabled(rename = "Started")]
    started_at: String,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Mem %")]
    memory_percent: String,
}

fn format_ports(ports: &[PortMapping]) -> String {
    ports
        .iter()
        .map(|p| match p.public_port {
            Some(public) => format!("{}->{}/{}", public, p.private_port, p.protocol),
            None => format!("{}/{}", p.private_port, p.protocol),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// List all containers, including stopped ones
pub async fn list_containers(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: ContainerList = client.get("api/docker/containers").await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            let rows: Vec<ContainerRow> = list
                .containers
                .iter()
                .map(|c| ContainerRow {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    image: c.image.clone(),
                    state: color_status(&c.state),
                    status: c.status.clone(),
                    ports: format_ports(&c.ports),
                })
                .collect();
            print_rows(rows, "No containers found");
        }
    }

    Ok(())
}

/// List published host ports
pub async fn list_ports(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: PortList = client.get("api/docker/ports").await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            let rows: Vec<PortRow> = list
                .ports
                .into_iter()
                .map(|p| PortRow {
                    public_port: p.public_port,
                    private_port: p.private_port,
                    protocol: p.protocol,
                    ip: p.ip,
                    container: p.container_name,
                })
                .collect();
            print_rows(rows, "No published ports");
        }
    }

    Ok(())
}

/// Show health of running containers
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: HealthList = client.get("api/monitoring/health").await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            let unhealthy: Vec<&str> = list
                .health
                .iter()
                .filter(|h| h.health == monitor_lib::models::HealthStatus::Unhealthy)
                .map(|h| h.name.as_str())
                .collect();
            let rows: Vec<HealthRow> = list
                .health
                .iter()
                .map(|h| HealthRow {
                    name: h.name.clone(),
                    id: h.id.clone(),
                    state: color_status(&h.state),
                    health: color_status(&h.health.to_string()),
                    restarts: h.restart_count,
                    started_at: h.started_at.clone(),
                })
                .collect();
            print_rows(rows, "No running containers");

            if !unhealthy.is_empty() {
                println!("\n{} {}", "Unhealthy:".red().bold(), unhealthy.join(", "));
            }
        }
    }

    Ok(())
}

/// Show CPU and memory usage of running containers
pub async fn show_resources(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: ResourceList = client.get("api/monitoring/resources").await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = list
                .stats
                .iter()
                .map(|s| ResourceRow {
                    name: s.name.clone(),
                    cpu: color_percent(&s.cpu_percent),
                    memory: format!("{} / {} MB", s.memory_usage, s.memory_limit),
                    memory_percent: color_percent(&s.memory_percent),
                })
                .collect();
            print_rows(rows, "No resource stats available");
        }
    }

    Ok(())
}
