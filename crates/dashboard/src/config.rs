//! Dashboard configuration
//!
//! Loaded from an optional TOML file named by `HOMEOPS_CONFIG`, overridden by
//! `HOMEOPS_*` environment variables.

use anyhow::{bail, Context, Result};
use monitor_lib::models::Target;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "HOMEOPS_CONFIG";

const ENV_PREFIX: &str = "HOMEOPS";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_docker_socket")]
    pub docker_socket: String,

    #[serde(default = "default_pihole_url")]
    pub pihole_url: String,

    /// Interval between monitoring passes in milliseconds
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// Alerts are only sent when this is set
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_alert_dedup_secs")]
    pub alert_dedup_secs: u64,

    /// Alert on unhealthy containers during monitoring passes
    #[serde(default)]
    pub watch_containers: bool,

    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,
}

fn default_port() -> u16 {
    3000
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_pihole_url() -> String {
    "http://pihole:80".to_string()
}

fn default_monitor_interval_ms() -> u64 {
    60_000
}

fn default_alert_dedup_secs() -> u64 {
    15 * 60
}

fn default_targets() -> Vec<Target> {
    vec![
        Target::new("Dashboard", "http://dashboard:3000"),
        Target::new("Pi-hole", "http://pihole:80"),
        Target::new("Immich", "http://immich_server:2283"),
        Target::new("Portainer", "http://portainer:9000"),
        Target::new("Nginx", "http://nginx:80"),
    ]
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            docker_socket: default_docker_socket(),
            pihole_url: default_pihole_url(),
            monitor_interval_ms: default_monitor_interval_ms(),
            webhook_url: None,
            alert_dedup_secs: default_alert_dedup_secs(),
            watch_containers: false,
            targets: default_targets(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from the environment and optional config file
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(Path::new(path)));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitor_interval_ms == 0 {
            bail!("monitor_interval_ms must be greater than zero");
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                bail!("Target with endpoint '{}' has an empty name", target.endpoint);
            }
            let url = Url::parse(&target.endpoint)
                .with_context(|| format!("Target '{}' has an invalid endpoint", target.name))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!(
                    "Target '{}' must use http or https, got '{}'",
                    target.name,
                    url.scheme()
                );
            }
            if !seen.insert(target.name.as_str()) {
                bail!("Duplicate target name '{}'", target.name);
            }
        }

        if let Some(webhook) = &self.webhook_url {
            Url::parse(webhook).context("Invalid webhook_url")?;
        }
        Url::parse(&self.pihole_url).context("Invalid pihole_url")?;

        Ok(())
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn alert_dedup_window(&self) -> Duration {
        Duration::from_secs(self.alert_dedup_secs)
    }
}
