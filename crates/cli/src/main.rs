//! Home Ops CLI
//!
//! Queries the dashboard API for service reachability, container state
//! and DNS filter statistics.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{containers, notify, pihole, services};

/// Home Ops CLI
#[derive(Parser)]
#[command(name = "homeops")]
#[command(author, version, about = "CLI for the Home Ops Dashboard", long_about = None)]
pub struct Cli {
    /// Dashboard URL (falls back to ~/.config/homeops/config.json, then http://localhost:3000)
    #[arg(long, env = "HOMEOPS_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest result for each monitored service
    Services,

    /// Show retained response-time history for one service
    History {
        /// Service name as configured on the dashboard
        name: String,
    },

    /// Probe every service now
    Check,

    /// List containers, including stopped ones
    Containers,

    /// List published host ports
    Ports,

    /// Show health of running containers
    Health,

    /// Show CPU and memory usage of running containers
    Resources,

    /// Show Pi-hole statistics and DNS reachability
    Pihole,

    /// Send a test notification to a webhook
    Notify {
        /// Webhook URL to deliver to
        webhook_url: String,

        /// Message body (defaults to the dashboard's test message)
        #[arg(long, short)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let client = client::ApiClient::new(&api_url)?;

    let result = match cli.command {
        Commands::Services => services::list_services(&client, cli.format).await,
        Commands::History { name } => services::show_history(&client, &name, cli.format).await,
        Commands::Check => services::check_now(&client, cli.format).await,
        Commands::Containers => containers::list_containers(&client, cli.format).await,
        Commands::Ports => containers::list_ports(&client, cli.format).await,
        Commands::Health => containers::show_health(&client, cli.format).await,
        Commands::Resources => containers::show_resources(&client, cli.format).await,
        Commands::Pihole => pihole::show_pihole(&client, cli.format).await,
        Commands::Notify {
            webhook_url,
            message,
        } => notify::send_test(&client, &webhook_url, message, cli.format).await,
    };

    if let Err(e) = &result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
