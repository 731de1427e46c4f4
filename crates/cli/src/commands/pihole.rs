//! DNS filter commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::dns::{DnsCheck, DnsFilterStats};
use serde_json::json;

use crate::client::ApiClient;
use crate::output::{color_status, print_error, print_json, print_success, OutputFormat};

/// Show Pi-hole statistics and DNS reachability
pub async fn show_pihole(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (stats, dns) = tokio::try_join!(
        client.get::<DnsFilterStats>("api/monitoring/pihole/stats"),
        client.get::<DnsCheck>("api/monitoring/pihole/dns"),
    )?;

    match format {
        OutputFormat::Json => print_json(&json!({ "stats": stats, "dns": dns }))?,
        OutputFormat::Table => {
            println!("{}", "Pi-hole".bold());
            println!("{}", "=".repeat(40));

            match &stats {
                DnsFilterStats::Healthy(summary) => {
                    println!("Status:          {}", color_status("healthy"));
                    println!("Queries today:   {}", summary.queries_today);
                    println!("Blocked today:   {}", summary.blocked_today);
                    println!("Percent blocked: {:.2}%", summary.percent_blocked);
                    println!("Domains on list: {}", summary.domains_blocked);
                    println!("Unique clients:  {}", summary.unique_clients);
                }
                DnsFilterStats::Unhealthy { error } => {
                    println!("Status:          {}", color_status("unhealthy"));
                    println!("Error:           {}", error.red());
                }
            }

            println!();
            if dns.dns_responding {
                print_success("Admin interface responding");
            } else {
                let reason = match (&dns.status_code, &dns.error) {
                    (_, Some(error)) => error.clone(),
                    (Some(code), None) => format!("HTTP {}", code),
                    (None, None) => "no response".to_string(),
                };
                print_error(&format!("Admin interface not responding: {}", reason));
            }
        }
    }

    Ok(())
}
