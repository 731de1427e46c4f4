//! Service reachability commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::models::ProbeResult;
use tabled::Tabled;

use crate::client::{ApiClient, CheckResults, ResponseTimeHistory, ResponseTimes};
use crate::output::{
    color_duration, color_status, format_timestamp, print_json, print_rows, print_warning,
    OutputFormat,
};

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Response")]
    duration: String,
    #[tabled(rename = "Detail")]
    detail: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

impl ServiceRow {
    fn from_result(result: &ProbeResult, checked: String) -> Self {
        let (state, detail) = if result.succeeded {
            (
                "up",
                result.status.map(|s| s.to_string()).unwrap_or_default(),
            )
        } else {
            ("down", result.error.clone().unwrap_or_default())
        };

        Self {
            name: result.name.clone(),
            url: result.endpoint.clone(),
            state: color_status(state),
            duration: color_duration(result.duration_ms),
            detail,
            checked,
        }
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Response")]
    duration: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Show the latest result per service
pub async fn list_services(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let latest: ResponseTimes = client.get("api/monitoring/response-times").await?;

    match format {
        OutputFormat::Json => print_json(&latest)?,
        OutputFormat::Table => {
            let down = latest
                .response_times
                .iter()
                .filter(|r| !r.result.succeeded)
                .count();
            let rows: Vec<ServiceRow> = latest
                .response_times
                .iter()
                .map(|r| ServiceRow::from_result(&r.result, format_timestamp(r.timestamp)))
                .collect();

            print_rows(rows, "No results yet; the monitor has not completed a pass");
            if down > 0 {
                println!("\n{} service(s) down", down.to_string().red().bold());
            }
        }
    }

    Ok(())
}

/// Show the retained history of one service
pub async fn show_history(client: &ApiClient, name: &str, format: OutputFormat) -> Result<()> {
    let mut all: ResponseTimeHistory = client.get("api/monitoring/response-times/history").await?;
    let entries = all.history.remove(name).unwrap_or_default();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning(&format!("No history for service '{}'", name));
                if !all.history.is_empty() {
                    let known: Vec<&str> = all.history.keys().map(String::as_str).collect();
                    println!("Known services: {}", known.join(", "));
                }
                return Ok(());
            }

            println!("{} {}", "History for".bold(), name.cyan());
            let rows: Vec<HistoryRow> = entries
                .iter()
                .map(|entry| {
                    let row = ServiceRow::from_result(&entry.result, String::new());
                    HistoryRow {
                        timestamp: format_timestamp(entry.timestamp),
                        state: row.state,
                        duration: row.duration,
                        detail: row.detail,
                    }
                })
                .collect();
            let count = rows.len();
            print_rows(rows, "");
            println!("\nTotal: {} samples", count);
        }
    }

    Ok(())
}

/// Ask the dashboard to probe every service now
pub async fn check_now(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let results: CheckResults = client
        .post::<_, ()>("api/monitoring/check-services", None)
        .await?;

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => {
            let rows: Vec<ServiceRow> = results
                .results
                .iter()
                .map(|r| ServiceRow::from_result(r, "now".to_string()))
                .collect();
            print_rows(rows, "No services configured");
        }
    }

    Ok(())
}
