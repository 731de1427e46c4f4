//! Output formatting utilities

use chrono::{Local, TimeZone};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print table rows, or a notice when there are none
pub fn print_rows<R: Tabled>(rows: Vec<R>, empty_message: &str) {
    if rows.is_empty() {
        print_warning(empty_message);
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an epoch-millisecond timestamp in local time
pub fn format_timestamp(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Format a duration in milliseconds
pub fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

/// Color a response time by how slow it is
pub fn color_duration(ms: u64) -> String {
    let formatted = format_duration(ms);
    if ms < 200 {
        formatted.green().to_string()
    } else if ms < 1000 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" | "up" => status.green().to_string(),
        "starting" | "degraded" | "restarting" | "paused" => status.yellow().to_string(),
        "unhealthy" | "exited" | "dead" | "down" => status.red().to_string(),
        "none" | "created" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

/// Color a percentage string by load
pub fn color_percent(percent: &str) -> String {
    let value: f64 = percent.parse().unwrap_or(0.0);
    let formatted = format!("{}%", percent);
    if value >= 90.0 {
        formatted.red().to_string()
    } else if value >= 70.0 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
