//! Notification commands

use anyhow::Result;
use monitor_lib::notify::DeliveryOutcome;

use crate::client::{ApiClient, NotifyTestRequest};
use crate::output::{print_error, print_info, print_json, print_success, OutputFormat};

/// Send a test notification through the dashboard
pub async fn send_test(
    client: &ApiClient,
    webhook_url: &str,
    message: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let request = NotifyTestRequest {
        webhook_url: webhook_url.to_string(),
        message,
    };

    print_info("Sending test notification...");
    let outcome: DeliveryOutcome = client
        .post("api/monitoring/notify/test", Some(&request))
        .await?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Table => {
            if outcome.success {
                print_success("Notification delivered");
            } else {
                print_error(&format!(
                    "Delivery failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }

    if !outcome.success {
        anyhow::bail!("notification was not delivered");
    }

    Ok(())
}
