//! Discord-compatible webhook delivery
//!
//! Delivery never raises: every outcome, including transport errors and
//! non-2xx responses, comes back as a [`DeliveryOutcome`].

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default embed color (soft red)
pub const DEFAULT_COLOR: u32 = 0xff6b6b;

/// Color used for alerts
pub const ALERT_COLOR: u32 = 0xff0000;

/// Color used for test notifications
pub const TEST_COLOR: u32 = 0x4caf50;

pub const DEFAULT_TITLE: &str = "🏠 Home Server Alert";
pub const TEST_TITLE: &str = "🧪 Test Notification";
pub const TEST_MESSAGE: &str = "Test notification from Home Ops Dashboard";
pub const HEALTH_ALERT_TITLE: &str = "⚠️ Container Health Alert";
pub const SERVICE_DOWN_TITLE: &str = "🚨 Service Down Alert";

/// Webhook request timeout
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: Some(inline),
        }
    }
}

/// Optional overrides for a notification
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    pub content: Option<String>,
    pub title: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
}

/// Result of a delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Build the payload for a notification
pub fn build_payload(message: &str, options: NotificationOptions) -> WebhookPayload {
    WebhookPayload {
        content: options.content,
        embeds: vec![Embed {
            title: options.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: message.to_string(),
            color: options.color.unwrap_or(DEFAULT_COLOR),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fields: options.fields,
        }],
    }
}

/// Fire-and-forget webhook client
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .context("Failed to create webhook HTTP client")?;

        Ok(Self { client })
    }

    /// POST a notification to `webhook_url`
    pub async fn send(
        &self,
        webhook_url: &str,
        message: &str,
        options: NotificationOptions,
    ) -> DeliveryOutcome {
        let payload = build_payload(message, options);

        let response = match self.client.post(webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Error sending webhook notification");
                return DeliveryOutcome::failed(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Webhook endpoint rejected notification");
            return DeliveryOutcome::failed(format!(
                "Webhook API returned {}",
                status.as_u16()
            ));
        }

        debug!(status = status.as_u16(), "Webhook notification delivered");
        DeliveryOutcome::delivered()
    }

    /// Notify that a container changed health state
    pub async fn send_health_alert(
        &self,
        webhook_url: &str,
        container_name: &str,
        status: &str,
    ) -> DeliveryOutcome {
        let message = format!("Container **{}** is {}", container_name, status);
        let options = NotificationOptions {
            title: Some(HEALTH_ALERT_TITLE.to_string()),
            color: Some(ALERT_COLOR),
            fields: vec![
                EmbedField::new("Container", container_name, true),
                EmbedField::new("Status", status, true),
            ],
            ..Default::default()
        };
        self.send(webhook_url, &message, options).await
    }

    /// Notify that a monitored service stopped responding
    pub async fn send_service_down_alert(
        &self,
        webhook_url: &str,
        service_name: &str,
        error: Option<&str>,
    ) -> DeliveryOutcome {
        let message = format!("Service **{}** is not responding", service_name);
        let options = NotificationOptions {
            title: Some(SERVICE_DOWN_TITLE.to_string()),
            color: Some(ALERT_COLOR),
            fields: vec![
                EmbedField::new("Service", service_name, true),
                EmbedField::new("Error", error.unwrap_or("Unknown"), false),
            ],
            ..Default::default()
        };
        self.send(webhook_url, &message, options).await
    }

    /// Send the dashboard's test notification
    pub async fn send_test(&self, webhook_url: &str, message: Option<&str>) -> DeliveryOutcome {
        let options = NotificationOptions {
            title: Some(TEST_TITLE.to_string()),
            color: Some(TEST_COLOR),
            ..Default::default()
        };
        self.send(webhook_url, message.unwrap_or(TEST_MESSAGE), options)
            .await
    }
}
