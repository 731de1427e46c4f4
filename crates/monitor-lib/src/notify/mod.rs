//! Outbound notifications
//!
//! - Webhook delivery in the Discord embed format
//! - Deduplicated service-down and container-health alerts

mod alerter;
mod webhook;

pub use alerter::{AlertKind, Alerter};
pub use webhook::{
    build_payload, DeliveryOutcome, Embed, EmbedField, NotificationOptions, WebhookNotifier,
    WebhookPayload, ALERT_COLOR, DEFAULT_COLOR, DEFAULT_TITLE, HEALTH_ALERT_TITLE,
    SERVICE_DOWN_TITLE, TEST_COLOR, TEST_MESSAGE, TEST_TITLE,
};
