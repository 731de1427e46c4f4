//! Pi-hole DNS filter client
//!
//! Both calls report failures in their return value; the dashboard shows an
//! unreachable filter as unhealthy rather than erroring.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Timeout for the admin page reachability check
pub const DNS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const SUMMARY_TIMEOUT: Duration = Duration::from_secs(10);

/// Filter counters as reported by the summary endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsSummary {
    pub queries_today: u64,
    pub blocked_today: u64,
    pub percent_blocked: f64,
    pub domains_blocked: u64,
    pub unique_clients: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DnsFilterStats {
    Healthy(DnsSummary),
    Unhealthy { error: String },
}

/// Result of the admin page reachability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsCheck {
    pub dns_responding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct PiholeClient {
    client: Client,
    base_url: Url,
}

impl PiholeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid Pi-hole URL: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(SUMMARY_TIMEOUT)
            .build()
            .context("Failed to create Pi-hole HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch today's filter counters
    pub async fn summary(&self) -> DnsFilterStats {
        match self.fetch_summary().await {
            Ok(summary) => DnsFilterStats::Healthy(summary),
            Err(e) => {
                warn!(error = %e, "Error fetching Pi-hole stats");
                DnsFilterStats::Unhealthy {
                    error: format!("{e:#}"),
                }
            }
        }
    }

    async fn fetch_summary(&self) -> Result<DnsSummary> {
        let mut url = self.base_url.join("admin/api.php")?;
        url.set_query(Some("summary"));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Pi-hole API returned {}", status.as_u16());
        }

        let body: Value = response
            .json()
            .await
            .context("Pi-hole API returned invalid JSON")?;

        Ok(DnsSummary {
            queries_today: count(&body, "dns_queries_today"),
            blocked_today: count(&body, "ads_blocked_today"),
            percent_blocked: number(&body, "ads_percentage_today"),
            domains_blocked: count(&body, "domains_being_blocked"),
            unique_clients: count(&body, "unique_clients"),
        })
    }

    /// Check that the admin page answers with a 2xx
    pub async fn check_dns(&self) -> DnsCheck {
        let url = match self.base_url.join("admin/") {
            Ok(url) => url,
            Err(e) => {
                return DnsCheck {
                    dns_responding: false,
                    status_code: None,
                    error: Some(e.to_string()),
                }
            }
        };

        match self.client.head(url).timeout(DNS_CHECK_TIMEOUT).send().await {
            Ok(response) => DnsCheck {
                dns_responding: response.status().is_success(),
                status_code: Some(response.status().as_u16()),
                error: None,
            },
            Err(e) => DnsCheck {
                dns_responding: false,
                status_code: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Read a numeric field that older Pi-hole versions send as a formatted
/// string ("1,234"). Absent or unparsable values read as zero.
fn number(body: &Value, field: &str) -> f64 {
    match body.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.replace(',', "").trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn count(body: &Value, field: &str) -> u64 {
    let value = number(body, field);
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_summary_healthy() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/api.php?summary")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "dns_queries_today": 12000,
                    "ads_blocked_today": "1,500",
                    "ads_percentage_today": 12.5,
                    "domains_being_blocked": 95000,
                    "unique_clients": 7
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = PiholeClient::new(&server.url()).unwrap();
        let stats = client.summary().await;

        mock.assert_async().await;
        assert_eq!(
            stats,
            DnsFilterStats::Healthy(DnsSummary {
                queries_today: 12000,
                blocked_today: 1500,
                percent_blocked: 12.5,
                domains_blocked: 95000,
                unique_clients: 7,
            })
        );

        let body = serde_json::to_value(&stats).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["queries_today"], 12000);
    }

    #[tokio::test]
    async fn test_summary_missing_fields_default_to_zero() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/api.php?summary")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = PiholeClient::new(&server.url()).unwrap();
        assert_eq!(
            client.summary().await,
            DnsFilterStats::Healthy(DnsSummary::default())
        );
    }

    #[tokio::test]
    async fn test_summary_error_status_is_unhealthy() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/api.php?summary")
            .with_status(503)
            .create_async()
            .await;

        let client = PiholeClient::new(&server.url()).unwrap();
        match client.summary().await {
            DnsFilterStats::Unhealthy { error } => assert!(error.contains("503")),
            other => panic!("unexpected stats: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_dns() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/admin/")
            .with_status(200)
            .create_async()
            .await;

        let client = PiholeClient::new(&server.url()).unwrap();
        let check = client.check_dns().await;

        assert!(check.dns_responding);
        assert_eq!(check.status_code, Some(200));
        assert!(check.error.is_none());
    }

    #[tokio::test]
    async fn test_check_dns_unreachable() {
        let client = PiholeClient::new("http://127.0.0.1:1").unwrap();
        let check = client.check_dns().await;

        assert!(!check.dns_responding);
        assert!(check.status_code.is_none());
        assert!(check.error.is_some());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = PiholeClient::new("http://pihole:80/sub").unwrap();
        assert_eq!(client.base_url().as_str(), "http://pihole/sub/");
    }
}
