//! API client for communicating with the Home Ops dashboard

use anyhow::{Context, Result};
use monitor_lib::containers::ContainerListing;
use monitor_lib::models::{
    CanonicalPortBinding, ContainerHealthRecord, ContainerResourceRecord, ProbeResult,
    TimestampedResult,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// API client for the dashboard
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        decode(response).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.context("Failed to send request")?;

        decode(response).await
    }
}

/// Turn a response into `T`, surfacing the dashboard's `{"error"}` body on failure
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        anyhow::bail!("API error ({}): {}", status, message);
    }

    response.json().await.context("Failed to parse response")
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTimes {
    pub response_times: Vec<TimestampedResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTimeHistory {
    pub history: BTreeMap<String, Vec<TimestampedResult>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResults {
    pub results: Vec<ProbeResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerList {
    pub containers: Vec<ContainerListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortList {
    pub ports: Vec<CanonicalPortBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthList {
    pub health: Vec<ContainerHealthRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList {
    pub stats: Vec<ContainerResourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyTestRequest {
    pub webhook_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
