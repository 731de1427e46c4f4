//! Endpoint reachability probes
//!
//! A probe issues one HEAD request against a target and reports how long it
//! took. Any HTTP response, including error statuses, counts as reachable;
//! only transport failures and timeouts are reported as failed probes.

use crate::models::{ProbeResult, Target};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Fixed per-probe timeout
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Failure reason reported when a probe hits [`PROBE_TIMEOUT`]
pub const TIMEOUT_REASON: &str = "timeout";

/// Performs a single bounded reachability check
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe the target. Never fails; failures are captured in the result.
    async fn probe(&self, target: &Target) -> ProbeResult;
}

/// HEAD-request prober over HTTP(S)
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober with the standard 5 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create probe HTTP client")?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> ProbeResult {
        let start = Instant::now();
        let outcome = self.client.head(&target.endpoint).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => ProbeResult::success(target, duration_ms, response.status().as_u16()),
            Err(e) => {
                let reason = if e.is_timeout() {
                    TIMEOUT_REASON.to_string()
                } else {
                    failure_reason(&e)
                };
                debug!(
                    service = %target.name,
                    endpoint = %target.endpoint,
                    duration_ms = duration_ms,
                    error = %reason,
                    "Probe failed"
                );
                ProbeResult::failure(target, duration_ms, reason)
            }
        }
    }
}

/// Flatten an error chain into one readable line
fn failure_reason(err: &reqwest::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}
