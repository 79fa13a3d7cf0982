//! Best-effort public IP lookup

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Value recorded when the lookup fails
pub const UNKNOWN_IP: &str = "unknown";

/// Source of the caller's public IP address
#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn lookup(&self) -> Result<String>;
}

/// Look up the IP, falling back to `"unknown"` on any failure
pub async fn lookup_or_unknown(lookup: &dyn IpLookup) -> String {
    match lookup.lookup().await {
        Ok(ip) => ip,
        Err(e) => {
            warn!("Failed to fetch IP address: {:#}", e);
            UNKNOWN_IP.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Client for ipify-style endpoints returning `{"ip": "..."}`
pub struct IpifyClient {
    url: String,
    client: reqwest::Client,
}

impl IpifyClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IpLookup for IpifyClient {
    async fn lookup(&self) -> Result<String> {
        debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("IP lookup failed: {}", response.status());
        }

        let body: IpResponse = response
            .json()
            .await
            .context("Failed to parse IP lookup response")?;

        Ok(body.ip)
    }
}

/// Fixed answer, for offline use and tests
pub struct StaticIpLookup(pub String);

#[async_trait]
impl IpLookup for StaticIpLookup {
    async fn lookup(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLookup;

    #[async_trait]
    impl IpLookup for FailingLookup {
        async fn lookup(&self) -> Result<String> {
            anyhow::bail!("network unreachable")
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_unknown() {
        assert_eq!(lookup_or_unknown(&FailingLookup).await, "unknown");
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let lookup = StaticIpLookup("203.0.113.7".to_string());
        assert_eq!(lookup_or_unknown(&lookup).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        // Nothing listens on port 9 of localhost
        let client = IpifyClient::new("http://127.0.0.1:9/?format=json".to_string());
        assert_eq!(lookup_or_unknown(&client).await, "unknown");
    }
}
