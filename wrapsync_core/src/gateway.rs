//! Wrapper listing from the gateway's pin index

use crate::ClientConfig;
use crate::error::{Result, StoreError};
use crate::types::WrapperPin;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// Source of the (name, identifier) pairs to mirror
#[async_trait::async_trait]
pub trait PinIndex: Send + Sync {
    async fn list_pins(&self) -> Result<Vec<WrapperPin>>;
}

/// HTTP client for `<gateway>/pins?json=true`
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wrapsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn pins_url(&self) -> String {
        format!("{}/pins", self.base_url)
    }
}

#[async_trait::async_trait]
impl PinIndex for GatewayClient {
    async fn list_pins(&self) -> Result<Vec<WrapperPin>> {
        debug!("Fetching wrapper list from {}", self.pins_url());
        let response = self
            .client
            .get(self.pins_url())
            .query(&[("json", "true")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        parse_pins(&body)
    }
}

fn parse_pins(body: &str) -> Result<Vec<WrapperPin>> {
    let pins: Vec<WrapperPin> = serde_json::from_str(body)?;
    Ok(pins)
}
