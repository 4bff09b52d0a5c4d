//! One-shot HTTPS fetch of the protocol configuration.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ProtocolConfig;

/// Request timeout for the configuration fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Capability interface for obtaining the protocol configuration.
///
/// Fetch failures of any kind collapse to `None`; the session engine turns
/// that into `LoadingProtocolFailed` and the next `advance` retries.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    async fn fetch(&self, url: &str, device_uuid: &str) -> Option<ProtocolConfig>;
}

/// Default fetcher: HTTPS GET against the OTA URL, identifying the device
/// through a `Device-Id` header.
pub struct HttpConfigFetcher {
    client: reqwest::Client,
}

impl HttpConfigFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpConfigFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self, url: &str, device_uuid: &str) -> Option<ProtocolConfig> {
        let response = match self
            .client
            .get(url)
            .header("Device-Id", device_uuid)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "config fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "config endpoint returned an error status");
            return None;
        }

        match response.json::<ProtocolConfig>().await {
            Ok(config) => {
                debug!(
                    mqtt_endpoint = %config.mqtt.endpoint,
                    activation = !config.activation.code.is_empty(),
                    "fetched protocol configuration"
                );
                Some(config)
            }
            Err(e) => {
                warn!(url, error = %e, "config document did not parse");
                None
            }
        }
    }
}
