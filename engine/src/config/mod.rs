//! Protocol configuration fetched from the OTA endpoint.
//!
//! The OTA document carries two things the engine consumes: MQTT transport
//! parameters (captured and kept for future transports, never used by this
//! engine) and the device activation block. A non-empty activation code means
//! the device is not yet bound to an account and the session must not proceed
//! past `Initted`.

mod fetch;

pub use fetch::{ConfigFetcher, HttpConfigFetcher};

use serde::Deserialize;

/// MQTT transport parameters from the OTA document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MqttConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub publish_topic: String,
    #[serde(default)]
    pub subscribe_topic: String,
}

/// Device activation block from the OTA document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActivationConfig {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// The consumed subset of the OTA configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
}

impl ProtocolConfig {
    /// Whether the server handed out an activation code the user must enter.
    pub fn needs_activation(&self) -> bool {
        !self.activation.code.is_empty()
    }
}
