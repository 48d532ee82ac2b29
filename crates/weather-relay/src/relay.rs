use serde::{Deserialize, Serialize};

use crate::api::WeatherObservation;

/// Outbound dictionary key for the rounded Celsius temperature.
pub const KEY_TEMPERATURE: &str = "KEY_TEMPERATURE";

/// Outbound dictionary key for the condition label.
pub const KEY_CONDITIONS: &str = "KEY_CONDITIONS";

/// Outbound send errors.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to encode update: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to publish update: {0}")]
    Channel(String),
}

/// The flat two-key mapping relayed to the device application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "KEY_TEMPERATURE")]
    pub temperature: i32,

    #[serde(rename = "KEY_CONDITIONS")]
    pub conditions: String,
}

impl OutboundMessage {
    pub fn from_observation(observation: &WeatherObservation) -> Self {
        Self {
            temperature: observation.temperature_celsius(),
            conditions: observation.conditions.clone(),
        }
    }
}

/// Where finished updates go. The pipeline hands the message over once;
/// delivery outcomes are logged by the caller, never retried.
#[async_trait::async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

/// Zenoh-backed outbound channel publishing JSON on the update topic.
pub struct ZenohOutbound {
    publisher: zenoh::pubsub::Publisher<'static>,
}

impl ZenohOutbound {
    pub async fn new(session: &zenoh::Session, topic: &str) -> Result<Self, SendError> {
        let publisher = session
            .declare_publisher(topic.to_string())
            .await
            .map_err(|e| SendError::Channel(e.to_string()))?;
        Ok(Self { publisher })
    }
}

#[async_trait::async_trait]
impl OutboundChannel for ZenohOutbound {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let payload = serde_json::to_vec(message)?;
        self.publisher
            .put(payload)
            .await
            .map_err(|e| SendError::Channel(e.to_string()))?;
        Ok(())
    }
}
