use serde::Deserialize;
use std::path::Path;

use crate::api::DEFAULT_WEATHER_URL;
use crate::location::DEFAULT_LOOKUP_URL;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{0}': {1}")]
    Read(String, #[source] std::io::Error),

    #[error("Failed to parse config '{0}': {1}")]
    Parse(String, #[source] serde_yaml::Error),
}

/// Node configuration, deserialized from YAML.
///
/// Every field has a default so the node runs without a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub weather: WeatherConfig,
    pub relay: RelayConfig,
}

/// Geolocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Manual latitude in degrees. When both coordinates are set,
    /// auto-discovery is skipped entirely.
    pub latitude: Option<f64>,

    /// Manual longitude in degrees.
    pub longitude: Option<f64>,

    /// IP geolocation endpoint used for auto-discovery.
    pub lookup_url: String,

    /// Abort the position request if no fix arrives within this bound.
    pub timeout_ms: u64,

    /// Serve a cached fix up to this old instead of re-querying.
    pub maximum_age_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout_ms: 15_000,
            maximum_age_ms: 60_000,
        }
    }
}

/// Weather API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base endpoint for current weather.
    pub base_url: String,

    /// Optional API key, sent as the `appid` query parameter when set.
    pub api_key: Option<String>,

    /// HTTP request timeout. A hung request surfaces as a fetch error
    /// instead of stalling the run forever.
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            api_key: None,
            request_timeout_secs: 10,
        }
    }
}

/// Topics the node talks on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Any sample on this topic triggers a refresh. Payload is ignored.
    pub trigger_topic: String,

    /// Weather updates are published here as a flat JSON mapping.
    pub update_topic: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            trigger_topic: "wearable/weather/request".to_string(),
            update_topic: "wearable/weather/update".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e))
    }
}
