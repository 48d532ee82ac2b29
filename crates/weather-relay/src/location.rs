use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::LocationConfig;

/// Default IP geolocation endpoint for auto-discovery.
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

/// A resolved geographic position in floating point degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geolocation errors.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("no position fix within {0} ms")]
    Timeout(u64),

    #[error("position lookup failed: {0}")]
    Lookup(String),
}

/// A source of position fixes.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Position, LocationError>;
}

/// Provider pinned to coordinates from configuration.
pub struct StaticLocation {
    position: Position,
}

impl StaticLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait::async_trait]
impl LocationProvider for StaticLocation {
    async fn current_position(&self) -> Result<Position, LocationError> {
        Ok(self.position)
    }
}

/// Response body of the IP geolocation service.
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    city: Option<String>,
}

/// Auto-discovery provider deriving a coarse position from the machine's
/// public IP address.
pub struct IpGeolocation {
    http: reqwest::Client,
    lookup_url: String,
}

impl IpGeolocation {
    pub fn new(http: reqwest::Client, lookup_url: impl Into<String>) -> Self {
        Self {
            http,
            lookup_url: lookup_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl LocationProvider for IpGeolocation {
    async fn current_position(&self) -> Result<Position, LocationError> {
        let response = self
            .http
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| LocationError::Lookup(e.to_string()))?;
        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Lookup(e.to_string()))?;
        if body.status != "success" {
            return Err(LocationError::Lookup(format!(
                "lookup service returned status '{}'",
                body.status
            )));
        }
        if let Some(city) = &body.city {
            log::info!("IP lookup placed us near {}", city);
        }
        Ok(Position {
            latitude: body.lat,
            longitude: body.lon,
        })
    }
}

/// A position fix together with the instant it was acquired.
struct Fix {
    position: Position,
    acquired: Instant,
}

/// Resolves the current position with a bounded wait and a freshness
/// tolerance: a fix younger than the maximum age is served from cache
/// without consulting the provider.
pub struct LocationResolver {
    provider: Box<dyn LocationProvider>,
    timeout: Duration,
    maximum_age: Duration,
    last_fix: Mutex<Option<Fix>>,
}

impl LocationResolver {
    pub fn new(
        provider: Box<dyn LocationProvider>,
        timeout: Duration,
        maximum_age: Duration,
    ) -> Self {
        Self {
            provider,
            timeout,
            maximum_age,
            last_fix: Mutex::new(None),
        }
    }

    /// Build a resolver from configuration: manual coordinates when both
    /// are set, IP auto-discovery otherwise.
    pub fn from_config(config: &LocationConfig, http: reqwest::Client) -> Self {
        let provider: Box<dyn LocationProvider> = match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Box::new(StaticLocation::new(latitude, longitude)),
            _ => Box::new(IpGeolocation::new(http, config.lookup_url.clone())),
        };
        Self::new(
            provider,
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.maximum_age_ms),
        )
    }

    /// Resolve the current position.
    ///
    /// Concurrent resolves serialize on the fix cache, so overlapping
    /// pipeline runs query the provider at most once per staleness window.
    pub async fn resolve(&self) -> Result<Position, LocationError> {
        let mut last_fix = self.last_fix.lock().await;
        if let Some(fix) = last_fix.as_ref() {
            let age = fix.acquired.elapsed();
            if age <= self.maximum_age {
                log::debug!("Serving cached fix ({} ms old)", age.as_millis());
                return Ok(fix.position);
            }
        }
        let position = tokio::time::timeout(self.timeout, self.provider.current_position())
            .await
            .map_err(|_| LocationError::Timeout(self.timeout.as_millis() as u64))??;
        *last_fix = Some(Fix {
            position,
            acquired: Instant::now(),
        });
        Ok(position)
    }
}
