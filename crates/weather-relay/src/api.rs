use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::location::Position;

/// Default current-weather endpoint.
pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Weather API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid weather endpoint: {0}")]
    InvalidBaseUrl(String),

    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// Raw response shape of the current-weather endpoint. Only the fields
/// the relay consumes are modeled.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    main: String,
}

/// One observation derived from the API response.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Raw temperature as reported by the API, in Kelvin.
    pub kelvin: f64,
    /// Short condition label, e.g. "Clear".
    pub conditions: String,
}

impl WeatherObservation {
    /// Temperature rounded to the nearest whole degree Celsius.
    pub fn temperature_celsius(&self) -> i32 {
        celsius_from_kelvin(self.kelvin)
    }

    fn from_response(response: WeatherResponse) -> Result<Self, ApiError> {
        let first = response
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Malformed("empty weather condition list".to_string()))?;
        Ok(Self {
            kelvin: response.main.temp,
            conditions: first.main,
        })
    }

    fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let response: WeatherResponse =
            serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        Self::from_response(response)
    }
}

/// Convert Kelvin to whole degrees Celsius, rounding to nearest.
pub fn celsius_from_kelvin(kelvin: f64) -> i32 {
    (kelvin - 273.15).round() as i32
}

/// A source of weather observations for a position.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, position: Position) -> Result<WeatherObservation, ApiError>;
}

/// Client for the OpenWeatherMap current-weather endpoint.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, ApiError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn from_config(config: &WeatherConfig, http: reqwest::Client) -> Result<Self, ApiError> {
        Self::new(http, &config.base_url, config.api_key.clone())
    }

    /// Request URL for a position. The query carries the coordinates
    /// (and the API key when configured), percent-encoded.
    pub fn request_url(&self, position: Position) -> reqwest::Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("lat", &position.latitude.to_string())
                .append_pair("lon", &position.longitude.to_string());
            if let Some(key) = &self.api_key {
                query.append_pair("appid", key);
            }
        }
        url
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, position: Position) -> Result<WeatherObservation, ApiError> {
        let url = self.request_url(position);
        log::debug!("Fetching weather: {}", url);
        let response = self.http.get(url).send().await?;
        // The body is parsed whatever the status; a non-2xx body that is
        // not the expected shape surfaces as Malformed.
        let status = response.status();
        let body = response.bytes().await?;
        WeatherObservation::from_json(&body).map_err(|e| match e {
            ApiError::Malformed(msg) => ApiError::Malformed(format!("{msg} (HTTP {status})")),
            other => other,
        })
    }
}
