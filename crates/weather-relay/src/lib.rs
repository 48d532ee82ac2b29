//! Wearable weather relay node.
//!
//! Listens for trigger events on a Zenoh topic, resolves the current
//! position, fetches current weather from the OpenWeatherMap API and
//! publishes a small two-field update for the paired device application:
//! - rounded temperature in Celsius
//! - current condition label
//!
//! Supports location auto-discovery from IP address.

mod api;
mod config;
mod location;
mod node;
mod relay;
mod session;
mod shutdown;

pub use api::{
    celsius_from_kelvin, ApiError, OpenWeatherClient, WeatherObservation, WeatherProvider,
    DEFAULT_WEATHER_URL,
};
pub use config::{Config, ConfigError, LocationConfig, RelayConfig, WeatherConfig};
pub use location::{
    IpGeolocation, LocationError, LocationProvider, LocationResolver, Position, StaticLocation,
    DEFAULT_LOOKUP_URL,
};
pub use node::{NodeError, RunError, WeatherRelayNode};
pub use relay::{
    OutboundChannel, OutboundMessage, SendError, ZenohOutbound, KEY_CONDITIONS, KEY_TEMPERATURE,
};
pub use session::open_zenoh_session;
pub use shutdown::setup_shutdown;
