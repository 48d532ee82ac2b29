use std::sync::Arc;
use tokio::sync::watch;

use crate::api::{ApiError, WeatherProvider};
use crate::location::{LocationError, LocationResolver};
use crate::relay::{OutboundChannel, OutboundMessage, SendError};

/// Node setup errors.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// One pipeline run's failure, by stage.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("location: {0}")]
    Location(#[from] LocationError),

    #[error("weather fetch: {0}")]
    Fetch(#[from] ApiError),

    #[error("send: {0}")]
    Send(#[from] SendError),
}

/// The relay pipeline: resolve position, fetch weather, publish the
/// update. Stateless across runs; every trigger spawns an independent
/// run over these shared handles.
pub struct WeatherRelayNode {
    resolver: Arc<LocationResolver>,
    weather: Arc<dyn WeatherProvider>,
    outbound: Arc<dyn OutboundChannel>,
}

impl WeatherRelayNode {
    pub fn new(
        resolver: Arc<LocationResolver>,
        weather: Arc<dyn WeatherProvider>,
        outbound: Arc<dyn OutboundChannel>,
    ) -> Self {
        Self {
            resolver,
            weather,
            outbound,
        }
    }

    /// Run the pipeline once: position, weather, outbound update.
    ///
    /// A failure at any stage aborts the run; a position failure never
    /// issues a weather request.
    pub async fn refresh(&self) -> Result<(), RunError> {
        let position = self.resolver.resolve().await?;
        log::debug!(
            "Fix obtained: ({:.4}, {:.4})",
            position.latitude,
            position.longitude
        );

        let observation = self.weather.current_weather(position).await?;
        log::info!(
            "Temperature: {}, conditions: {}",
            observation.temperature_celsius(),
            observation.conditions
        );

        let message = OutboundMessage::from_observation(&observation);
        self.outbound.send(&message).await?;
        Ok(())
    }

    /// Spawn one independent pipeline run.
    ///
    /// Overlapping runs are allowed, not deduplicated; each is internally
    /// consistent and the send order between them is undefined.
    pub fn trigger(self: &Arc<Self>) {
        let node = self.clone();
        tokio::spawn(async move {
            match node.refresh().await {
                Ok(()) => log::info!("Weather update sent"),
                Err(e) => log::error!("Weather refresh aborted: {}", e),
            }
        });
    }

    /// Main loop: refresh once on startup, then once per sample on the
    /// trigger topic, until shutdown.
    pub async fn run(
        self: Arc<Self>,
        session: Arc<zenoh::Session>,
        trigger_topic: &str,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<(), NodeError> {
        let subscriber = session
            .declare_subscriber(trigger_topic.to_string())
            .await
            .map_err(|e| NodeError::Zenoh(e.to_string()))?;
        log::info!("Trigger topic: {}", trigger_topic);

        // Startup trigger: fires exactly once, before any samples.
        self.trigger();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    log::info!("Relay node received shutdown signal");
                    break;
                }

                sample = subscriber.recv_async() => {
                    match sample {
                        Ok(_) => {
                            // Repeatable trigger; the payload is not inspected.
                            log::debug!("Update requested");
                            self.trigger();
                        }
                        Err(e) => {
                            log::error!("Trigger subscriber closed: {}", e);
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WeatherObservation;
    use crate::location::{LocationProvider, Position, StaticLocation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedWeather {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current_weather(&self, _: Position) -> Result<WeatherObservation, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherObservation {
                kelvin: 293.15,
                conditions: "Clear".to_string(),
            })
        }
    }

    struct MalformedWeather;

    #[async_trait::async_trait]
    impl WeatherProvider for MalformedWeather {
        async fn current_weather(&self, _: Position) -> Result<WeatherObservation, ApiError> {
            Err(ApiError::Malformed("missing field `weather`".to_string()))
        }
    }

    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl OutboundChannel for RecordingChannel {
        async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait::async_trait]
    impl OutboundChannel for FailingChannel {
        async fn send(&self, _: &OutboundMessage) -> Result<(), SendError> {
            Err(SendError::Channel("session closed".to_string()))
        }
    }

    struct NoFix;

    #[async_trait::async_trait]
    impl LocationProvider for NoFix {
        async fn current_position(&self) -> Result<Position, LocationError> {
            Err(LocationError::Lookup("service unavailable".to_string()))
        }
    }

    fn resolver_with(provider: Box<dyn LocationProvider>) -> Arc<LocationResolver> {
        Arc::new(LocationResolver::new(
            provider,
            Duration::from_millis(100),
            Duration::from_secs(60),
        ))
    }

    fn expected_message() -> OutboundMessage {
        OutboundMessage {
            temperature: 20,
            conditions: "Clear".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_sends_converted_update() {
        let channel = Arc::new(RecordingChannel::new());
        let node = WeatherRelayNode::new(
            resolver_with(Box::new(StaticLocation::new(51.5074, -0.1278))),
            Arc::new(FixedWeather {
                calls: AtomicUsize::new(0),
            }),
            channel.clone(),
        );

        node.refresh().await.unwrap();

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[expected_message()]);
    }

    #[tokio::test]
    async fn test_location_failure_skips_fetch_and_send() {
        let weather = Arc::new(FixedWeather {
            calls: AtomicUsize::new(0),
        });
        let channel = Arc::new(RecordingChannel::new());
        let node = WeatherRelayNode::new(
            resolver_with(Box::new(NoFix)),
            weather.clone(),
            channel.clone(),
        );

        let result = node.refresh().await;

        assert!(matches!(result, Err(RunError::Location(_))));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_weather_skips_send() {
        let channel = Arc::new(RecordingChannel::new());
        let node = WeatherRelayNode::new(
            resolver_with(Box::new(StaticLocation::new(0.0, 0.0))),
            Arc::new(MalformedWeather),
            channel.clone(),
        );

        let result = node.refresh().await;

        assert!(matches!(result, Err(RunError::Fetch(ApiError::Malformed(_)))));
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let node = WeatherRelayNode::new(
            resolver_with(Box::new(StaticLocation::new(0.0, 0.0))),
            Arc::new(FixedWeather {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(FailingChannel),
        );

        let result = node.refresh().await;
        assert!(matches!(result, Err(RunError::Send(_))));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_are_independent() {
        let channel = Arc::new(RecordingChannel::new());
        let node = Arc::new(WeatherRelayNode::new(
            resolver_with(Box::new(StaticLocation::new(51.5074, -0.1278))),
            Arc::new(FixedWeather {
                calls: AtomicUsize::new(0),
            }),
            channel.clone(),
        ));

        let (first, second) = tokio::join!(node.refresh(), node.refresh());
        first.unwrap();
        second.unwrap();

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| *m == expected_message()));
    }
}
