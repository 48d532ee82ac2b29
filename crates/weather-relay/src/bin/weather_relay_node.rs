use argh::FromArgs;
use std::sync::Arc;
use std::time::Duration;
use weather_relay::{
    open_zenoh_session, setup_shutdown, Config, LocationResolver, OpenWeatherClient,
    WeatherRelayNode, ZenohOutbound,
};

#[derive(FromArgs)]
/// Wearable weather relay node
struct Args {
    /// path to the configuration file (optional, defaults apply without it)
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// zenoh router endpoint to connect to
    /// Default: tcp/127.0.0.1:7447 (local zenohd router)
    #[argh(option, short = 'e')]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    // Load configuration (or use defaults)
    let config = if let Some(config_path) = &args.config {
        match Config::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to load config from '{}': {}", config_path, e);
                std::process::exit(1);
            }
        }
    } else {
        log::info!("No config file specified, using defaults with auto-discovery");
        Config::default()
    };

    // Shared HTTP client; bounded so a hung request becomes a fetch error
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.weather.request_timeout_secs))
        .build()?;

    let resolver = Arc::new(LocationResolver::from_config(&config.location, http.clone()));
    let weather = Arc::new(OpenWeatherClient::from_config(&config.weather, http)?);

    // Shutdown channel wired to Ctrl+C
    let (_shutdown_tx, shutdown_rx) = setup_shutdown()?;

    // Zenoh session (client mode)
    let session = open_zenoh_session(&args.endpoint).await?;

    let outbound = Arc::new(ZenohOutbound::new(&session, &config.relay.update_topic).await?);
    log::info!("Update topic: {}", config.relay.update_topic);

    let node = Arc::new(WeatherRelayNode::new(resolver, weather, outbound));
    node.run(session, &config.relay.trigger_topic, shutdown_rx)
        .await?;

    log::info!("Weather relay node shut down, exiting");
    Ok(())
}
