use std::sync::Arc;

use crate::node::NodeError;

/// Open a Zenoh session in client mode.
///
/// Endpoint resolution order:
/// 1. `WEATHER_RELAY_ZENOH_ENDPOINT` env var
/// 2. `ZENOH_ENDPOINT` env var
/// 3. Provided `endpoint` argument
/// 4. Default: `tcp/127.0.0.1:7447`
pub async fn open_zenoh_session(endpoint: &Option<String>) -> Result<Arc<zenoh::Session>, NodeError> {
    let endpoint = std::env::var("WEATHER_RELAY_ZENOH_ENDPOINT")
        .or_else(|_| std::env::var("ZENOH_ENDPOINT"))
        .ok()
        .or_else(|| endpoint.clone())
        .unwrap_or_else(|| "tcp/127.0.0.1:7447".to_string());

    log::info!("Connecting to Zenoh at: {}", endpoint);

    let mut config = zenoh::Config::default();
    // Client mode is mandatory; peer mode doesn't route through zenohd
    config
        .insert_json5("mode", r#""client""#)
        .map_err(|e| NodeError::Zenoh(format!("Failed to set mode: {e}")))?;
    config
        .insert_json5("connect/endpoints", &format!(r#"["{}"]"#, endpoint))
        .map_err(|e| NodeError::Zenoh(format!("Failed to set endpoint: {e}")))?;
    // Disable scouting so the node only ever talks to the configured router
    config
        .insert_json5("scouting/multicast/enabled", "false")
        .map_err(|e| NodeError::Zenoh(format!("Failed to disable multicast: {e}")))?;
    config
        .insert_json5("scouting/gossip/enabled", "false")
        .map_err(|e| NodeError::Zenoh(format!("Failed to disable gossip: {e}")))?;

    let session = zenoh::open(config)
        .await
        .map_err(|e| NodeError::Zenoh(format!("Failed to open session: {e}")))?;

    log::info!("Connected to Zenoh");
    Ok(Arc::new(session))
}
