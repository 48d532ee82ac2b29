use tokio::sync::watch;

use crate::node::NodeError;

/// Wire SIGINT/SIGTERM to a shutdown channel.
///
/// Returns the sender (kept alive by the signal handler's clone) and a
/// receiver for the node's main loop.
pub fn setup_shutdown() -> Result<(watch::Sender<()>, watch::Receiver<()>), NodeError> {
    let (tx, rx) = watch::channel(());
    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        log::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    })?;
    Ok((tx, rx))
}
