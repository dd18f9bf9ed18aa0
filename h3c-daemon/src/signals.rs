use h3c_core::Shutdown;
use std::io;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Resolves on the first SIGINT or SIGTERM.
pub async fn wait_for_shutdown() -> io::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = interrupt.recv() => info!("Received SIGINT, shutting down."),
        _ = terminate.recv() => info!("Received SIGTERM, shutting down."),
    }
    Ok(())
}

/// Flags `shutdown` once a termination signal arrives. Cleanup itself runs
/// in the dispatch loop, not here.
pub fn spawn_shutdown_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(()) => shutdown.request(),
            Err(e) => error!("Failed to install signal handlers: {}", e),
        }
    })
}
