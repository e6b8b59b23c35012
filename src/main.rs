use std::sync::Arc;

use khronos::{RespConfig, RespServer, RoutedQueue};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Environment first, then an optional bind address argument
    let mut config = RespConfig::from_env();
    if let Some(addr) = std::env::args().nth(1) {
        config = config.with_listen_addr(&addr);
    }

    let queue = Arc::new(RoutedQueue::new());
    let server = RespServer::new(config, queue);

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received SIGINT, shutting down");
                shutdown.cancel();
            }
            Err(err) => tracing::warn!(error = %err, "failed to install SIGINT handler"),
        }
    });

    server.run().await?;

    Ok(())
}
