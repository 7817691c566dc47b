//! Server startup utilities.

use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r"
  _   _                 _
 | | | |___  ___ _ __  | |__   __ _ ___  ___
 | | | / __|/ _ \ '__| | '_ \ / _` / __|/ _ \
 | |_| \__ \  __/ |    | |_) | (_| \__ \  __/
  \___/|___/\___|_|    |_.__/ \__,_|___/\___|
    "
    );
}

/// Prints server startup information.
pub fn print_startup_info(addr: SocketAddr) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}", addr);
    info!("Register:  POST http://{}/user/users/register", addr);
    info!("Health:    http://{}/health", addr);
    info!("{}", separator);
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A signal whose handler cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
