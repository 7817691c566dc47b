//! # Userbase Server
//!
//! Main entry point for the Userbase application.

use tracing::{error, info};
use userbase_config::ConfigLoader;
use userbase_core::telemetry::{init_tracing, TelemetryConfig};
use userbase_core::UserbaseResult;
use userbase_server::{startup, Application};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be up yet when configuration failed to load.
        let _ = init_tracing(&TelemetryConfig::default());
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> UserbaseResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_tracing(&config.observability)?;
    startup::print_banner();

    info!("Starting Userbase Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let app = Application::build(config).await?;
    let listener = app.bind().await?;
    app.serve(listener, startup::shutdown_signal()).await
}
