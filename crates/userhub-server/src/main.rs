//! # Userhub Server
//!
//! Main entry point: loads configuration, opens the store and cache, and
//! serves the REST API until a shutdown signal arrives.

use tokio::signal;
use tracing::{error, info};
use userhub_config::{AppConfig, ConfigLoader, ObservabilityConfig};
use userhub_core::{HubError, HubResult};
use userhub_rest::create_router;
use userhub_server::{
    init_logging,
    startup::{print_banner, print_startup_info},
    Resources,
};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location().load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.observability);
    print_banner();
    info!("Starting Userhub Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> HubResult<()> {
    let resources = Resources::connect(&config).await?;
    let router = create_router(resources.app_state(&config), &config.server);

    let addr = config.server.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            resources.close().await;
            return Err(HubError::Internal(format!("Failed to bind {addr}: {e}")));
        }
    };

    print_startup_info(&config);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HubError::Internal(format!("REST server error: {e}")));

    resources.close().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
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
