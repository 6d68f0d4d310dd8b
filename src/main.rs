use anyhow::Result;
use reasoning_relay::{web, AppState, BlobSweeper, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading configuration
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reasoning_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Reasoning Relay");
    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }

    // Load configuration
    let config = Config::from_env()?;

    // Create application state
    let app_state = AppState::new(config)?;

    // Sweep expired uploads once per TTL
    let sweeper = BlobSweeper::start(app_state.blobs.clone(), app_state.blobs.ttl());

    // Start web server
    let served = web::start_server(app_state, shutdown_signal()).await;

    sweeper.stop().await;
    served
}
