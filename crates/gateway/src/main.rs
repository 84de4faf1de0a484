//! Arogya Gateway
//!
//! Entry point of the question-answering service.
//! Startup is all-or-nothing: configuration, secrets and every upstream
//! client must initialize before the listener is bound.

use arogya_common::{config::AppConfig, metrics, RagPipeline, VERSION};
use arogya_gateway::{create_router, telemetry, AppState};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; tracing needs its observability section
    let loaded = AppConfig::load();
    let observability = loaded
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_default();
    telemetry::init_tracing(&observability);

    info!("Starting Arogya gateway v{}", VERSION);

    let config = loaded.map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    // Initialize metrics
    telemetry::install_metrics_exporter(&config.observability)?;
    metrics::register_metrics();

    // Initialize upstream clients
    let pipeline = RagPipeline::connect(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialize application");
        e
    })?;
    info!("Application initialized successfully!");

    let addr = config.bind_address();
    let app = create_router(AppState::new(config, pipeline));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
