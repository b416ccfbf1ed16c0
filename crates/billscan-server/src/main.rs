//! billscan-server - REST API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use billscan_core::{ExtractionConfig, LogFormat, ServerConfig};
use billscan_extractors::VisionInvoiceExtractor;
use billscan_server::{create_server, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,billscan_server=debug,billscan_extractors=debug")
    });

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let server_config = ServerConfig::from_env()?;
    init_tracing(server_config.log_format);

    // Provider settings are required; refuse to start without them.
    let extraction_config = ExtractionConfig::from_env()?;
    info!(
        deployment = %extraction_config.deployment,
        api_version = %extraction_config.api_version,
        timeout_secs = extraction_config.timeout.as_secs(),
        image_mime = ?extraction_config.image_mime,
        "Extraction configured"
    );

    let extractor = VisionInvoiceExtractor::new(extraction_config)?;
    let state = AppState::with_limits(
        Arc::new(extractor),
        server_config.upload_dir.clone(),
        server_config.max_upload_bytes,
    );
    let app = create_server(state);

    let addr: SocketAddr = server_config.bind_addr().parse()?;
    info!(
        upload_dir = %server_config.upload_dir.display(),
        "Starting billscan-server on {}", addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
