//! mc-server: HTTP upload, conversion, and download service.
//!
//! This crate ties mc-core and mc-av together into a running server:
//!
//! - [`storage::StorageLayout`] guarantees the working directories exist
//! - [`upload::UploadReceiver`] streams the multipart file part to disk
//! - [`mc_av::Converter`] runs the engine for each request
//! - [`publisher::ArtifactPublisher`] serves converted files by name
//! - an Axum router maps all of it onto `POST /convert` and
//!   `GET /download/{filename}`, with graceful shutdown on signals

pub mod context;
pub mod error;
pub mod middleware;
pub mod publisher;
pub mod router;
pub mod routes;
pub mod storage;
pub mod upload;

use std::net::SocketAddr;

use mc_core::config::Config;

use crate::context::AppContext;

/// Start the mediaconv server.
///
/// Creates the working directories (fatal on failure), resolves the engine,
/// binds the listener, and serves until Ctrl-C or SIGTERM.
pub async fn start(config: Config) -> mc_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let tools = mc_av::ToolRegistry::discover(&config.tools);
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        }
    }
    if let Err(e) = tools.require(mc_av::tools::FFMPEG) {
        tracing::warn!("{e}; conversions will fail until it is installed");
    }

    let ctx = AppContext::new(config.clone(), tools);
    ctx.storage.ensure()?;
    tracing::info!(
        uploads = %ctx.storage.upload_dir().display(),
        output = %ctx.storage.output_dir().display(),
        "Storage ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| mc_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(ctx, config.server.static_dir.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| mc_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| mc_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
