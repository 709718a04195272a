//! Axum router construction.
//!
//! Builds the application router with the convert, download, and health
//! routes, the middleware stack, and optional static file serving.

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Allowance for multipart boundaries and part headers on top of the file
/// size ceiling.
const MULTIPART_ENVELOPE_BYTES: u64 = 64 * 1024;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(
        ctx.config
            .storage
            .max_upload_bytes
            .saturating_add(MULTIPART_ENVELOPE_BYTES),
    )
    .unwrap_or(usize::MAX);

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/convert",
            post(routes::convert::convert).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/download/{filename}", get(routes::download::download))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    if let Some(dir) = static_dir {
        if dir.is_dir() {
            tracing::info!("Serving static files from {}", dir.display());
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        } else {
            tracing::debug!("Static directory {} not found; not serving", dir.display());
        }
    }

    app
}
