//! `GET /download/{filename}`: stream a converted artifact as an attachment.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use mc_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

/// Missing artifacts answer with a plain-text 404 rather than the JSON error
/// body used on the convert path. A name that does not decode to UTF-8 can
/// never match an artifact, so it gets the same 404.
pub async fn download(
    State(ctx): State<AppContext>,
    filename: Result<Path<String>, PathRejection>,
) -> Response {
    let filename = match filename {
        Ok(Path(name)) => name,
        Err(rejection) => {
            tracing::debug!("Undecodable download name: {rejection}");
            return not_found();
        }
    };

    match ctx.publisher.fetch(&filename).await {
        Ok(artifact) => {
            tracing::info!(filename = %artifact.filename, bytes = artifact.len, "Serving artifact");
            artifact.into_response()
        }
        Err(Error::NotFound { .. }) => {
            tracing::debug!(requested = %filename, "Artifact not found");
            not_found()
        }
        Err(e) => AppError(e).into_response(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}
