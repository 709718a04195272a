//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`mc_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on core results.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub mc_core::Error);

impl From<mc_core::Error> for AppError {
    fn from(e: mc_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        let body = match &self.0 {
            mc_core::Error::ConversionFailed { detail, .. } => json!({
                "error": "Conversion failed",
                "code": self.0.code(),
                "detail": detail,
            }),
            // Paths and OS messages stay in the logs.
            mc_core::Error::Io { .. } | mc_core::Error::Internal(_) => json!({
                "error": "Internal server error",
                "code": self.0.code(),
            }),
            other => json!({
                "error": other.to_string(),
                "code": other.code(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
