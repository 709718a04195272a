//! Unified error type for mediaconv.
//!
//! Every failure on the convert and download paths funnels into [`Error`],
//! which carries enough context for the HTTP layer to derive a status code via
//! [`Error::http_status`] and a stable machine-readable [`Error::code`].

use std::fmt;

/// Error taxonomy covering the upload, conversion, and download paths.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request carried no file part.
    #[error("No file provided")]
    NoFileProvided,

    /// The uploaded payload exceeded the configured ceiling.
    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// The requested target format is not one of the supported outputs.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The request was malformed in some other way (bad multipart body,
    /// unexpected file field, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The external engine failed, timed out, or produced no usable output.
    #[error("Conversion failed [{tool}]: {detail}")]
    ConversionFailed {
        /// Name of the engine that failed.
        tool: String,
        /// Diagnostic text reported by the engine.
        detail: String,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "artifact").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A directory or file operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NoFileProvided => 400,
            Error::PayloadTooLarge { .. } => 413,
            Error::InvalidFormat(_) => 400,
            Error::Validation(_) => 400,
            Error::ConversionFailed { .. } => 500,
            Error::NotFound { .. } => 404,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable identifier for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoFileProvided => "no_file_provided",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::InvalidFormat(_) => "invalid_format",
            Error::Validation(_) => "validation_error",
            Error::ConversionFailed { .. } => "conversion_failed",
            Error::NotFound { .. } => "not_found",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::ConversionFailed`].
    pub fn conversion_failed(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::ConversionFailed {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
