//! mc-core: shared types, errors, and configuration.
//!
//! This crate is the foundational dependency for the other mc-* crates. It
//! provides the error taxonomy used from the upload path down to the engine,
//! the JSON configuration model, the per-upload identifier, and the media
//! domain types that tie an upload to its converted artifact.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

pub use error::{Error, Result};
pub use ids::UploadId;
pub use media::*;
