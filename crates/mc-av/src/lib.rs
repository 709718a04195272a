//! # mc-av
//!
//! Wraps the external transcoding engine (ffmpeg).
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- resolve the engine from the
//!   configured path or `PATH` and report its version.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support; the child is killed if the timeout expires.
//! - **Conversion** ([`Converter`]) -- build the format-specific engine
//!   invocation, run it to completion, and turn the outcome into a
//!   [`mc_core::ConvertedArtifact`] or a `ConversionFailed` error.

pub mod command;
pub mod convert;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use convert::Converter;
pub use tools::{ToolInfo, ToolRegistry};
