//! Route handlers for the HTTP API.

pub mod convert;
pub mod download;
pub mod health;
