//! External tool detection.
//!
//! The [`ToolRegistry`] resolves the location of the transcoding engine once
//! at startup and hands it to the [`Converter`](crate::Converter).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the transcoding engine binary.
pub const FFMPEG: &str = "ffmpeg";

/// Tools the registry knows how to resolve.
const KNOWN_TOOLS: &[&str] = &[FFMPEG];

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Resolved executable paths, keyed by tool name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Resolve every known tool, preferring configured paths over `PATH`.
    pub fn discover(tools_config: &mc_core::config::ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                FFMPEG => tools_config.ffmpeg_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "Configured {name} path {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Path of a discovered tool, if any.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.tools.get(name).map(PathBuf::as_path)
    }

    /// Return the path for `name`, or a `ConversionFailed` error explaining
    /// that the tool is missing.
    pub fn require(&self, name: &str) -> mc_core::Result<&Path> {
        self.get(name).ok_or_else(|| {
            mc_core::Error::conversion_failed(
                name,
                format!("{name} not found; is it installed and in PATH?"),
            )
        })
    }

    /// Program to invoke for the engine. Falls back to the bare name so a
    /// missing engine surfaces as a spawn failure at conversion time.
    pub fn ffmpeg_program(&self) -> PathBuf {
        self.get(FFMPEG)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(FFMPEG))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
