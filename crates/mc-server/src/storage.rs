//! Storage layout: the incoming-uploads and converted-artifacts directories.

use std::path::{Path, PathBuf};

use mc_core::config::StorageConfig;
use mc_core::{Error, Result};

/// The two flat directories the service writes to.
///
/// Constructed once from configuration and handed to the components that
/// need it; there is no process-wide directory state.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Create both directories if absent and check that they accept writes.
    ///
    /// Called before the listener is bound; an error here aborts startup.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.output_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                tracing::info!("Created directory {}", dir.display());
            }
            if !dir.is_dir() {
                return Err(Error::Internal(format!(
                    "{} exists but is not a directory",
                    dir.display()
                )));
            }
            probe_writable(dir)?;
        }
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Map a client-supplied artifact name to a path inside the output
    /// directory. Only the final path component is kept.
    pub fn artifact_path(&self, requested: &str) -> Option<PathBuf> {
        final_component(requested).map(|name| self.output_dir.join(name))
    }
}

/// Reduce a requested name to its last path component, treating both `/` and
/// `\` as separators. Empty names and dot segments yield `None`.
pub fn final_component(requested: &str) -> Option<&str> {
    let name = requested.rsplit(['/', '\\']).next().unwrap_or_default();
    match name {
        "" | "." | ".." => None,
        n if n.contains('\0') => None,
        n => Some(n),
    }
}

fn probe_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(format!(".write-probe-{}", uuid::Uuid::new_v4()));
    std::fs::write(&probe, b"")
        .map_err(|e| Error::Internal(format!("{} is not writable: {e}", dir.display())))?;
    if let Err(e) = std::fs::remove_file(&probe) {
        tracing::warn!("Failed to remove write probe {}: {e}", probe.display());
    }
    Ok(())
}
