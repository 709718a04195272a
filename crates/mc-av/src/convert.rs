//! Conversion engine adapter.
//!
//! [`Converter`] turns an [`UploadedFile`] into a [`ConvertedArtifact`] by
//! running ffmpeg once with a format-specific argument list. A conversion is
//! all-or-nothing: either the output exists, is non-empty, and is returned, or
//! the caller gets `ConversionFailed` and any partial output is discarded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mc_core::config::ConversionConfig;
use mc_core::{ConversionRequest, ConvertedArtifact, Error, Result, TargetFormat, UploadedFile};

use crate::command::ToolCommand;

/// Runs the external engine for one upload at a time. Holds no per-request
/// state, so a single instance is shared by all concurrent requests.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
    settings: ConversionConfig,
}

impl Converter {
    pub fn new(program: PathBuf, settings: ConversionConfig) -> Self {
        Self { program, settings }
    }

    /// Engine executable this converter invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the engine invocation for `req`.
    ///
    /// - audio: drop the video stream, encode audio with the configured codec
    ///   and bitrate.
    /// - video: re-encode both streams with the configured codecs and preset.
    pub fn command(&self, req: &ConversionRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.timeout(Duration::from_secs(self.settings.timeout_secs));
        cmd.args(["-hide_banner", "-nostats", "-loglevel", "error", "-nostdin", "-y", "-i"]);
        cmd.arg(req.input.to_string_lossy());

        match req.format {
            TargetFormat::Audio => {
                cmd.arg("-vn");
                cmd.args(["-c:a", self.settings.audio_codec.as_str()]);
                cmd.args(["-b:a", self.settings.audio_bitrate.as_str()]);
            }
            TargetFormat::Video => {
                cmd.args(["-c:v", self.settings.video_codec.as_str()]);
                cmd.args(["-c:a", self.settings.video_audio_codec.as_str()]);
                cmd.args(["-preset", self.settings.video_preset.as_str()]);
            }
        }

        cmd.arg(req.output.to_string_lossy());
        cmd
    }

    /// Convert `upload` to `format`, writing the artifact into `output_dir`.
    ///
    /// Returns only after the engine process has exited. An artifact already
    /// present at the derived output path is replaced. The input file is
    /// deleted after a successful conversion; failure to delete it is logged
    /// and otherwise ignored.
    pub async fn convert(
        &self,
        upload: &UploadedFile,
        format: TargetFormat,
        output_dir: &Path,
    ) -> Result<ConvertedArtifact> {
        let req = ConversionRequest::new(upload, format, output_dir);
        remove_if_exists(&req.output).await?;

        tracing::info!(
            upload_id = %upload.id,
            format = %format,
            input = %req.input.display(),
            output = %req.output.display(),
            "Starting conversion"
        );
        let started = Instant::now();

        if let Err(e) = self.command(&req).execute().await {
            tracing::warn!(upload_id = %upload.id, error = %e, "Conversion failed");
            discard_partial(&req.output).await;
            return Err(e);
        }

        if let Err(e) = verify_output(&self.tool_name(), &req.output).await {
            tracing::warn!(upload_id = %upload.id, error = %e, "Engine output rejected");
            discard_partial(&req.output).await;
            return Err(e);
        }

        tracing::info!(
            upload_id = %upload.id,
            output = %req.output_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Conversion finished"
        );

        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            tracing::warn!(
                upload_id = %upload.id,
                path = %upload.path.display(),
                "Failed to delete converted upload: {e}"
            );
        }

        Ok(ConvertedArtifact {
            filename: req.output_name,
            path: req.output,
            format,
        })
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ffmpeg".into())
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed previous output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::from(e)),
    }
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial output {}: {e}", path.display());
        }
    }
}

/// The engine's exit status is not trusted on its own.
async fn verify_output(tool: &str, path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path).await.ok();
    match meta {
        Some(m) if m.is_file() && m.len() > 0 => Ok(()),
        _ => Err(Error::conversion_failed(
            tool,
            format!("engine reported success but produced no output at {}", file_name(path)),
        )),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(PathBuf::from(crate::tools::FFMPEG), ConversionConfig::default())
    }
}

impl std::fmt::Display for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.tool_name(), self.program.display())
    }
}
