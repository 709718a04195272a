//! Media domain types for the upload-to-artifact pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ids::UploadId;

/// Longest original extension carried over to the stored upload name.
const MAX_EXTENSION_LEN: usize = 16;

// ---------------------------------------------------------------------------
// TargetFormat
// ---------------------------------------------------------------------------

/// Output format requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Audio-only MP3.
    Audio,
    /// Re-encoded MP4 with video and audio streams.
    Video,
}

impl TargetFormat {
    /// Resolve the `format` query parameter.
    ///
    /// An absent parameter selects [`TargetFormat::Audio`]; a present but
    /// unrecognized value is rejected rather than defaulted.
    pub fn from_query(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(TargetFormat::Audio),
            Some(v) => v.parse(),
        }
    }

    /// File extension (without dot) of the produced artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Audio => "mp3",
            TargetFormat::Video => "mp4",
        }
    }

    /// MIME type of the produced artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            TargetFormat::Audio => "audio/mpeg",
            TargetFormat::Video => "video/mp4",
        }
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" | "audio" => Ok(TargetFormat::Audio),
            "mp4" | "video" => Ok(TargetFormat::Video),
            _ => Err(Error::InvalidFormat(format!(
                "'{s}' is not supported (expected mp3 or mp4)"
            ))),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// UploadedFile
// ---------------------------------------------------------------------------

/// A file persisted to the incoming-uploads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: UploadId,
    /// Where the upload was written.
    pub path: PathBuf,
    /// Extension preserved from the client filename, without the dot.
    pub extension: Option<String>,
    /// Filename as declared by the client.
    pub original_name: Option<String>,
    /// Number of bytes written.
    pub size: u64,
}

impl UploadedFile {
    /// Name under which an upload with this id and extension is stored.
    pub fn stored_name(id: UploadId, extension: Option<&str>) -> String {
        match extension {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }

    /// Extract the extension of a client-declared filename, keeping it only
    /// when it is short plain ASCII alphanumerics.
    pub fn preserved_extension(original_name: &str) -> Option<String> {
        let ext = Path::new(original_name).extension()?.to_str()?;
        let valid = !ext.is_empty()
            && ext.len() <= MAX_EXTENSION_LEN
            && ext.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| ext.to_string())
    }

    /// Identifier portion of the stored name (extension stripped).
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(String::from)
            .unwrap_or_else(|| self.id.to_string())
    }
}

// ---------------------------------------------------------------------------
// ConversionRequest / ConvertedArtifact
// ---------------------------------------------------------------------------

/// A validated request to convert one upload into one target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub format: TargetFormat,
    /// File name of the artifact (`<identifier>.<ext>`).
    pub output_name: String,
    pub output: PathBuf,
}

impl ConversionRequest {
    /// Derive the output location for `upload` inside `output_dir`.
    pub fn new(upload: &UploadedFile, format: TargetFormat, output_dir: &Path) -> Self {
        let output_name = format!("{}.{}", upload.base_name(), format.extension());
        Self {
            input: upload.path.clone(),
            format,
            output: output_dir.join(&output_name),
            output_name,
        }
    }
}

/// A successfully converted file living in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedArtifact {
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub format: TargetFormat,
}

impl ConvertedArtifact {
    /// Public URL path the artifact can be fetched from.
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.filename)
    }
}
