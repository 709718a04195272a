//! Artifact publisher: resolves download names and streams artifacts.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tokio_util::io::ReaderStream;

use mc_core::{Error, Result, TargetFormat};

use crate::storage::StorageLayout;

/// Serves files out of the output directory by name.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    storage: StorageLayout,
}

/// An opened artifact ready to be streamed.
#[derive(Debug)]
pub struct ArtifactStream {
    pub filename: String,
    pub path: PathBuf,
    pub len: u64,
    file: tokio::fs::File,
}

impl ArtifactPublisher {
    pub fn new(storage: StorageLayout) -> Self {
        Self { storage }
    }

    /// Open the artifact named `requested`.
    ///
    /// Directory segments are stripped before the lookup, so the result is
    /// always a regular file directly inside the output directory. Files are
    /// never removed after being served.
    pub async fn fetch(&self, requested: &str) -> Result<ArtifactStream> {
        let not_found = || Error::not_found("artifact", requested);

        let path = self.storage.artifact_path(requested).ok_or_else(not_found)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let file = tokio::fs::File::open(&path).await?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(ArtifactStream {
            filename,
            path,
            len: meta.len(),
            file,
        })
    }
}

impl ArtifactStream {
    pub fn content_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("mp3") => TargetFormat::Audio.content_type(),
            Some("mp4") => TargetFormat::Video.content_type(),
            _ => "application/octet-stream",
        }
    }

    fn content_disposition(&self) -> HeaderValue {
        let safe: String = self
            .filename
            .chars()
            .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
            .collect();
        HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
    }
}

impl IntoResponse for ArtifactStream {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        let disposition = self.content_disposition();
        let filename = self.filename;

        let stream = ReaderStream::new(self.file).inspect_err(move |e| {
            tracing::error!(filename = %filename, "Error while streaming artifact: {e}");
        });

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                (header::CONTENT_LENGTH, HeaderValue::from(self.len)),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            Body::from_stream(stream),
        )
            .into_response()
    }
}
