//! Upload receiver.
//!
//! Streams the single `video` file field of a multipart request into the
//! incoming-uploads directory under a fresh identifier, enforcing the
//! configured size ceiling while writing.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;

use mc_core::{Error, Result, UploadId, UploadedFile};

use crate::storage::StorageLayout;

/// Name of the multipart field carrying the media file.
pub const FILE_FIELD: &str = "video";

#[derive(Debug, Clone)]
pub struct UploadReceiver {
    storage: StorageLayout,
    max_bytes: u64,
}

impl UploadReceiver {
    pub fn new(storage: StorageLayout, max_bytes: u64) -> Self {
        Self { storage, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Persist the request's file part and describe what was written.
    ///
    /// Text fields are skipped. A second file part, or a file part under any
    /// name other than [`FILE_FIELD`], is a `Validation` error. On any error
    /// nothing is left behind in the upload directory.
    pub async fn receive(&self, mut multipart: Multipart) -> Result<UploadedFile> {
        let mut received: Option<UploadedFile> = None;

        let outcome = self.read_fields(&mut multipart, &mut received).await;
        match (outcome, received) {
            (Ok(()), Some(upload)) => Ok(upload),
            (Ok(()), None) => Err(Error::NoFileProvided),
            (Err(e), upload) => {
                if let Some(upload) = upload {
                    discard(&upload.path).await;
                }
                Err(e)
            }
        }
    }

    async fn read_fields(
        &self,
        multipart: &mut Multipart,
        received: &mut Option<UploadedFile>,
    ) -> Result<()> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| self.multipart_error(e))?
        {
            // Browsers send `filename=""` with no bytes when no file was chosen.
            if matches!(field.file_name(), None | Some("")) {
                tracing::debug!(field = ?field.name(), "Skipping non-file multipart field");
                continue;
            }

            let name = field.name().unwrap_or_default().to_string();
            if name != FILE_FIELD {
                return Err(Error::Validation(format!(
                    "unexpected file field '{name}' (expected '{FILE_FIELD}')"
                )));
            }
            if received.is_some() {
                return Err(Error::Validation(format!(
                    "only one '{FILE_FIELD}' file may be uploaded per request"
                )));
            }

            *received = Some(self.persist(field).await?);
        }
        Ok(())
    }

    async fn persist(&self, field: Field<'_>) -> Result<UploadedFile> {
        let id = UploadId::new();
        let original_name = field.file_name().map(String::from);
        let extension = original_name
            .as_deref()
            .and_then(UploadedFile::preserved_extension);
        let path = self
            .storage
            .upload_dir()
            .join(UploadedFile::stored_name(id, extension.as_deref()));

        match self.write_to(field, &path).await {
            Ok(size) => {
                tracing::info!(
                    upload_id = %id,
                    original_name = original_name.as_deref().unwrap_or(""),
                    size,
                    "Upload stored"
                );
                Ok(UploadedFile {
                    id,
                    path,
                    extension,
                    original_name,
                    size,
                })
            }
            Err(e) => {
                discard(&path).await;
                Err(e)
            }
        }
    }

    async fn write_to(&self, mut field: Field<'_>, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut size: u64 = 0;

        while let Some(chunk) = field.chunk().await.map_err(|e| self.multipart_error(e))? {
            size += chunk.len() as u64;
            if size > self.max_bytes {
                tracing::warn!(limit = self.max_bytes, "Upload exceeded size ceiling");
                return Err(Error::PayloadTooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(size)
    }

    fn multipart_error(&self, err: MultipartError) -> Error {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge {
                limit: self.max_bytes,
            }
        } else {
            Error::Validation(format!("malformed multipart body: {}", err.body_text()))
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove rejected upload {}: {e}", path.display());
        }
    }
}
