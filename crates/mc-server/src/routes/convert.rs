//! `POST /convert`: upload a media file and convert it synchronously.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use mc_core::{Error, TargetFormat};

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub download_url: String,
}

/// Receive the `video` file part, run the engine, and answer with the
/// artifact's download URL once the engine has exited.
///
/// The format is resolved before the body is read, so an unsupported format
/// never writes anything to disk.
pub async fn convert(
    State(ctx): State<AppContext>,
    Query(query): Query<ConvertQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, AppError> {
    let format = TargetFormat::from_query(query.format.as_deref())?;

    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("Convert request is not multipart: {rejection}");
        Error::NoFileProvided
    })?;

    let upload = ctx.uploads.receive(multipart).await?;
    let artifact = ctx
        .converter
        .convert(&upload, format, ctx.storage.output_dir())
        .await?;

    Ok(Json(ConvertResponse {
        download_url: artifact.download_url(),
    }))
}
