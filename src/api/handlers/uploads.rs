use crate::api::error::AppError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Bytes inspected for content sniffing
const SNIFF_LEN: usize = 8192;

/// Streams a stored upload. No session check: anyone holding the filename
/// can fetch the scan.
#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    params(
        ("filename" = String, Path, description = "Sanitized upload filename")
    ),
    responses(
        (status = 200, description = "Uploaded file"),
        (status = 404, description = "No such upload")
    ),
    tag = "files"
)]
pub async fn uploaded_file(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let path = state
        .uploads
        .resolve(&filename)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Upload '{}' not found", filename)))?;

    stream_file(&path, &filename, None).await
}

/// Streams a file from disk. Without an explicit content type the first bytes
/// are sniffed.
pub(crate) async fn stream_file(
    path: &std::path::Path,
    filename: &str,
    content_type: Option<&str>,
) -> Result<Response, AppError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|_| AppError::NotFound(format!("File '{}' not found", filename)))?;
    let size = file.metadata().await.map_err(anyhow::Error::from)?.len();

    let content_type = match content_type {
        Some(content_type) => content_type.to_string(),
        None => {
            let mut head = vec![0u8; SNIFF_LEN];
            let read = file.read(&mut head).await.map_err(anyhow::Error::from)?;
            head.truncate(read);
            file.rewind().await.map_err(anyhow::Error::from)?;

            infer::get(&head)
                .map(|kind| kind.mime_type().to_string())
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
        }
    };

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        body,
    )
        .into_response())
}
