use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::model::is_valid_content_id;
use crate::common::response::{ApiError, ErrorBody, NotFoundBody};
use crate::infrastructure::storage::artifacts::ArtifactKind;
use crate::state::AppState;

const CACHE_CONTROL: &str = "public, max-age=3600";

/// Splits `abc123.mp4` into the id and artifact kind. A bare id means video.
fn parse_file_name(file: &str) -> Option<(&str, ArtifactKind)> {
    let (id, kind) = match file.rsplit_once('.') {
        Some((id, ext)) => (id, ArtifactKind::from_extension(ext)?),
        None => (file, ArtifactKind::Video),
    };
    is_valid_content_id(id).then_some((id, kind))
}

/// Serve a generated artifact
///
/// Streams from local storage first, then from the backend mirror when one is
/// configured.
#[utoipa::path(
    get,
    path = "/api/videos/{file}",
    params(
        ("file" = String, Path, description = "Content ID with optional .mp4 or .mp3 extension")
    ),
    responses(
        (status = 200, description = "Artifact bytes"),
        (status = 400, description = "Malformed file name", body = ErrorBody),
        (status = 404, description = "No artifact in any known location", body = NotFoundBody)
    ),
    tag = "Videos"
)]
pub async fn serve_video(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let (content_id, kind) = parse_file_name(&file)
        .ok_or_else(|| ApiError::Validation(format!("Invalid file name: {}", file)))?;

    // 1. Local storage, base directory then legacy locations
    if let Some(path) = state.storage.find(content_id, kind).await {
        let handle = tokio::fs::File::open(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to open {}: {}", path.display(), e)))?;
        let size = handle
            .metadata()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to stat {}: {}", path.display(), e)))?
            .len();

        let content_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("video/mp4");

        info!(content_id, size, "📤 Serving {}", path.display());

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, size)
            .header(header::CACHE_CONTROL, CACHE_CONTROL);
        if kind == ArtifactKind::Video {
            builder = builder.header(header::ACCEPT_RANGES, "bytes");
        }

        return builder
            .body(Body::from_stream(ReaderStream::new(handle)))
            .map_err(|e| ApiError::Internal(e.to_string()));
    }

    // 2. Backend mirror
    if let Some(mirror) = &state.mirror {
        match mirror.fetch_artifact(&kind.file_name(content_id)).await {
            Ok(Some(artifact)) => {
                info!(content_id, "📤 Proxying artifact from backend mirror");

                let content_type = artifact.content_type.unwrap_or_else(|| {
                    mime_guess::from_ext(kind.extension())
                        .first_or_octet_stream()
                        .to_string()
                });
                let mut builder = Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CACHE_CONTROL, CACHE_CONTROL);
                if let Some(len) = artifact.content_length {
                    builder = builder.header(header::CONTENT_LENGTH, len);
                }

                return builder
                    .body(Body::from_stream(artifact.stream))
                    .map_err(|e| ApiError::Internal(e.to_string()));
            }
            Ok(None) => {}
            Err(e) => warn!(content_id, "Backend mirror lookup failed: {:#}", e),
        }
    }

    Err(ApiError::NotFound {
        content_id: content_id.to_string(),
        searched_paths: state
            .storage
            .searched_paths(content_id, kind)
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    })
}
