use super::dto::{
    GenerateVideoRequest, GenerateVideoResponse, StatusResponse, SyncGenerateRequest,
    SyncGenerateResponse,
};
use super::service::VideoService;
use crate::common::response::{ApiError, ErrorBody};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

/// Start a paid video generation in the background
#[utoipa::path(
    post,
    path = "/api/videos/generate",
    request_body = GenerateVideoRequest,
    responses(
        (status = 200, description = "Generation accepted, or already finished", body = GenerateVideoResponse),
        (status = 400, description = "Missing field or unconfirmed payment", body = ErrorBody),
        (status = 500, description = "Generation could not be started", body = ErrorBody)
    ),
    tag = "Videos"
)]
pub async fn generate_video(
    State(state): State<AppState>,
    Json(payload): Json<GenerateVideoRequest>,
) -> Result<Json<GenerateVideoResponse>, ApiError> {
    info!("🎬 Async generation requested");
    VideoService::generate(state, payload).await.map(Json)
}

/// Generate a video and wait for it
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = SyncGenerateRequest,
    responses(
        (status = 200, description = "Video generated", body = SyncGenerateResponse),
        (status = 400, description = "Missing field or unconfirmed payment", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    ),
    tag = "Videos"
)]
pub async fn generate_sync(
    State(state): State<AppState>,
    Json(payload): Json<SyncGenerateRequest>,
) -> Result<Json<SyncGenerateResponse>, ApiError> {
    info!("🎬 Sync generation requested");
    VideoService::generate_sync(state, payload).await.map(Json)
}

/// Poll generation status
#[utoipa::path(
    get,
    path = "/api/videos/status/{id}",
    params(
        ("id" = String, Path, description = "Content ID (the payment signature)")
    ),
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
        (status = 400, description = "Malformed content id", body = ErrorBody)
    ),
    tag = "Videos"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    VideoService::status(state, &id).await.map(Json)
}
