use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod dto;
pub mod events;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod stream_handler;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handler::generate_sync))
        .route("/videos/generate", post(handler::generate_video))
        .route("/videos/status/{id}", get(handler::get_status))
        .route("/videos/{file}", get(stream_handler::serve_video))
}
