use utoipa::OpenApi;
use crate::common::response::{ErrorBody, NotFoundBody};
use crate::modules::video::dto::*;
use crate::modules::video::model::{ContentStatus, OutputType};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::generate_video,
        crate::modules::video::handler::generate_sync,
        crate::modules::video::handler::get_status,
        crate::modules::video::stream_handler::serve_video,
    ),
    components(
        schemas(
            GenerateVideoRequest, GenerateVideoResponse,
            SyncGenerateRequest, SyncGenerateResponse, VideoStats,
            StatusResponse, OutputType, ContentStatus,
            ErrorBody, NotFoundBody,
        )
    ),
    tags(
        (name = "Videos", description = "Paid narrated code video generation")
    )
)]
pub struct ApiDoc;
