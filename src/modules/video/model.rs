use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::infrastructure::storage::artifacts::ArtifactKind;

pub const MAX_CONTENT_ID_LEN: usize = 128;

/// Content ids double as file stems and URL segments.
pub fn is_valid_content_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_CONTENT_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn content_url(content_id: &str, kind: ArtifactKind) -> String {
    format!("/api/videos/{}", kind.file_name(content_id))
}

/// Which artifacts a finished job is expected to have.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Audio,
    Video,
    Both,
}

impl OutputType {
    /// Reads the `audio_`/`video_`/`both_` id prefix. Without multi-output
    /// support every id is a video.
    pub fn for_content_id(content_id: &str, multi_output: bool) -> Self {
        if !multi_output {
            return OutputType::Video;
        }
        if content_id.starts_with("audio_") {
            OutputType::Audio
        } else if content_id.starts_with("both_") {
            OutputType::Both
        } else {
            OutputType::Video
        }
    }

    pub fn needs_audio(&self) -> bool {
        matches!(self, OutputType::Audio | OutputType::Both)
    }

    pub fn needs_video(&self) -> bool {
        matches!(self, OutputType::Video | OutputType::Both)
    }

    pub fn is_ready(&self, has_audio: bool, has_video: bool) -> bool {
        (!self.needs_audio() || has_audio) && (!self.needs_video() || has_video)
    }
}

/// Status reported to polling clients.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub content_id: String,
    pub title: String,
    pub wallet_address: String,
    pub state: JobState,
    pub error: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl JobRecord {
    pub fn queued(content_id: &str, title: &str, wallet_address: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            content_id: content_id.to_string(),
            title: title.to_string(),
            wallet_address: wallet_address.to_string(),
            state: JobState::Queued,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
