use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::dto::{
    GenerateVideoRequest, GenerateVideoResponse, GenerationInput, StatusResponse,
    SyncGenerateRequest, SyncGenerateResponse, VideoStats,
};
use super::events::GenerationJob;
use super::model::{
    ContentStatus, JobRecord, JobState, OutputType, content_url, is_valid_content_id,
};
use crate::common::response::ApiError;
use crate::infrastructure::backend::client::GenerationBackend;
use crate::infrastructure::queue::channel::GenerationQueue;
use crate::infrastructure::storage::artifacts::ArtifactKind;
use crate::modules::composition::service::CompositionService;
use crate::modules::narration::service::NarrationService;
use crate::state::AppState;

const WORDS_PER_MINUTE: usize = 150;
const MIN_ESTIMATED_SECONDS: u32 = 5;

/// How accepted jobs get executed; fixed for the lifetime of the process.
#[derive(Clone)]
pub enum ExecutionStrategy {
    Local(GenerationQueue),
    Remote(Arc<dyn GenerationBackend>),
}

impl ExecutionStrategy {
    pub fn is_remote(&self) -> bool {
        matches!(self, ExecutionStrategy::Remote(_))
    }
}

pub struct VideoService;

impl VideoService {
    fn estimate_duration(script: &str) -> u32 {
        let words = script.split_whitespace().count();
        let seconds = (words * 60).div_ceil(WORDS_PER_MINUTE) as u32;
        seconds.max(MIN_ESTIMATED_SECONDS)
    }

    async fn verify_payment(state: &AppState, signature: &str) -> Result<(), ApiError> {
        let confirmed = state
            .ledger
            .is_confirmed(signature)
            .await
            .map_err(ApiError::from)?;

        if !confirmed {
            warn!(signature, "Payment not found at confirmed commitment");
            return Err(ApiError::PaymentVerification);
        }
        Ok(())
    }

    // --- ORCHESTRATION ---

    /// Accepts a paid generation request and starts it in the background.
    pub async fn generate(state: AppState, req: GenerateVideoRequest) -> Result<GenerateVideoResponse, ApiError> {
        let input = req.into_input(state.config.max_script_bytes)?;
        Self::verify_payment(&state, &input.signature).await?;

        let content_id = input.signature.clone();
        let duration = Self::estimate_duration(&input.script);
        let output_type = OutputType::for_content_id(&content_id, state.config.multi_output);
        let primary = if output_type.needs_video() {
            ArtifactKind::Video
        } else {
            ArtifactKind::Audio
        };
        let respond = |record: &JobRecord, status: ContentStatus| GenerateVideoResponse {
            success: true,
            content_id: record.content_id.clone(),
            title: record.title.clone(),
            output_type,
            duration,
            created_at: record.created_at,
            content_url: content_url(&record.content_id, primary),
            status,
        };

        let existing = state.jobs.get(&content_id).await;
        if Self::is_finished(&state, &content_id, output_type, existing.as_ref()).await {
            info!(content_id = %content_id, "Content already generated, not regenerating");
            let record = existing.unwrap_or_else(|| {
                JobRecord::queued(&content_id, &input.title, &input.wallet_address)
            });
            return Ok(respond(&record, ContentStatus::Completed));
        }

        let record = match state
            .jobs
            .claim(JobRecord::queued(&content_id, &input.title, &input.wallet_address))
            .await
        {
            Ok(record) => record,
            Err(existing) => {
                info!(content_id = %content_id, state = ?existing.state, "Generation already in flight");
                return Ok(respond(&existing, ContentStatus::Processing));
            }
        };

        if let Err(e) = Self::dispatch(&state, &input).await {
            state.jobs.mark_failed(&content_id, format!("{:#}", e)).await;
            return Err(ApiError::generation(&e));
        }

        info!(content_id = %content_id, title = %record.title, "🚀 Generation started");
        Ok(respond(&record, ContentStatus::Processing))
    }

    /// Every artifact the output type needs is stored locally.
    async fn artifacts_ready(state: &AppState, content_id: &str, output_type: OutputType) -> bool {
        let has_audio = output_type.needs_audio()
            && state.storage.find(content_id, ArtifactKind::Audio).await.is_some();
        let has_video = output_type.needs_video()
            && state.storage.find(content_id, ArtifactKind::Video).await.is_some();
        output_type.is_ready(has_audio, has_video)
    }

    /// Remote artifacts are only reachable through the mirror proxy, so the
    /// backend's success is the completion signal under that strategy.
    fn remote_succeeded(state: &AppState, job: Option<&JobRecord>) -> bool {
        state.executor.is_remote() && job.is_some_and(|j| j.state == JobState::Succeeded)
    }

    async fn is_finished(
        state: &AppState,
        content_id: &str,
        output_type: OutputType,
        job: Option<&JobRecord>,
    ) -> bool {
        Self::remote_succeeded(state, job)
            || Self::artifacts_ready(state, content_id, output_type).await
    }

    async fn dispatch(state: &AppState, input: &GenerationInput) -> Result<()> {
        match &state.executor {
            ExecutionStrategy::Local(queue) => queue.publish(GenerationJob::from(input)).await,
            ExecutionStrategy::Remote(backend) => {
                let backend = Arc::clone(backend);
                let jobs = state.jobs.clone();
                let request = SyncGenerateRequest::from(input);
                let content_id = input.signature.clone();

                tokio::spawn(async move {
                    jobs.mark_running(&content_id).await;
                    match backend.generate(&request).await {
                        Ok(reply) => {
                            info!(content_id = %content_id, url = %reply.video_url, "✅ Remote generation finished");
                            jobs.mark_succeeded(&content_id).await;
                        }
                        Err(e) => {
                            error!(content_id = %content_id, "❌ Remote generation failed: {:#}", e);
                            jobs.mark_failed(&content_id, format!("{:#}", e)).await;
                        }
                    }
                });
                Ok(())
            }
        }
    }

    /// Runs the whole pipeline inline and answers once the video exists.
    pub async fn generate_sync(state: AppState, req: SyncGenerateRequest) -> Result<SyncGenerateResponse, ApiError> {
        let input = req.into_input(state.config.max_script_bytes)?;
        Self::verify_payment(&state, &input.signature).await?;

        let content_id = input.signature.clone();
        let video_url = content_url(&content_id, ArtifactKind::Video);

        if let Some(path) = state.storage.find(&content_id, ArtifactKind::Video).await {
            let size_bytes = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            return Ok(SyncGenerateResponse {
                video_url,
                message: "Video already generated".to_string(),
                video_stats: Some(VideoStats {
                    size_bytes,
                    duration_seconds: 0.0,
                    segments: 0,
                }),
            });
        }
        if Self::remote_succeeded(&state, state.jobs.get(&content_id).await.as_ref()) {
            return Ok(SyncGenerateResponse {
                video_url,
                message: "Video already generated".to_string(),
                video_stats: None,
            });
        }

        if let Err(existing) = state
            .jobs
            .claim(JobRecord::queued(&content_id, &input.title, &input.wallet_address))
            .await
        {
            return Err(ApiError::Validation(format!(
                "Generation for {} is already in progress",
                existing.content_id
            )));
        }

        let job = GenerationJob::from(&input);
        let stats = Self::execute(&state, &job)
            .await
            .map_err(|e| ApiError::generation(&e))?;

        Ok(SyncGenerateResponse {
            video_url,
            message: "Video generated successfully".to_string(),
            video_stats: Some(stats),
        })
    }

    /// Runs a claimed job and records its outcome.
    pub async fn execute(state: &AppState, job: &GenerationJob) -> Result<VideoStats> {
        state.jobs.mark_running(&job.content_id).await;

        match Self::run_pipeline(state, job).await {
            Ok(stats) => {
                state.jobs.mark_succeeded(&job.content_id).await;
                Ok(stats)
            }
            Err(e) => {
                error!(content_id = %job.content_id, "❌ Generation failed: {:#}", e);
                state.jobs.mark_failed(&job.content_id, format!("{:#}", e)).await;
                Err(e)
            }
        }
    }

    /// Narration, speech, render, then publish into the artifact store.
    pub async fn run_pipeline(state: &AppState, job: &GenerationJob) -> Result<VideoStats> {
        let content_id = job.content_id.as_str();
        info!(content_id, "Processing job: {}", job.title);

        let narration = NarrationService::enhance(state, &job.script).await?;

        let audio_staged = state.storage.staging_path(content_id, ArtifactKind::Audio);
        let video_staged = state.storage.staging_path(content_id, ArtifactKind::Video);

        let result: Result<VideoStats> = async {
            NarrationService::generate_speech(state, &narration, &audio_staged).await?;

            let outcome = CompositionService::render(
                state,
                &job.script,
                &narration,
                &audio_staged,
                &video_staged,
            )
            .await?;

            state
                .storage
                .commit(&video_staged, content_id, ArtifactKind::Video)
                .await
                .context("Failed to publish video")?;

            if state.config.multi_output {
                state
                    .storage
                    .commit(&audio_staged, content_id, ArtifactKind::Audio)
                    .await
                    .context("Failed to publish narration audio")?;
            }

            Ok(VideoStats {
                size_bytes: outcome.size_bytes,
                duration_seconds: outcome.duration,
                segments: outcome.scenes,
            })
        }
        .await;

        state.storage.discard(&audio_staged).await;
        state.storage.discard(&video_staged).await;

        result
    }

    // --- STATUS ---

    pub async fn status(state: AppState, content_id: &str) -> Result<StatusResponse, ApiError> {
        if !is_valid_content_id(content_id) {
            return Err(ApiError::Validation("Invalid content id".to_string()));
        }

        let output_type = OutputType::for_content_id(content_id, state.config.multi_output);

        let job = state.jobs.get(content_id).await;
        let ready = Self::is_finished(&state, content_id, output_type, job.as_ref()).await;
        let mut error = None;

        let status = if ready {
            ContentStatus::Completed
        } else {
            match job {
                Some(job) if job.state == JobState::Failed => {
                    error = job.error;
                    ContentStatus::Failed
                }
                _ => ContentStatus::Processing,
            }
        };

        let (content_url, audio_url) = if ready {
            (
                output_type
                    .needs_video()
                    .then(|| content_url(content_id, ArtifactKind::Video)),
                output_type
                    .needs_audio()
                    .then(|| content_url(content_id, ArtifactKind::Audio)),
            )
        } else {
            (None, None)
        };

        Ok(StatusResponse {
            content_id: content_id.to_string(),
            output_type,
            status,
            ready,
            content_url,
            audio_url,
            error,
        })
    }
}
