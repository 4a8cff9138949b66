use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

use super::planner::plan;
use crate::infrastructure::render::ffmpeg::RenderJob;
use crate::infrastructure::storage::artifacts::ArtifactKind;
use crate::modules::narration::service::NarrationService;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub duration: f64,
    pub scenes: usize,
    pub size_bytes: u64,
}

pub struct CompositionService;

impl CompositionService {
    /// Renders `display_script` over the narration audio into `output`.
    ///
    /// Fails when the renderer leaves no file or one below the minimum video
    /// size, even if it reported success.
    pub async fn render(
        state: &AppState,
        display_script: &str,
        narration: &str,
        audio_path: &Path,
        output: &Path,
    ) -> Result<RenderOutcome> {
        let duration = state
            .renderer
            .probe_duration(audio_path)
            .await
            .context("Failed to read narration length")?;

        let segments = NarrationService::segments(narration);
        let scenes = plan(display_script, &segments, duration);
        let scene_count = scenes.len();

        let job = RenderJob {
            scenes,
            audio_path: audio_path.to_path_buf(),
            duration,
            output_path: output.to_path_buf(),
        };
        state.renderer.render(&job).await.context("Video rendering failed")?;

        let size_bytes = match tokio::fs::metadata(output).await {
            Ok(meta) => meta.len(),
            Err(_) => bail!("Renderer finished but wrote no video"),
        };
        let min = state.storage.min_bytes(ArtifactKind::Video);
        if size_bytes < min {
            bail!("Rendered video is too small ({} bytes, need at least {})", size_bytes, min);
        }

        info!("🎞️ Rendered {} scenes, {:.1}s, {} bytes", scene_count, duration, size_bytes);
        Ok(RenderOutcome {
            duration,
            scenes: scene_count,
            size_bytes,
        })
    }
}
