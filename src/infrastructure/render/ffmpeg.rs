use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FONT_SIZE: u32 = 26;
const LINE_SPACING: u32 = 10;
const BACKGROUND: &str = "0x1e1e2e";
const FOREGROUND: &str = "0xcdd6f4";

/// One block of display text shown over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub scenes: Vec<Scene>,
    pub audio_path: PathBuf,
    pub duration: f64,
    pub output_path: PathBuf,
}

#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Length of the audio file in seconds.
    async fn probe_duration(&self, audio: &Path) -> Result<f64>;

    async fn render(&self, job: &RenderJob) -> Result<()>;
}

#[derive(Clone)]
pub struct FfmpegRenderer {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegRenderer {
    pub fn new(ffmpeg: String, ffprobe: String) -> Self {
        Self { ffmpeg, ffprobe }
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(audio)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffprobe))?;

        if !output.status.success() {
            bail!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        let output_dir = job
            .output_path
            .parent()
            .ok_or_else(|| anyhow!("Output path has no parent directory"))?;

        // One textfile per scene; with expansion off drawtext shows the bytes verbatim.
        let mut text_files = Vec::with_capacity(job.scenes.len());
        for (i, scene) in job.scenes.iter().enumerate() {
            let path = output_dir.join(format!(
                ".{}.scene{}.txt",
                job.output_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                i
            ));
            tokio::fs::write(&path, &scene.text)
                .await
                .with_context(|| format!("Failed to write scene text {}", path.display()))?;
            text_files.push(path);
        }

        let filter = build_filter(&job.scenes, &text_files);
        let background = format!("color=c={}:s={}x{}:r=30:d={:.3}", BACKGROUND, WIDTH, HEIGHT, job.duration);

        info!(
            "🎬 Rendering {} scenes ({:.1}s) into {}",
            job.scenes.len(),
            job.duration,
            job.output_path.display()
        );

        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-f", "lavfi", "-i", &background, "-i"])
            .arg(&job.audio_path)
            .args([
                "-filter_complex", &filter,
                "-map", "[v]",
                "-map", "1:a",
                "-c:v", "libx264",
                "-preset", "fast",
                "-pix_fmt", "yuv420p",
                "-c:a", "aac",
                "-shortest",
                "-f", "mp4",
            ])
            .arg(&job.output_path)
            .output()
            .await;

        for path in &text_files {
            let _ = tokio::fs::remove_file(path).await;
        }

        let output = result.with_context(|| format!("Failed to run {}", self.ffmpeg))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            error!("FFmpeg failed to render: {}", tail);
            return Err(anyhow!("FFmpeg failed to render video: {}", tail));
        }

        Ok(())
    }
}

fn parse_duration(raw: &str) -> Result<f64> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Unexpected ffprobe duration output: {:?}", raw.trim()))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("Audio has no playable duration ({})", seconds);
    }
    Ok(seconds)
}

/// Scenes scroll upward slowly across their window and are only drawn while active.
fn build_filter(scenes: &[Scene], text_files: &[PathBuf]) -> String {
    let mut chain = String::from("[0:v]");

    for (i, (scene, file)) in scenes.iter().zip(text_files).enumerate() {
        if i > 0 {
            chain.push(',');
        }
        let span = (scene.end - scene.start).max(0.001);
        chain.push_str(&format!(
            "drawtext=textfile='{}':fontcolor={}:fontsize={}:line_spacing={}:x=60:y=80-40*(t-{:.3})/{:.3}:expansion=none:enable='between(t,{:.3},{:.3})'",
            escape_filter_path(file),
            FOREGROUND,
            FONT_SIZE,
            LINE_SPACING,
            scene.start,
            span,
            scene.start,
            scene.end
        ));
    }

    if scenes.is_empty() {
        chain.push_str("null");
    }
    chain.push_str("[v]");
    chain
}

fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}
