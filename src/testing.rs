//! In-memory stand-ins for the external services, shared by unit tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::config::settings::AppConfig;
use crate::infrastructure::backend::client::GenerationBackend;
use crate::infrastructure::ledger::solana::PaymentLedger;
use crate::infrastructure::openai::client::{LanguageModel, SpeechSynthesizer};
use crate::infrastructure::queue::channel::GenerationQueue;
use crate::infrastructure::render::ffmpeg::{RenderJob, VideoRenderer};
use crate::infrastructure::storage::artifacts::ArtifactStore;
use crate::modules::video::dto::{SyncGenerateRequest, SyncGenerateResponse, VideoStats};
use crate::modules::video::repository::JobRepository;
use crate::modules::video::service::ExecutionStrategy;
use crate::state::AppState;

pub struct FakeLedger {
    confirm: bool,
    pub calls: AtomicUsize,
}

impl FakeLedger {
    pub fn confirming() -> Self {
        Self {
            confirm: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            confirm: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentLedger for FakeLedger {
    async fn is_confirmed(&self, _signature: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirm)
    }
}

pub struct FakeLanguageModel {
    reply: Option<String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl FakeLanguageModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        self.reply.clone().ok_or_else(|| anyhow!("model unavailable"))
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        tokio::fs::write(output, b"ID3 fake narration audio").await?;
        Ok(())
    }
}

pub struct FakeRenderer {
    /// Bytes written to the output; zero writes no file at all.
    size: usize,
    pub jobs: Mutex<Vec<RenderJob>>,
}

impl FakeRenderer {
    pub fn writing(size: usize) -> Self {
        Self {
            size,
            jobs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VideoRenderer for FakeRenderer {
    async fn probe_duration(&self, _audio: &Path) -> Result<f64> {
        Ok(6.0)
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.size > 0 {
            tokio::fs::write(&job.output_path, vec![0u8; self.size]).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub requests: Mutex<Vec<SyncGenerateRequest>>,
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(&self, req: &SyncGenerateRequest) -> Result<SyncGenerateResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let id = req.transaction_signature.clone().unwrap_or_default();
        Ok(SyncGenerateResponse {
            video_url: format!("/api/videos/{}.mp4", id),
            message: "Video generated successfully".to_string(),
            video_stats: Some(VideoStats {
                size_bytes: 4096,
                duration_seconds: 6.0,
                segments: 2,
            }),
        })
    }
}

/// An `AppState` wired to fakes inside a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub state: AppState,
    pub ledger: Arc<FakeLedger>,
    pub llm: Arc<FakeLanguageModel>,
    pub speech: Arc<FakeSpeech>,
    pub renderer: Arc<FakeRenderer>,
    pub backend: Arc<FakeBackend>,
    pub queue: GenerationQueue,
}

struct Parts {
    ledger: FakeLedger,
    llm: FakeLanguageModel,
    renderer: FakeRenderer,
    multi_output: bool,
    remote: bool,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            ledger: FakeLedger::confirming(),
            llm: FakeLanguageModel::replying("First we log a greeting. [PAUSE] Then we say goodbye. [PAUSE]"),
            renderer: FakeRenderer::writing(4096),
            multi_output: false,
            remote: false,
        }
    }
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::build(Parts::default()).await
    }

    pub async fn with_ledger(ledger: FakeLedger) -> Self {
        Self::build(Parts {
            ledger,
            ..Parts::default()
        })
        .await
    }

    pub async fn with_llm(llm: FakeLanguageModel) -> Self {
        Self::build(Parts {
            llm,
            ..Parts::default()
        })
        .await
    }

    pub async fn with_renderer(renderer: FakeRenderer) -> Self {
        Self::build(Parts {
            renderer,
            ..Parts::default()
        })
        .await
    }

    pub async fn with_multi_output() -> Self {
        Self::build(Parts {
            multi_output: true,
            ..Parts::default()
        })
        .await
    }

    pub async fn remote() -> Self {
        Self::build(Parts {
            remote: true,
            ..Parts::default()
        })
        .await
    }

    async fn build(parts: Parts) -> Self {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            output_dir: dir.path().join("public/generated"),
            legacy_output_dirs: vec![dir.path().join("src/output"), dir.path().join("backend/output")],
            multi_output: parts.multi_output,
            ..AppConfig::default()
        };

        let storage = ArtifactStore::new(
            config.output_dir.clone(),
            config.legacy_output_dirs.clone(),
            config.min_artifact_bytes,
        )
        .await
        .unwrap();

        let ledger = Arc::new(parts.ledger);
        let llm = Arc::new(parts.llm);
        let speech = Arc::new(FakeSpeech::default());
        let renderer = Arc::new(parts.renderer);
        let backend = Arc::new(FakeBackend::default());
        let queue = GenerationQueue::new();

        let executor = if parts.remote {
            ExecutionStrategy::Remote(backend.clone())
        } else {
            ExecutionStrategy::Local(queue.clone())
        };

        let state = AppState {
            config,
            storage,
            jobs: JobRepository::new(),
            ledger: ledger.clone(),
            llm: llm.clone(),
            speech: speech.clone(),
            renderer: renderer.clone(),
            executor,
            mirror: None,
        };

        Self {
            dir,
            state,
            ledger,
            llm,
            speech,
            renderer,
            backend,
            queue,
        }
    }
}
