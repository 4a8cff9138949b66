use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::settings::{AppConfig, ExecutionMode};
use crate::infrastructure::backend::client::RemoteBackend;
use crate::infrastructure::ledger::solana::{PaymentLedger, SolanaRpcLedger};
use crate::infrastructure::openai::client::{LanguageModel, OpenAiClient, SpeechSynthesizer};
use crate::infrastructure::queue::channel::GenerationQueue;
use crate::infrastructure::render::ffmpeg::{FfmpegRenderer, VideoRenderer};
use crate::infrastructure::storage::artifacts::ArtifactStore;
use crate::modules::video::repository::JobRepository;
use crate::modules::video::service::ExecutionStrategy;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: ArtifactStore,
    pub jobs: JobRepository,
    pub ledger: Arc<dyn PaymentLedger>,
    pub llm: Arc<dyn LanguageModel>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub executor: ExecutionStrategy,
    /// Backend mirror consulted when an artifact is not on local disk.
    pub mirror: Option<RemoteBackend>,
}

impl AppState {
    /// Wires the production collaborators described by `config`.
    pub async fn init(config: AppConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let storage = ArtifactStore::new(
            config.output_dir.clone(),
            config.legacy_output_dirs.clone(),
            config.min_artifact_bytes,
        )
        .await?;

        let ledger = Arc::new(SolanaRpcLedger::new(
            http.clone(),
            config.rpc_endpoint.clone(),
            config.payment_receiver.clone(),
        ));

        if config.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set, inline generation on this instance will fail");
        }
        let openai = Arc::new(OpenAiClient::new(
            http.clone(),
            config.openai_base_url.clone(),
            config.openai_api_key.clone().unwrap_or_default(),
            config.llm_model.clone(),
            config.tts_model.clone(),
            config.tts_voice.clone(),
        ));

        let renderer = Arc::new(FfmpegRenderer::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
        ));

        let mirror = config
            .backend_url
            .clone()
            .map(|url| RemoteBackend::new(http.clone(), url));

        let executor = match config.execution_mode {
            ExecutionMode::Local => ExecutionStrategy::Local(GenerationQueue::new()),
            ExecutionMode::Remote => {
                let backend = mirror
                    .clone()
                    .ok_or_else(|| anyhow!("EXECUTION_STRATEGY=remote requires BACKEND_URL"))?;
                ExecutionStrategy::Remote(Arc::new(backend))
            }
        };

        Ok(Self {
            config,
            storage,
            jobs: JobRepository::new(),
            ledger,
            llm: openai.clone(),
            speech: openai,
            renderer,
            executor,
            mirror,
        })
    }
}
