use crate::config::env::{self, EnvKey};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

const DEFAULT_RPC_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Where generation work actually runs for this deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Jobs are queued and processed by in-process workers.
    Local,
    /// Jobs are forwarded to the backend mirror's synchronous endpoint.
    Remote,
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ExecutionMode::Local),
            "remote" => Ok(ExecutionMode::Remote),
            other => bail!("Unknown execution strategy '{}', expected 'local' or 'remote'", other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub execution_mode: ExecutionMode,
    pub backend_url: Option<Url>,
    pub rpc_endpoint: Url,
    pub payment_receiver: Option<String>,
    pub min_artifact_bytes: u64,
    pub output_dir: PathBuf,
    pub legacy_output_dirs: Vec<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Url,
    pub llm_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub multi_output: bool,
    pub generation_workers: usize,
    pub max_script_bytes: usize,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            execution_mode: ExecutionMode::Local,
            backend_url: None,
            rpc_endpoint: Url::parse(DEFAULT_RPC_ENDPOINT).expect("static url"),
            payment_receiver: None,
            min_artifact_bytes: 1000,
            output_dir: PathBuf::from("public/generated"),
            legacy_output_dirs: vec![PathBuf::from("src/output"), PathBuf::from("backend/output")],
            openai_api_key: None,
            openai_base_url: Url::parse(DEFAULT_OPENAI_BASE_URL).expect("static url"),
            llm_model: "gpt-4o-mini".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            multi_output: false,
            generation_workers: 1,
            max_script_bytes: 50_000,
            http_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let defaults = Self::default();

        let execution_mode = env::get_or(EnvKey::ExecutionStrategy, "local").parse()?;

        let backend_url = env::get_opt(EnvKey::BackendUrl)
            .map(|raw| Url::parse(&raw).with_context(|| format!("Invalid BACKEND_URL: {}", raw)))
            .transpose()?;

        let rpc_raw = env::get_or(EnvKey::SolanaRpcEndpoint, DEFAULT_RPC_ENDPOINT);
        let rpc_endpoint = Url::parse(&rpc_raw)
            .with_context(|| format!("Invalid SOLANA_RPC_ENDPOINT: {}", rpc_raw))?;

        let openai_raw = env::get_or(EnvKey::OpenAiBaseUrl, DEFAULT_OPENAI_BASE_URL);
        let openai_base_url = Url::parse(&openai_raw)
            .with_context(|| format!("Invalid OPENAI_BASE_URL: {}", openai_raw))?;

        let legacy_output_dirs = match env::get_opt(EnvKey::LegacyOutputDirs) {
            Some(raw) => parse_dir_list(&raw),
            None => defaults.legacy_output_dirs.clone(),
        };

        let config = Self {
            server_port: env::get_parsed(EnvKey::ServerPort, defaults.server_port),
            execution_mode,
            backend_url,
            rpc_endpoint,
            payment_receiver: env::get_opt(EnvKey::PaymentReceiver),
            min_artifact_bytes: env::get_parsed(EnvKey::MinArtifactBytes, defaults.min_artifact_bytes),
            output_dir: env::get_opt(EnvKey::OutputDir)
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            legacy_output_dirs,
            openai_api_key: env::get_opt(EnvKey::OpenAiApiKey),
            openai_base_url,
            llm_model: env::get_or(EnvKey::LlmModel, &defaults.llm_model),
            tts_model: env::get_or(EnvKey::TtsModel, &defaults.tts_model),
            tts_voice: env::get_or(EnvKey::TtsVoice, &defaults.tts_voice),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, &defaults.ffmpeg_path),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, &defaults.ffprobe_path),
            multi_output: env::get_flag(EnvKey::EnableMultiOutput),
            generation_workers: env::get_parsed(EnvKey::GenerationWorkers, defaults.generation_workers).max(1),
            max_script_bytes: env::get_parsed(EnvKey::MaxScriptBytes, defaults.max_script_bytes),
            http_timeout_secs: env::get_parsed(EnvKey::HttpTimeoutSecs, defaults.http_timeout_secs),
        };

        config.check()?;
        Ok(config)
    }

    /// Rejects combinations that cannot serve requests.
    pub fn check(&self) -> Result<()> {
        match self.execution_mode {
            ExecutionMode::Remote if self.backend_url.is_none() => {
                bail!("EXECUTION_STRATEGY=remote requires BACKEND_URL")
            }
            ExecutionMode::Local if self.openai_api_key.is_none() => {
                bail!("EXECUTION_STRATEGY=local requires OPENAI_API_KEY")
            }
            _ => Ok(()),
        }
    }
}

fn parse_dir_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Joins `path` onto `base` without dropping a path prefix on the base.
pub fn endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_execution_mode() {
        assert_eq!("local".parse::<ExecutionMode>().unwrap(), ExecutionMode::Local);
        assert_eq!(" Remote ".parse::<ExecutionMode>().unwrap(), ExecutionMode::Remote);
        assert!("hybrid".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn dir_list_skips_blanks() {
        let dirs = parse_dir_list("src/output, ,backend/output,");
        assert_eq!(dirs, vec![PathBuf::from("src/output"), PathBuf::from("backend/output")]);
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let base = Url::parse("https://mirror.example.com/prefix/").unwrap();
        assert_eq!(endpoint(&base, "/api/generate"), "https://mirror.example.com/prefix/api/generate");

        let bare = Url::parse("https://mirror.example.com").unwrap();
        assert_eq!(endpoint(&bare, "api/videos/x.mp4"), "https://mirror.example.com/api/videos/x.mp4");
    }

    #[test]
    fn remote_mode_needs_backend() {
        let config = AppConfig {
            execution_mode: ExecutionMode::Remote,
            ..AppConfig::default()
        };
        assert!(config.check().is_err());

        let config = AppConfig {
            execution_mode: ExecutionMode::Remote,
            backend_url: Some(Url::parse("http://localhost:4000").unwrap()),
            ..AppConfig::default()
        };
        assert!(config.check().is_ok());
    }
}
