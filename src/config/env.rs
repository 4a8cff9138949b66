use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    ExecutionStrategy,
    BackendUrl,
    SolanaRpcEndpoint,
    PaymentReceiver,
    MinArtifactBytes,
    OutputDir,
    LegacyOutputDirs,
    OpenAiApiKey,
    OpenAiBaseUrl,
    LlmModel,
    TtsModel,
    TtsVoice,
    FfmpegPath,
    FfprobePath,
    EnableMultiOutput,
    GenerationWorkers,
    MaxScriptBytes,
    HttpTimeoutSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::ExecutionStrategy => "EXECUTION_STRATEGY",
            EnvKey::BackendUrl => "BACKEND_URL",
            EnvKey::SolanaRpcEndpoint => "SOLANA_RPC_ENDPOINT",
            EnvKey::PaymentReceiver => "PAYMENT_RECEIVER",
            EnvKey::MinArtifactBytes => "MIN_ARTIFACT_BYTES",
            EnvKey::OutputDir => "OUTPUT_DIR",
            EnvKey::LegacyOutputDirs => "LEGACY_OUTPUT_DIRS",
            EnvKey::OpenAiApiKey => "OPENAI_API_KEY",
            EnvKey::OpenAiBaseUrl => "OPENAI_BASE_URL",
            EnvKey::LlmModel => "LLM_MODEL",
            EnvKey::TtsModel => "TTS_MODEL",
            EnvKey::TtsVoice => "TTS_VOICE",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::EnableMultiOutput => "ENABLE_MULTI_OUTPUT",
            EnvKey::GenerationWorkers => "GENERATION_WORKERS",
            EnvKey::MaxScriptBytes => "MAX_SCRIPT_BYTES",
            EnvKey::HttpTimeoutSecs => "HTTP_TIMEOUT_SECS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values both read as `None`.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

pub fn get_flag(key: EnvKey) -> bool {
    matches!(
        get_or(key, "false").trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
