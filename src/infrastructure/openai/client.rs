use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};
use url::Url;

use crate::config::settings::endpoint;

/// Text completion given a system instruction and a user prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Renders `text` as speech into an audio file at `output`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI-compatible chat and speech endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    chat_model: String,
    speech_model: String,
    voice: String,
}

impl OpenAiClient {
    pub fn new(
        client: Client,
        base_url: Url,
        api_key: String,
        chat_model: String,
        speech_model: String,
        voice: String,
    ) -> Self {
        info!("✅ OpenAI client ready (chat: {}, speech: {}/{})", chat_model, speech_model, voice);
        Self {
            client,
            base_url,
            api_key,
            chat_model,
            speech_model,
            voice,
        }
    }

    async fn api_failure(resp: reqwest::Response, what: &str) -> anyhow::Error {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        error!("OpenAI {} failed ({}): {}", what, status, message);
        anyhow!("OpenAI {} failed ({}): {}", what, status, message)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.4,
        };

        let resp = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        if resp.status() != StatusCode::OK {
            return Err(Self::api_failure(resp, "chat completion").await);
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("Chat completion returned malformed JSON")?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Chat completion returned no content"))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        if text.trim().is_empty() {
            bail!("Cannot synthesize speech from empty text");
        }

        let request = SpeechRequest {
            model: &self.speech_model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let resp = self
            .client
            .post(endpoint(&self.base_url, "audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Speech request failed")?;

        if !resp.status().is_success() {
            return Err(Self::api_failure(resp, "speech").await);
        }

        let audio = resp.bytes().await.context("Failed to read speech audio")?;
        if audio.is_empty() {
            bail!("Speech service returned no audio");
        }

        tokio::fs::write(output, &audio)
            .await
            .with_context(|| format!("Failed to write audio to {}", output.display()))?;

        info!("Synthesized {} bytes of speech", audio.len());
        Ok(())
    }
}
