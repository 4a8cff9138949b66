use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::{Client, StatusCode, header};
use tracing::{info, warn};
use url::Url;

use crate::common::response::ErrorBody;
use crate::config::settings::endpoint;
use crate::modules::video::dto::{SyncGenerateRequest, SyncGenerateResponse};

/// A deployment that runs the generation pipeline on our behalf.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, req: &SyncGenerateRequest) -> Result<SyncGenerateResponse>;
}

/// Artifact bytes streamed from the backend mirror.
pub struct RemoteArtifact {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes, reqwest::Error>>,
}

/// HTTP client for a separately deployed instance of this service.
#[derive(Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: Url,
}

impl RemoteBackend {
    pub fn new(client: Client, base_url: Url) -> Self {
        info!("✅ Backend mirror at {}", base_url);
        Self { client, base_url }
    }

    /// Fetches `/api/videos/{file_name}` from the mirror; `None` when it has nothing.
    pub async fn fetch_artifact(&self, file_name: &str) -> Result<Option<RemoteArtifact>> {
        let url = endpoint(&self.base_url, &format!("api/videos/{}", file_name));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Backend mirror request failed: {}", url))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            warn!("Backend mirror answered {} for {}", resp.status(), url);
            return Ok(None);
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Some(RemoteArtifact {
            content_type,
            content_length: resp.content_length(),
            stream: resp.bytes_stream().boxed(),
        }))
    }
}

#[async_trait]
impl GenerationBackend for RemoteBackend {
    async fn generate(&self, req: &SyncGenerateRequest) -> Result<SyncGenerateResponse> {
        let url = endpoint(&self.base_url, "api/generate");
        let resp = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .with_context(|| format!("Backend mirror request failed: {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => match body.details {
                    Some(details) => format!("{}: {}", body.error, details),
                    None => body.error,
                },
                Err(_) => text,
            };
            return Err(anyhow!("Backend mirror rejected generation ({}): {}", status, reason));
        }

        resp.json()
            .await
            .context("Backend mirror returned malformed JSON")
    }
}
