use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use super::model::{ContentStatus, OutputType, is_valid_content_id};
use crate::common::response::ApiError;

// --- ASYNC GENERATION DTOs ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub script: Option<String>,
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_signature"))]
    pub payment_signature: Option<String>,
    #[validate(length(max = 64, message = "walletAddress must be at most 64 characters"))]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    pub success: bool,
    pub content_id: String,
    pub title: String,
    pub output_type: OutputType,
    /// Estimated length in seconds.
    pub duration: u32,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub content_url: String,
    pub status: ContentStatus,
}

// --- SYNCHRONOUS GENERATION DTOs ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncGenerateRequest {
    pub script: Option<String>,
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 64, message = "walletAddress must be at most 64 characters"))]
    pub wallet_address: Option<String>,
    #[validate(custom(function = "validate_signature"))]
    pub transaction_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub size_bytes: u64,
    pub duration_seconds: f64,
    pub segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncGenerateResponse {
    pub video_url: String,
    pub message: String,
    pub video_stats: Option<VideoStats>,
}

// --- STATUS DTOs ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub content_id: String,
    pub output_type: OutputType,
    pub status: ContentStatus,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- VALIDATION ---

/// Request fields after every precondition has been checked.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub script: String,
    pub title: String,
    pub signature: String,
    pub wallet_address: String,
}

fn validate_signature(value: &str) -> Result<(), ValidationError> {
    if is_valid_content_id(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("signature");
    err.message = Some(Cow::from(
        "Payment signature must be 1-128 characters of letters, digits, '_' or '-'",
    ));
    Err(err)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field))
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Shared required-field checks, in the order clients see them reported.
fn require(
    script: Option<String>,
    title: Option<String>,
    signature: Option<String>,
    signature_field: &str,
    wallet_address: Option<String>,
    max_script_bytes: usize,
) -> Result<GenerationInput, ApiError> {
    let script = non_blank(script)
        .ok_or_else(|| ApiError::Validation("Missing or empty script".to_string()))?;
    let title = non_blank(title)
        .ok_or_else(|| ApiError::Validation("Missing or empty title".to_string()))?;
    let signature = non_blank(signature)
        .ok_or_else(|| ApiError::Validation(format!("Missing {}", signature_field)))?;
    let wallet_address = non_blank(wallet_address)
        .ok_or_else(|| ApiError::Validation("Missing walletAddress".to_string()))?;

    if script.len() > max_script_bytes {
        return Err(ApiError::Validation(format!(
            "script exceeds {} bytes",
            max_script_bytes
        )));
    }

    Ok(GenerationInput {
        script,
        title: title.trim().to_string(),
        signature: signature.trim().to_string(),
        wallet_address: wallet_address.trim().to_string(),
    })
}

impl GenerateVideoRequest {
    pub fn into_input(self, max_script_bytes: usize) -> Result<GenerationInput, ApiError> {
        // Presence first so a missing field is never reported as a format error.
        let input = require(
            self.script.clone(),
            self.title.clone(),
            self.payment_signature.clone(),
            "paymentSignature",
            self.wallet_address.clone(),
            max_script_bytes,
        )?;
        self.validate()
            .map_err(|e| ApiError::Validation(first_message(&e)))?;
        Ok(input)
    }
}

impl SyncGenerateRequest {
    pub fn into_input(self, max_script_bytes: usize) -> Result<GenerationInput, ApiError> {
        let input = require(
            self.script.clone(),
            self.title.clone(),
            self.transaction_signature.clone(),
            "transactionSignature",
            self.wallet_address.clone(),
            max_script_bytes,
        )?;
        self.validate()
            .map_err(|e| ApiError::Validation(first_message(&e)))?;
        Ok(input)
    }
}

impl From<&GenerationInput> for SyncGenerateRequest {
    fn from(input: &GenerationInput) -> Self {
        Self {
            script: Some(input.script.clone()),
            title: Some(input.title.clone()),
            wallet_address: Some(input.wallet_address.clone()),
            transaction_signature: Some(input.signature.clone()),
        }
    }
}
