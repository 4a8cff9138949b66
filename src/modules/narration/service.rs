use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

use super::prompt::{PAUSE_MARKER, SYSTEM_PROMPT, user_prompt};
use crate::state::AppState;

pub struct NarrationService;

impl NarrationService {
    /// Turns display code into a `[PAUSE]`-segmented narration script.
    pub async fn enhance(state: &AppState, script: &str) -> Result<String> {
        if script.trim().is_empty() {
            bail!("Cannot narrate an empty script");
        }

        let raw = state
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt(script))
            .await
            .context("Narration request failed")?;

        let narration = normalize(&raw);
        if Self::segments(&narration).is_empty() {
            bail!("Language model returned an empty narration");
        }

        info!(
            "📝 Narration ready: {} segments, {} chars",
            Self::segments(&narration).len(),
            narration.len()
        );
        Ok(narration)
    }

    /// Spoken segments, in order, without markers.
    pub fn segments(narration: &str) -> Vec<String> {
        narration
            .split(PAUSE_MARKER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Renders the narration to an audio file at `output`.
    pub async fn generate_speech(state: &AppState, narration: &str, output: &Path) -> Result<()> {
        let segments = Self::segments(narration);
        if segments.is_empty() {
            bail!("Cannot synthesize speech from an empty narration");
        }

        // Paragraph breaks give the voice a natural pause where markers were.
        let spoken = segments.join("\n\n");
        state
            .speech
            .synthesize(&spoken, output)
            .await
            .context("Speech synthesis failed")?;

        let size = tokio::fs::metadata(output)
            .await
            .with_context(|| format!("Speech output missing at {}", output.display()))?
            .len();
        if size == 0 {
            bail!("Speech synthesis produced an empty audio file");
        }

        Ok(())
    }
}

/// Canonicalises marker spelling and guarantees a trailing marker.
fn normalize(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let needle = PAUSE_MARKER.to_ascii_lowercase();

    let mut out = String::with_capacity(raw.len() + PAUSE_MARKER.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(&needle) {
        let at = cursor + offset;
        out.push_str(&raw[cursor..at]);
        out.push_str(PAUSE_MARKER);
        cursor = at + needle.len();
    }
    out.push_str(&raw[cursor..]);

    let mut out = out.trim().to_string();
    if !out.is_empty() && !out.ends_with(PAUSE_MARKER) {
        out.push(' ');
        out.push_str(PAUSE_MARKER);
    }
    out
}
