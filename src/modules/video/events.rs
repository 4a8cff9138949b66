use super::dto::GenerationInput;

/// Work item handed from the orchestrator to a generation worker.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub content_id: String,
    pub title: String,
    pub script: String,
    pub wallet_address: String,
}

impl From<&GenerationInput> for GenerationJob {
    fn from(input: &GenerationInput) -> Self {
        Self {
            content_id: input.signature.clone(),
            title: input.title.clone(),
            script: input.script.clone(),
            wallet_address: input.wallet_address.clone(),
        }
    }
}
