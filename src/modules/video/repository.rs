use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::warn;

use super::model::{JobRecord, JobState};

/// In-process job table keyed by content id.
#[derive(Clone, Default)]
pub struct JobRepository {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, content_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(content_id).cloned()
    }

    /// Stores `record` unless a queued or running job already holds the id,
    /// in which case that job is returned as the error.
    pub async fn claim(&self, record: JobRecord) -> Result<JobRecord, JobRecord> {
        let mut jobs = self.jobs.write().await;

        if let Some(existing) = jobs.get(&record.content_id) {
            if existing.state.is_active() {
                return Err(existing.clone());
            }
        }

        jobs.insert(record.content_id.clone(), record.clone());
        Ok(record)
    }

    pub async fn mark_running(&self, content_id: &str) {
        self.transition(content_id, JobState::Running, None).await;
    }

    pub async fn mark_succeeded(&self, content_id: &str) {
        self.transition(content_id, JobState::Succeeded, None).await;
    }

    pub async fn mark_failed(&self, content_id: &str, error: String) {
        self.transition(content_id, JobState::Failed, Some(error)).await;
    }

    async fn transition(&self, content_id: &str, state: JobState, error: Option<String>) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(content_id) {
            Some(job) => {
                job.state = state;
                job.error = error;
                job.updated_at = OffsetDateTime::now_utc();
            }
            None => warn!("No job record for {} while moving to {:?}", content_id, state),
        }
    }
}
