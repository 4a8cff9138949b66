use crate::infrastructure::queue::channel::GenerationQueue;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use tracing::{error, info};

/// Spawns `workers` consumers on the generation queue.
///
/// Each consumer runs one job at a time; ffmpeg and the TTS call are heavy
/// enough that parallelism is capped by the worker count alone.
pub fn start_generation_workers(state: AppState, queue: &GenerationQueue, workers: usize) {
    for worker in 0..workers.max(1) {
        let state = state.clone();
        let consumer = queue.consumer();

        tokio::spawn(async move {
            info!("🎥 Generation worker {} listening", worker);

            while let Ok(job) = consumer.recv().await {
                info!(content_id = %job.content_id, "📦 Received generation job");

                match VideoService::execute(&state, &job).await {
                    Ok(stats) => info!(
                        content_id = %job.content_id,
                        size_bytes = stats.size_bytes,
                        "✅ Job completed successfully"
                    ),
                    Err(e) => error!(content_id = %job.content_id, "❌ Failed to process job: {:#}", e),
                }
            }

            info!("🎥 Generation worker {} stopped", worker);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::artifacts::ArtifactKind;
    use crate::modules::video::model::{JobRecord, JobState};
    use crate::modules::video::events::GenerationJob;
    use crate::testing::TestHarness;
    use std::time::Duration;

    #[tokio::test]
    async fn worker_drains_queue_into_storage() {
        let harness = TestHarness::new().await;
        harness.state.jobs.claim(JobRecord::queued("w1", "Demo", "W")).await.unwrap();
        harness
            .queue
            .publish(GenerationJob {
                content_id: "w1".into(),
                title: "Demo".into(),
                script: "let a = 1;\nlet b = 2;".into(),
                wallet_address: "W".into(),
            })
            .await
            .unwrap();

        start_generation_workers(harness.state.clone(), &harness.queue, 1);

        let mut state = JobState::Queued;
        for _ in 0..100 {
            state = harness.state.jobs.get("w1").await.unwrap().state;
            if !state.is_active() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(state, JobState::Succeeded);
        assert_eq!(harness.queue.pending(), 0);
        assert!(harness.state.storage.find("w1", ArtifactKind::Video).await.is_some());
    }
}
