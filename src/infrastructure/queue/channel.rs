use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use tracing::info;

use crate::modules::video::events::GenerationJob;

/// In-process queue between the orchestrator and generation workers.
#[derive(Clone)]
pub struct GenerationQueue {
    sender: Sender<GenerationJob>,
    receiver: Receiver<GenerationJob>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }

    pub async fn publish(&self, job: GenerationJob) -> Result<()> {
        let content_id = job.content_id.clone();
        self.sender
            .send(job)
            .await
            .map_err(|e| anyhow!("Failed to queue generation job: {}", e))?;

        info!(content_id = %content_id, pending = self.pending(), "📨 Generation job queued");
        Ok(())
    }

    pub fn consumer(&self) -> Receiver<GenerationJob> {
        self.receiver.clone()
    }

    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

impl Default for GenerationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str) -> GenerationJob {
        GenerationJob {
            content_id: id.to_string(),
            title: "Demo".to_string(),
            script: "fn main() {}".to_string(),
            wallet_address: "Wallet1".to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let queue = GenerationQueue::new();
        queue.publish(job("a")).await.unwrap();
        queue.publish(job("b")).await.unwrap();
        assert_eq!(queue.pending(), 2);

        let consumer = queue.consumer();
        assert_eq!(consumer.recv().await.unwrap().content_id, "a");
        assert_eq!(consumer.recv().await.unwrap().content_id, "b");
        assert_eq!(queue.pending(), 0);
    }
}
