// Retention Pruner - periodic cleanup of resolved customer records
//
// Terminal records (Served/NoShow/Left) are kept for a retention window
// for staff history, then deleted. Non-terminal records are never touched.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::{QueueRepository, TimeProvider};

/// Default retention for resolved customer records
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 3600);

/// Default pruning cadence
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 3600);

pub struct RetentionPruner {
    repo: Arc<dyn QueueRepository>,
    time: Arc<dyn TimeProvider>,
    retention: Duration,
    prune_interval: Duration,
}

impl RetentionPruner {
    pub fn new(
        repo: Arc<dyn QueueRepository>,
        time: Arc<dyn TimeProvider>,
        retention: Option<Duration>,
        prune_interval: Option<Duration>,
    ) -> Self {
        Self {
            repo,
            time,
            retention: retention.unwrap_or(DEFAULT_RETENTION),
            prune_interval: prune_interval.unwrap_or(DEFAULT_PRUNE_INTERVAL),
        }
    }

    /// Run the pruning loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            retention_secs = self.retention.as_secs(),
            interval_secs = self.prune_interval.as_secs(),
            "Retention pruner started"
        );
        let mut tick = interval(self.prune_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.wait() => {
                    info!("Retention pruner shutting down");
                    break;
                }
            }
            if shutdown.is_shutdown() {
                info!("Retention pruner shutting down");
                break;
            }
            match self.prune_once().await {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "Pruned resolved customer records"),
                Err(e) => error!(error = %e, "Retention pruning failed"),
            }
        }
    }

    /// Delete terminal records older than the retention window
    pub async fn prune_once(&self) -> Result<u64> {
        let cutoff = self.time.now_millis() - self.retention.as_millis() as i64;
        self.repo.prune_terminal_customers(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::service::{NewQueueRequest, QueueService};
    use crate::port::notification::mocks::{RecordingPushSender, RecordingSink};
    use crate::port::queue_repository::mocks::InMemoryQueueRepository;
    use crate::port::time_provider::mocks::MockTimeProvider;
    use crate::port::token_provider::mocks::SequenceTokenProvider;

    #[tokio::test]
    async fn test_prunes_only_old_terminal_records() {
        let repo = Arc::new(InMemoryQueueRepository::new());
        let time = Arc::new(MockTimeProvider::new(1_000_000));
        let service = QueueService::new(
            repo.clone(),
            Arc::new(SequenceTokenProvider::new()),
            time.clone(),
            Arc::new(RecordingSink::new()),
            Arc::new(RecordingPushSender::new()),
        );
        let queue_id = service
            .create_queue(NewQueueRequest {
                business_id: "biz-1".to_string(),
                business_name: "Acme".to_string(),
                name: "Walk-ins".to_string(),
                slug: "walk-ins".to_string(),
            })
            .await
            .unwrap();

        // One resolved long ago, one resolved now, one still waiting
        let old = service.join(&queue_id, "Old").await.unwrap();
        service.remove_customer(&queue_id, &old.token).await.unwrap();

        time.advance(10 * 24 * 3600 * 1000);
        let fresh = service.join(&queue_id, "Fresh").await.unwrap();
        service
            .remove_customer(&queue_id, &fresh.token)
            .await
            .unwrap();
        let waiting = service.join(&queue_id, "Waiting").await.unwrap();

        let pruner = RetentionPruner::new(repo.clone(), time.clone(), None, None);
        let pruned = pruner.prune_once().await.unwrap();
        assert_eq!(pruned, 1);

        assert!(service.get_position(&old.token).await.is_err());
        assert!(service.get_position(&fresh.token).await.is_ok());
        assert!(service.get_position(&waiting.token).await.is_ok());
    }
}
