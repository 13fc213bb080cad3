// Reconciliation Sweeper - turns missed calls into no-shows
//
// Scans all auto-no-show queues for Called customers whose grace deadline
// has elapsed and resolves them through the same service call a staff
// member would use. The scan-then-act pattern is inherently racy with
// concurrent staff action; the state-machine guard on the mutation is the
// sole source of truth, so a stale precondition is skipped, not raised.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::application::service::QueueService;
use crate::application::shutdown::ShutdownToken;
use crate::domain::DomainError;
use crate::error::{AppError, Result};
use crate::port::{QueueRepository, TimeProvider};

/// Default sweep cadence
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15);

pub struct Sweeper {
    service: Arc<QueueService>,
    repo: Arc<dyn QueueRepository>,
    time: Arc<dyn TimeProvider>,
    sweep_interval: Duration,
}

impl Sweeper {
    pub fn new(
        service: Arc<QueueService>,
        repo: Arc<dyn QueueRepository>,
        time: Arc<dyn TimeProvider>,
        sweep_interval: Option<Duration>,
    ) -> Self {
        Self {
            service,
            repo,
            time,
            sweep_interval: sweep_interval.unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }

    /// Run the sweep loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Sweeper started"
        );
        let mut tick = interval(self.sweep_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.wait() => {
                    info!("Sweeper shutting down");
                    break;
                }
            }
            if shutdown.is_shutdown() {
                info!("Sweeper shutting down");
                break;
            }
            match self.sweep_once().await {
                Ok(0) => {}
                Ok(swept) => info!(swept, "Sweep pass resolved expired calls"),
                Err(e) => error!(error = %e, "Sweep pass failed"),
            }
        }
    }

    /// One reconciliation pass. Returns the number of customers resolved.
    /// One bad queue or customer never halts the rest of the pass.
    pub async fn sweep_once(&self) -> Result<usize> {
        let queue_ids = self.repo.list_auto_no_show_queues().await?;
        let mut swept = 0;

        for queue_id in queue_ids {
            // The queue may have been deleted between scan and action
            let queue = match self.repo.find_by_id(&queue_id).await {
                Ok(Some(q)) => q,
                Ok(None) => continue,
                Err(e) => {
                    warn!(queue_id = %queue_id, error = %e, "Failed to load queue for sweep");
                    continue;
                }
            };

            let now = self.time.now_millis();
            for token in queue.expired_called(now) {
                match self.service.mark_no_show(&queue_id, &token).await {
                    Ok(()) => {
                        info!(
                            queue_id = %queue_id,
                            token = %token,
                            "Grace period elapsed, customer auto-resolved"
                        );
                        swept += 1;
                    }
                    // Benign race: staff resolved the customer between the
                    // scan and our write, or another writer got in first
                    Err(AppError::Domain(DomainError::InvalidTransition { .. }))
                    | Err(AppError::Domain(DomainError::CustomerNotFound { .. }))
                    | Err(AppError::Conflict(_)) => {
                        debug!(
                            queue_id = %queue_id,
                            token = %token,
                            "Customer resolved before sweep action, skipping"
                        );
                    }
                    // Queue deleted mid-pass
                    Err(AppError::NotFound(_)) => break,
                    Err(e) => {
                        warn!(
                            queue_id = %queue_id,
                            token = %token,
                            error = %e,
                            "Sweep action failed, continuing"
                        );
                    }
                }
            }
        }

        Ok(swept)
    }
}
