// Queue Repository Port (Interface)

use async_trait::async_trait;

use crate::domain::{Queue, QueueId};
use crate::error::Result;

/// Repository interface for Queue aggregate persistence.
///
/// Writes are optimistic: `save` commits only if the stored version still
/// matches the version the aggregate was loaded with, and bumps it on
/// success. A mismatch surfaces as `AppError::Conflict` with nothing
/// written, and the caller retries from a fresh read.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a newly created queue (version 0)
    async fn insert(&self, queue: &Queue) -> Result<()>;

    /// Load a full aggregate (queue row plus customers in FIFO order)
    async fn find_by_id(&self, id: &QueueId) -> Result<Option<Queue>>;

    /// Resolve a queue by its per-business slug
    async fn find_by_slug(&self, business_id: &str, slug: &str) -> Result<Option<Queue>>;

    /// Resolve which queue a join token belongs to
    async fn find_queue_id_by_token(&self, token: &str) -> Result<Option<QueueId>>;

    /// Conditional save of the whole aggregate. Returns the new version.
    async fn save(&self, queue: &Queue) -> Result<i64>;

    /// Hard delete, cascading customer removal
    async fn delete(&self, id: &QueueId) -> Result<()>;

    /// Queues eligible for the reconciliation sweep (active, auto no-show on)
    async fn list_auto_no_show_queues(&self) -> Result<Vec<QueueId>>;

    /// Delete terminal customer records (Served/NoShow/Left) whose
    /// resolution is older than the cutoff. Returns rows removed.
    async fn prune_terminal_customers(&self, before_millis: i64) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository with the same optimistic-concurrency contract
    /// as the SQLite adapter. Used by core unit tests.
    pub struct InMemoryQueueRepository {
        queues: Mutex<HashMap<QueueId, Queue>>,
    }

    impl InMemoryQueueRepository {
        pub fn new() -> Self {
            Self {
                queues: Mutex::new(HashMap::new()),
            }
        }

        /// Force the stored version forward, simulating a concurrent writer
        pub fn bump_version(&self, id: &str) {
            if let Some(q) = self.queues.lock().unwrap().get_mut(id) {
                q.version += 1;
            }
        }
    }

    impl Default for InMemoryQueueRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl QueueRepository for InMemoryQueueRepository {
        async fn insert(&self, queue: &Queue) -> Result<()> {
            let mut queues = self.queues.lock().unwrap();
            if queues.contains_key(&queue.id) {
                return Err(AppError::Conflict(format!(
                    "queue already exists: {}",
                    queue.id
                )));
            }
            queues.insert(queue.id.clone(), queue.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &QueueId) -> Result<Option<Queue>> {
            Ok(self.queues.lock().unwrap().get(id).cloned())
        }

        async fn find_by_slug(&self, business_id: &str, slug: &str) -> Result<Option<Queue>> {
            Ok(self
                .queues
                .lock()
                .unwrap()
                .values()
                .find(|q| q.business_id == business_id && q.slug == slug)
                .cloned())
        }

        async fn find_queue_id_by_token(&self, token: &str) -> Result<Option<QueueId>> {
            Ok(self
                .queues
                .lock()
                .unwrap()
                .values()
                .find(|q| q.find_customer(token).is_some())
                .map(|q| q.id.clone()))
        }

        async fn save(&self, queue: &Queue) -> Result<i64> {
            let mut queues = self.queues.lock().unwrap();
            let stored = queues
                .get_mut(&queue.id)
                .ok_or_else(|| AppError::NotFound(format!("queue: {}", queue.id)))?;
            if stored.version != queue.version {
                return Err(AppError::Conflict(format!(
                    "version mismatch for queue {}: stored {}, expected {}",
                    queue.id, stored.version, queue.version
                )));
            }
            let mut committed = queue.clone();
            committed.version += 1;
            let new_version = committed.version;
            *stored = committed;
            Ok(new_version)
        }

        async fn delete(&self, id: &QueueId) -> Result<()> {
            self.queues.lock().unwrap().remove(id);
            Ok(())
        }

        async fn list_auto_no_show_queues(&self) -> Result<Vec<QueueId>> {
            Ok(self
                .queues
                .lock()
                .unwrap()
                .values()
                .filter(|q| q.is_active && q.settings.auto_no_show_enabled)
                .map(|q| q.id.clone())
                .collect())
        }

        async fn prune_terminal_customers(&self, before_millis: i64) -> Result<u64> {
            let mut pruned = 0;
            let mut queues = self.queues.lock().unwrap();
            for queue in queues.values_mut() {
                let keep: Vec<_> = queue
                    .customers()
                    .iter()
                    .filter(|c| {
                        !(c.status.is_terminal()
                            && c.left_at.is_some_and(|t| t < before_millis))
                    })
                    .cloned()
                    .collect();
                pruned += (queue.customers().len() - keep.len()) as u64;
                let rebuilt = Queue::from_parts(
                    queue.id.clone(),
                    queue.business_id.clone(),
                    queue.business_name.clone(),
                    queue.name.clone(),
                    queue.slug.clone(),
                    queue.is_active,
                    queue.is_paused,
                    queue.settings.clone(),
                    queue.version,
                    keep,
                );
                *queue = rebuilt;
            }
            Ok(pruned)
        }
    }
}
