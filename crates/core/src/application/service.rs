// Queue Service - the exposed operation surface
//
// Each mutation runs as one logical transaction: fresh read, domain
// mutation, conditional save. On a version conflict the operation retries
// from a fresh read; after MAX_COMMIT_ATTEMPTS the conflict is surfaced to
// the caller. Notification dispatch happens only after a successful commit
// and never affects the mutation's outcome.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    projection, CustomerStatus, Queue, QueueEvent, QueueId, QueueSettings, SettingsPatch,
};
use crate::error::{AppError, Result};
use crate::port::{NotificationSink, PushSender, QueueRepository, TimeProvider, TokenProvider};

/// Retries per mutation before surfacing a Conflict
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Upper bound on a single notification delivery attempt. A slow transport
/// must not stall the next staff action on the queue.
const NOTIFY_TIMEOUT: Duration = Duration::from_millis(500);

/// Result of a successful join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub token: String,
    pub position: u32,
    pub queue_name: String,
}

/// Customer-facing live position view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionView {
    pub position: Option<u32>,
    pub status: CustomerStatus,
    pub queue_name: String,
    pub business_name: String,
    pub estimated_wait_minutes: Option<u32>,
    pub welcome_message: Option<String>,
    pub called_message: Option<String>,
}

/// Customer handed to staff by call-next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalledCustomer {
    pub customer_id: String,
    pub name: String,
    pub token: String,
}

/// Staff-facing row in the customer list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerView {
    pub token: String,
    pub name: String,
    pub status: CustomerStatus,
    pub position: Option<u32>,
    pub estimated_wait_minutes: Option<u32>,
    pub joined_at: i64,
    pub called_at: Option<i64>,
    pub grace_deadline: Option<i64>,
    pub no_show_count: i32,
}

/// Queue header for the staff view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueInfo {
    pub id: QueueId,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub is_paused: bool,
    pub waiting_count: u32,
    pub called_count: u32,
}

/// Staff-facing customer list with live-derived positions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerList {
    pub customers: Vec<CustomerView>,
    pub queue: QueueInfo,
}

/// Owner request to register a new queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQueueRequest {
    pub business_id: String,
    pub business_name: String,
    pub name: String,
    pub slug: String,
}

pub struct QueueService {
    repo: Arc<dyn QueueRepository>,
    tokens: Arc<dyn TokenProvider>,
    time: Arc<dyn TimeProvider>,
    sink: Arc<dyn NotificationSink>,
    push: Arc<dyn PushSender>,
}

impl QueueService {
    pub fn new(
        repo: Arc<dyn QueueRepository>,
        tokens: Arc<dyn TokenProvider>,
        time: Arc<dyn TimeProvider>,
        sink: Arc<dyn NotificationSink>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            repo,
            tokens,
            time,
            sink,
            push,
        }
    }

    async fn load(&self, queue_id: &str) -> Result<Queue> {
        self.repo
            .find_by_id(&queue_id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queue: {queue_id}")))
    }

    /// Optimistic-concurrency mutation loop: fresh read, domain mutation,
    /// conditional save. Domain errors abort without retry; version
    /// conflicts retry from a fresh read.
    async fn mutate<T, F>(&self, queue_id: &str, op: F) -> Result<T>
    where
        F: Fn(&mut Queue, i64) -> crate::domain::error::Result<T>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut queue = self.load(queue_id).await?;
            let now = self.time.now_millis();
            let out = op(&mut queue, now).map_err(AppError::Domain)?;
            let events = queue.take_events();
            match self.repo.save(&queue).await {
                Ok(_) => {
                    self.dispatch(&queue, events).await;
                    return Ok(out);
                }
                Err(AppError::Conflict(reason)) => {
                    if attempt >= MAX_COMMIT_ATTEMPTS {
                        return Err(AppError::Conflict(reason));
                    }
                    debug!(
                        queue_id = %queue_id,
                        attempt,
                        "version conflict, retrying from fresh read"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Best-effort event dispatch, one attempt per event, bounded by a
    /// short timeout. Failures are logged, never surfaced.
    async fn dispatch(&self, queue: &Queue, events: Vec<QueueEvent>) {
        for event in events {
            let push_payload = self.push_payload(queue, &event);

            match tokio::time::timeout(NOTIFY_TIMEOUT, self.sink.publish(event)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(queue_id = %queue.id, error = %e, "notification publish failed"),
                Err(_) => warn!(queue_id = %queue.id, "notification publish timed out"),
            }

            if let Some((subscription, title, body)) = push_payload {
                match tokio::time::timeout(
                    NOTIFY_TIMEOUT,
                    self.push.send(&subscription, &title, &body),
                )
                .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(queue_id = %queue.id, error = %e, "push send failed"),
                    Err(_) => warn!(queue_id = %queue.id, "push send timed out"),
                }
            }
        }
    }

    /// Push notifications accompany only the called and near-front events,
    /// and only for customers who registered a subscription
    fn push_payload(&self, queue: &Queue, event: &QueueEvent) -> Option<(String, String, String)> {
        match event {
            QueueEvent::CustomerCalled {
                token,
                called_message,
                ..
            } => {
                let subscription = queue.find_customer(token)?.push_subscription.clone()?;
                let title = format!("It's your turn at {}", queue.name);
                let body = called_message
                    .clone()
                    .unwrap_or_else(|| "Please make your way to the front.".to_string());
                Some((subscription, title, body))
            }
            QueueEvent::CustomerNearFront { token, position } => {
                let subscription = queue.find_customer(token)?.push_subscription.clone()?;
                let title = format!("Almost your turn at {}", queue.name);
                let body = format!("You're now number {position} in line.");
                Some((subscription, title, body))
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Queue lifecycle (owner actions)
    // ------------------------------------------------------------------

    pub async fn create_queue(&self, req: NewQueueRequest) -> Result<QueueId> {
        if self
            .repo
            .find_by_slug(&req.business_id, &req.slug)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "slug already in use: {}",
                req.slug
            )));
        }
        let queue = Queue::new(
            uuid::Uuid::new_v4().to_string(),
            req.business_id,
            req.business_name,
            &req.name,
            req.slug,
        )?;
        let id = queue.id.clone();
        self.repo.insert(&queue).await?;
        Ok(id)
    }

    /// Soft delete / re-enable
    pub async fn set_active(&self, queue_id: &str, active: bool) -> Result<()> {
        self.mutate(queue_id, |queue, _now| {
            queue.set_active(active);
            Ok(())
        })
        .await
    }

    pub async fn set_paused(&self, queue_id: &str, paused: bool) -> Result<()> {
        self.mutate(queue_id, |queue, _now| {
            queue.set_paused(paused);
            Ok(())
        })
        .await
    }

    /// Hard delete, cascading customer removal. Idempotent.
    pub async fn delete_queue(&self, queue_id: &str) -> Result<()> {
        self.repo.delete(&queue_id.to_string()).await
    }

    // ------------------------------------------------------------------
    // Customer-facing operations
    // ------------------------------------------------------------------

    /// Join a queue by id
    pub async fn join(&self, queue_id: &str, name: &str) -> Result<JoinReceipt> {
        let customer_id = self.tokens.customer_id();
        let token = self.tokens.join_token();
        self.mutate(queue_id, move |queue, now| {
            let customer =
                queue.add_customer(customer_id.clone(), token.clone(), name, now)?;
            let position =
                projection::rank_of(queue.customers(), &customer.token).unwrap_or(0);
            Ok(JoinReceipt {
                token: customer.token,
                position,
                queue_name: queue.name.clone(),
            })
        })
        .await
    }

    /// Join a queue addressed by its per-business slug (the QR-link path)
    pub async fn join_by_slug(
        &self,
        business_id: &str,
        slug: &str,
        name: &str,
    ) -> Result<JoinReceipt> {
        let queue = self
            .repo
            .find_by_slug(business_id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queue slug: {slug}")))?;
        self.join(&queue.id, name).await
    }

    /// Live position lookup by token (read-only, never mutates)
    pub async fn get_position(&self, token: &str) -> Result<PositionView> {
        let queue_id = self
            .repo
            .find_queue_id_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("token: {token}")))?;
        let queue = self.load(&queue_id).await?;
        let customer = queue
            .find_customer(token)
            .ok_or_else(|| AppError::NotFound(format!("token: {token}")))?;

        let position = projection::rank_of(queue.customers(), token);
        Ok(PositionView {
            position,
            status: customer.status.clone(),
            queue_name: queue.name.clone(),
            business_name: queue.business_name.clone(),
            estimated_wait_minutes: position
                .map(|rank| projection::estimated_wait_minutes(rank, &queue.settings)),
            welcome_message: queue.settings.welcome_message.clone(),
            called_message: queue.settings.called_message.clone(),
        })
    }

    /// Attach an opaque push subscription to a customer token
    pub async fn register_push_subscription(&self, token: &str, subscription: &str) -> Result<()> {
        let queue_id = self
            .repo
            .find_queue_id_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("token: {token}")))?;
        self.mutate(&queue_id, |queue, _now| {
            queue.register_push_subscription(token, subscription.to_string())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Staff operations
    // ------------------------------------------------------------------

    /// Call the oldest waiting customer
    pub async fn call_next(&self, queue_id: &str) -> Result<CalledCustomer> {
        self.mutate(queue_id, |queue, now| {
            let called = queue.call_next(now)?;
            Ok(CalledCustomer {
                customer_id: called.id,
                name: called.name,
                token: called.token,
            })
        })
        .await
    }

    pub async fn mark_arrived(&self, queue_id: &str, token: &str) -> Result<()> {
        self.mutate(queue_id, |queue, now| queue.mark_arrived(token, now))
            .await
    }

    pub async fn mark_served(&self, queue_id: &str, token: &str) -> Result<()> {
        self.mutate(queue_id, |queue, now| queue.mark_served(token, now))
            .await
    }

    pub async fn mark_no_show(&self, queue_id: &str, token: &str) -> Result<()> {
        self.mutate(queue_id, |queue, now| queue.mark_no_show(token, now))
            .await
    }

    /// Idempotent removal (removing an already-resolved customer succeeds)
    pub async fn remove_customer(&self, queue_id: &str, token: &str) -> Result<()> {
        self.mutate(queue_id, |queue, now| queue.remove_customer(token, now))
            .await
    }

    pub async fn get_settings(&self, queue_id: &str) -> Result<QueueSettings> {
        Ok(self.load(queue_id).await?.settings)
    }

    /// Partial settings update; returns the settings after the patch
    pub async fn update_settings(
        &self,
        queue_id: &str,
        patch: SettingsPatch,
    ) -> Result<QueueSettings> {
        self.mutate(queue_id, move |queue, _now| {
            queue.update_settings(&patch)?;
            Ok(queue.settings.clone())
        })
        .await
    }

    /// Staff view: every customer with live-derived positions
    pub async fn list_customers(&self, queue_id: &str) -> Result<CustomerList> {
        let queue = self.load(queue_id).await?;
        let snap = projection::snapshot(queue.customers());
        let customers = queue
            .customers()
            .iter()
            .map(|c| {
                let position = projection::rank_of(queue.customers(), &c.token);
                CustomerView {
                    token: c.token.clone(),
                    name: c.name.clone(),
                    status: c.status.clone(),
                    position,
                    estimated_wait_minutes: position
                        .map(|rank| projection::estimated_wait_minutes(rank, &queue.settings)),
                    joined_at: c.joined_at,
                    called_at: c.called_at,
                    grace_deadline: c.grace_deadline,
                    no_show_count: c.no_show_count,
                }
            })
            .collect();
        Ok(CustomerList {
            customers,
            queue: QueueInfo {
                id: queue.id.clone(),
                name: queue.name.clone(),
                slug: queue.slug.clone(),
                is_active: queue.is_active,
                is_paused: queue.is_paused,
                waiting_count: snap.waiting_count,
                called_count: snap.called_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::notification::mocks::{RecordingPushSender, RecordingSink};
    use crate::port::queue_repository::mocks::InMemoryQueueRepository;
    use crate::port::time_provider::mocks::MockTimeProvider;
    use crate::port::token_provider::mocks::SequenceTokenProvider;

    struct Harness {
        repo: Arc<InMemoryQueueRepository>,
        time: Arc<MockTimeProvider>,
        sink: Arc<RecordingSink>,
        push: Arc<RecordingPushSender>,
        service: QueueService,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryQueueRepository::new());
        let time = Arc::new(MockTimeProvider::new(1_000_000));
        let sink = Arc::new(RecordingSink::new());
        let push = Arc::new(RecordingPushSender::new());
        let service = QueueService::new(
            repo.clone(),
            Arc::new(SequenceTokenProvider::new()),
            time.clone(),
            sink.clone(),
            push.clone(),
        );
        Harness {
            repo,
            time,
            sink,
            push,
            service,
        }
    }

    async fn create_queue(h: &Harness) -> QueueId {
        h.service
            .create_queue(NewQueueRequest {
                business_id: "biz-1".to_string(),
                business_name: "Acme Barbers".to_string(),
                name: "Walk-ins".to_string(),
                slug: "walk-ins".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_join_returns_receipt_with_position() {
        let h = harness();
        let queue_id = create_queue(&h).await;

        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        assert_eq!(alice.position, 1);
        assert_eq!(alice.queue_name, "Walk-ins");

        h.time.advance(1_000);
        let bob = h.service.join(&queue_id, "Bob").await.unwrap();
        assert_eq!(bob.position, 2);
        assert_ne!(alice.token, bob.token);
    }

    #[tokio::test]
    async fn test_join_unknown_queue_is_not_found() {
        let h = harness();
        let err = h.service.join("missing", "Alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_join_by_slug_resolves_queue() {
        let h = harness();
        let _queue_id = create_queue(&h).await;
        let receipt = h
            .service
            .join_by_slug("biz-1", "walk-ins", "Alice")
            .await
            .unwrap();
        assert_eq!(receipt.position, 1);

        let err = h
            .service
            .join_by_slug("biz-1", "nope", "Alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let h = harness();
        create_queue(&h).await;
        let err = h
            .service
            .create_queue(NewQueueRequest {
                business_id: "biz-1".to_string(),
                business_name: "Acme Barbers".to_string(),
                name: "Other".to_string(),
                slug: "walk-ins".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_position_reflects_call_progress() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        h.time.advance(1_000);
        let bob = h.service.join(&queue_id, "Bob").await.unwrap();

        let view = h.service.get_position(&bob.token).await.unwrap();
        assert_eq!(view.position, Some(2));
        assert_eq!(view.status, CustomerStatus::Waiting);
        assert_eq!(view.estimated_wait_minutes, Some(10));
        assert_eq!(view.business_name, "Acme Barbers");

        h.service.call_next(&queue_id).await.unwrap();
        let view = h.service.get_position(&bob.token).await.unwrap();
        assert_eq!(view.position, Some(1));
        assert_eq!(view.estimated_wait_minutes, Some(5));

        let view = h.service.get_position(&alice.token).await.unwrap();
        assert_eq!(view.position, None);
        assert_eq!(view.status, CustomerStatus::Called);
    }

    #[tokio::test]
    async fn test_call_next_emits_events() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        h.sink.clear();

        let called = h.service.call_next(&queue_id).await.unwrap();
        assert_eq!(called.name, "Alice");
        assert_eq!(called.token, alice.token);

        let events = h.sink.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, QueueEvent::CustomerCalled { token, .. } if *token == alice.token)));
        assert!(events
            .iter()
            .any(|e| matches!(e, QueueEvent::QueueSnapshotChanged { called_count: 1, .. })));
    }

    #[tokio::test]
    async fn test_mutation_succeeds_when_sink_fails() {
        let repo = Arc::new(InMemoryQueueRepository::new());
        let service = QueueService::new(
            repo.clone(),
            Arc::new(SequenceTokenProvider::new()),
            Arc::new(MockTimeProvider::new(1_000_000)),
            Arc::new(RecordingSink::failing()),
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

        // Delivery failure is swallowed; the committed join is visible
        let receipt = service.join(&queue_id, "Alice").await.unwrap();
        let view = service.get_position(&receipt.token).await.unwrap();
        assert_eq!(view.position, Some(1));
    }

    #[tokio::test]
    async fn test_push_sent_for_called_customer_with_subscription() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        h.service
            .update_settings(
                &queue_id,
                SettingsPatch {
                    called_message: Some(Some("Desk 3 please".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        h.service
            .register_push_subscription(&alice.token, "sub-blob")
            .await
            .unwrap();

        h.service.call_next(&queue_id).await.unwrap();
        let sent = h.push.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "sub-blob");
        assert!(sent[0].1.contains("Walk-ins"));
        assert_eq!(sent[0].2, "Desk 3 please");
    }

    #[tokio::test]
    async fn test_no_push_without_subscription() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        h.service.join(&queue_id, "Alice").await.unwrap();
        h.service.call_next(&queue_id).await.unwrap();
        assert!(h.push.sent().is_empty());
    }

    #[tokio::test]
    async fn test_near_front_push_fires_once() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        h.service
            .update_settings(
                &queue_id,
                SettingsPatch {
                    near_front_threshold: Some(Some(2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        h.time.advance(1_000);
        h.service.join(&queue_id, "Bob").await.unwrap();
        h.time.advance(1_000);
        let carol = h.service.join(&queue_id, "Carol").await.unwrap();
        h.service
            .register_push_subscription(&carol.token, "carol-sub")
            .await
            .unwrap();
        h.sink.clear();

        // Carol crosses 3 -> 2 on the first call, then 2 -> 1 after serve +
        // next call. Exactly one near-front alert in total.
        h.service.call_next(&queue_id).await.unwrap();
        h.service.mark_served(&queue_id, &alice.token).await.unwrap();
        h.service.call_next(&queue_id).await.unwrap();

        let near: Vec<_> = h
            .sink
            .events()
            .into_iter()
            .filter(|e| {
                matches!(e, QueueEvent::CustomerNearFront { token, .. } if *token == carol.token)
            })
            .collect();
        assert_eq!(near.len(), 1);
        assert_eq!(
            h.push
                .sent()
                .iter()
                .filter(|(sub, _, _)| sub == "carol-sub")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_settings_roundtrip_and_validation() {
        let h = harness();
        let queue_id = create_queue(&h).await;

        let updated = h
            .service
            .update_settings(
                &queue_id,
                SettingsPatch {
                    grace_period_minutes: Some(10),
                    max_queue_size: Some(Some(25)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.grace_period_minutes, 10);
        assert_eq!(updated.max_queue_size, Some(25));

        let err = h
            .service
            .update_settings(
                &queue_id,
                SettingsPatch {
                    grace_period_minutes: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(crate::domain::DomainError::InvalidSettings { .. })
        ));

        // Rejected patch left the stored settings untouched
        let settings = h.service.get_settings(&queue_id).await.unwrap();
        assert_eq!(settings.grace_period_minutes, 10);
    }

    #[tokio::test]
    async fn test_list_customers_includes_live_positions() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        let alice = h.service.join(&queue_id, "Alice").await.unwrap();
        h.time.advance(1_000);
        h.service.join(&queue_id, "Bob").await.unwrap();
        h.service.call_next(&queue_id).await.unwrap();

        let list = h.service.list_customers(&queue_id).await.unwrap();
        assert_eq!(list.queue.waiting_count, 1);
        assert_eq!(list.queue.called_count, 1);
        assert_eq!(list.customers.len(), 2);

        let alice_row = list
            .customers
            .iter()
            .find(|c| c.token == alice.token)
            .unwrap();
        assert_eq!(alice_row.status, CustomerStatus::Called);
        assert_eq!(alice_row.position, None);
        assert!(alice_row.grace_deadline.is_some());

        let bob_row = list.customers.iter().find(|c| c.name == "Bob").unwrap();
        assert_eq!(bob_row.position, Some(1));
    }

    #[tokio::test]
    async fn test_stale_aggregate_save_conflicts() {
        let h = harness();
        let queue_id = create_queue(&h).await;

        // Two callers loaded the same version; the loser's save conflicts
        let stale = h.repo.find_by_id(&queue_id).await.unwrap().unwrap();
        h.repo.bump_version(&queue_id);
        let err = h.repo.save(&stale).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_remove_customer_is_idempotent_through_service() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        let alice = h.service.join(&queue_id, "Alice").await.unwrap();

        h.service
            .remove_customer(&queue_id, &alice.token)
            .await
            .unwrap();
        h.service
            .remove_customer(&queue_id, &alice.token)
            .await
            .unwrap();

        let view = h.service.get_position(&alice.token).await.unwrap();
        assert_eq!(view.status, CustomerStatus::Left);
        assert_eq!(view.position, None);
    }

    #[tokio::test]
    async fn test_paused_and_inactive_joins_rejected() {
        let h = harness();
        let queue_id = create_queue(&h).await;

        h.service.set_paused(&queue_id, true).await.unwrap();
        let err = h.service.join(&queue_id, "Alice").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(crate::domain::DomainError::QueuePaused)
        ));

        h.service.set_active(&queue_id, false).await.unwrap();
        let err = h.service.join(&queue_id, "Alice").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(crate::domain::DomainError::QueueInactive)
        ));
    }

    #[tokio::test]
    async fn test_delete_queue_is_idempotent() {
        let h = harness();
        let queue_id = create_queue(&h).await;
        h.service.delete_queue(&queue_id).await.unwrap();
        h.service.delete_queue(&queue_id).await.unwrap();
        assert!(matches!(
            h.service.join(&queue_id, "Alice").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
