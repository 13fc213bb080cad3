//! End-to-end queue lifecycle against the real SQLite adapter.

use std::sync::Arc;

use waitline_core::application::{NewQueueRequest, QueueService};
use waitline_core::domain::{CustomerStatus, DomainError, SettingsPatch};
use waitline_core::error::AppError;
use waitline_core::port::notification::mocks::{RecordingPushSender, RecordingSink};
use waitline_core::port::time_provider::SystemTimeProvider;
use waitline_core::port::token_provider::RandomTokenProvider;
use waitline_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};

async fn service() -> QueueService {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    QueueService::new(
        Arc::new(SqliteQueueRepository::new(pool)),
        Arc::new(RandomTokenProvider),
        Arc::new(SystemTimeProvider),
        Arc::new(RecordingSink::new()),
        Arc::new(RecordingPushSender::new()),
    )
}

async fn create_queue(service: &QueueService) -> String {
    service
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
async fn test_full_customer_lifecycle() {
    let service = service().await;
    let queue_id = create_queue(&service).await;

    let alice = service.join(&queue_id, "Alice").await.unwrap();
    let bob = service.join(&queue_id, "Bob").await.unwrap();
    assert_eq!(alice.position, 1);
    assert_eq!(bob.position, 2);

    let called = service.call_next(&queue_id).await.unwrap();
    assert_eq!(called.token, alice.token);

    let view = service.get_position(&bob.token).await.unwrap();
    assert_eq!(view.position, Some(1));
    assert_eq!(view.estimated_wait_minutes, Some(5));

    service
        .mark_arrived(&queue_id, &alice.token)
        .await
        .unwrap();
    service.mark_served(&queue_id, &alice.token).await.unwrap();

    let view = service.get_position(&alice.token).await.unwrap();
    assert_eq!(view.status, CustomerStatus::Served);
    assert_eq!(view.position, None);

    // Bob is next; a no-show resolves him terminally by default
    service.call_next(&queue_id).await.unwrap();
    service.mark_no_show(&queue_id, &bob.token).await.unwrap();
    let view = service.get_position(&bob.token).await.unwrap();
    assert_eq!(view.status, CustomerStatus::NoShow);

    let list = service.list_customers(&queue_id).await.unwrap();
    assert_eq!(list.queue.waiting_count, 0);
    assert_eq!(list.queue.called_count, 0);
    assert_eq!(list.customers.len(), 2);
}

#[tokio::test]
async fn test_join_by_slug_and_position_by_token_only() {
    let service = service().await;
    create_queue(&service).await;

    let receipt = service
        .join_by_slug("biz-1", "walk-ins", "Alice")
        .await
        .unwrap();

    // The token alone resolves the customer across all queues
    let view = service.get_position(&receipt.token).await.unwrap();
    assert_eq!(view.queue_name, "Walk-ins");
    assert_eq!(view.business_name, "Acme Barbers");
    assert_eq!(view.position, Some(1));

    let err = service.get_position("no-such-token").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_settings_survive_storage_roundtrip() {
    let service = service().await;
    let queue_id = create_queue(&service).await;

    service
        .update_settings(
            &queue_id,
            SettingsPatch {
                grace_period_minutes: Some(3),
                max_queue_size: Some(Some(10)),
                near_front_threshold: Some(Some(2)),
                welcome_message: Some(Some("Welcome!".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let settings = service.get_settings(&queue_id).await.unwrap();
    assert_eq!(settings.grace_period_minutes, 3);
    assert_eq!(settings.max_queue_size, Some(10));
    assert_eq!(settings.near_front_threshold, Some(2));
    assert_eq!(settings.welcome_message.as_deref(), Some("Welcome!"));

    // Invalid patch rejected at the domain layer, nothing stored
    let err = service
        .update_settings(
            &queue_id,
            SettingsPatch {
                max_called_at_once: Some(99),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::InvalidSettings { .. })
    ));
    let settings = service.get_settings(&queue_id).await.unwrap();
    assert_eq!(settings.max_called_at_once, 1);
}

#[tokio::test]
async fn test_capacity_and_pause_enforced_through_storage() {
    let service = service().await;
    let queue_id = create_queue(&service).await;
    service
        .update_settings(
            &queue_id,
            SettingsPatch {
                max_queue_size: Some(Some(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    service.join(&queue_id, "Alice").await.unwrap();
    let err = service.join(&queue_id, "Bob").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::QueueFull { max: 1 })
    ));

    service.set_paused(&queue_id, true).await.unwrap();
    service
        .update_settings(
            &queue_id,
            SettingsPatch {
                max_queue_size: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = service.join(&queue_id, "Bob").await.unwrap_err();
    assert!(matches!(err, AppError::Domain(DomainError::QueuePaused)));

    service.set_paused(&queue_id, false).await.unwrap();
    service.join(&queue_id, "Bob").await.unwrap();
}

#[tokio::test]
async fn test_delete_queue_removes_tokens() {
    let service = service().await;
    let queue_id = create_queue(&service).await;
    let alice = service.join(&queue_id, "Alice").await.unwrap();

    service.delete_queue(&queue_id).await.unwrap();
    assert!(matches!(
        service.get_position(&alice.token).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    // Slug is free for reuse after deletion
    create_queue(&service).await;
}
