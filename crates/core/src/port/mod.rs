// Port Layer - Interfaces for external collaborators

pub mod notification;
pub mod queue_repository;
pub mod time_provider;
pub mod token_provider;

// Re-exports
pub use notification::{NoopNotificationSink, NoopPushSender, NotificationSink, PushSender};
pub use queue_repository::QueueRepository;
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use token_provider::{RandomTokenProvider, TokenProvider};
