// Notification Ports - fire-and-forget event publication
//
// Delivery is best-effort: failures are logged by the caller and never
// affect the committed mutation.

use async_trait::async_trait;

use crate::domain::QueueEvent;
use crate::error::Result;

/// Channel the engine publishes events to (staff dashboards watching a
/// queue, customers watching their token)
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: QueueEvent) -> Result<()>;
}

/// Out-of-band push notification transport. Only called for
/// `CustomerCalled` and `CustomerNearFront`.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &str, title: &str, body: &str) -> Result<()>;
}

/// Sink that drops every event (deployments without a realtime channel)
pub struct NoopNotificationSink;

#[async_trait]
impl NotificationSink for NoopNotificationSink {
    async fn publish(&self, _event: QueueEvent) -> Result<()> {
        Ok(())
    }
}

/// Push sender that drops every notification
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn send(&self, _subscription: &str, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Records every published event for assertions
    pub struct RecordingSink {
        events: Mutex<Vec<QueueEvent>>,
        fail: bool,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        /// A sink whose publish always fails (delivery-failure tests)
        pub fn failing() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn events(&self) -> Vec<QueueEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl Default for RecordingSink {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn publish(&self, event: QueueEvent) -> Result<()> {
            if self.fail {
                return Err(AppError::Internal("sink unavailable".to_string()));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// Records every push notification for assertions
    pub struct RecordingPushSender {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingPushSender {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        /// (subscription, title, body) triples in send order
        pub fn sent(&self) -> Vec<(String, String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Default for RecordingPushSender {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PushSender for RecordingPushSender {
        async fn send(&self, subscription: &str, title: &str, body: &str) -> Result<()> {
            self.sent.lock().unwrap().push((
                subscription.to_string(),
                title.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }
}
