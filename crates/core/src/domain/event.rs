// Domain Events - published to the notification sink after a committed mutation

use serde::{Deserialize, Serialize};

use crate::domain::customer::{CustomerStatus, Token};
use crate::domain::queue::QueueId;

/// Notification event produced by an aggregate mutation.
///
/// Delivery is best-effort and fire-and-forget: a mutation's success is
/// determined solely by the committed state, never by event delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueEvent {
    /// Staff-scoped: a customer joined the queue
    CustomerJoined { queue_id: QueueId },

    /// Staff-scoped: waiting/called counts changed
    QueueSnapshotChanged {
        queue_id: QueueId,
        waiting_count: u32,
        called_count: u32,
    },

    /// Customer-scoped: it is this customer's turn
    CustomerCalled {
        token: Token,
        grace_deadline: i64,
        queue_name: String,
        called_message: Option<String>,
    },

    /// Customer-scoped, one-shot: rank crossed the near-front threshold
    CustomerNearFront { token: Token, position: u32 },

    /// Customer-scoped: status changed (arrived, served, no-show, removed)
    CustomerStatusChanged {
        token: Token,
        status: CustomerStatus,
        message: Option<String>,
    },
}
