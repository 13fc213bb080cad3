// Position Projector - pure functions deriving ranks and queue stats
//
// Positions are never stored. They are recomputed from the customer list on
// every read and after every mutation, which removes the whole class of
// stale-denormalized-rank bugs.

use crate::domain::customer::{CustomerStatus, QueueCustomer};
use crate::domain::settings::QueueSettings;

/// Aggregate counts derived from the customer list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub waiting_count: u32,
    pub called_count: u32,
}

/// Indices of Waiting customers in rank order: ascending joined_at, ties
/// broken by insertion order (stable FIFO).
pub fn waiting_order(customers: &[QueueCustomer]) -> Vec<usize> {
    let mut indices: Vec<usize> = customers
        .iter()
        .enumerate()
        .filter(|(_, c)| c.status == CustomerStatus::Waiting)
        .map(|(i, _)| i)
        .collect();
    indices.sort_by_key(|&i| customers[i].joined_at);
    indices
}

/// 1-based rank of a waiting customer, None if not currently Waiting
pub fn rank_of(customers: &[QueueCustomer], token: &str) -> Option<u32> {
    waiting_order(customers)
        .iter()
        .position(|&i| customers[i].token == token)
        .map(|pos| pos as u32 + 1)
}

/// Waiting and called counts
pub fn snapshot(customers: &[QueueCustomer]) -> QueueSnapshot {
    let mut waiting_count = 0;
    let mut called_count = 0;
    for c in customers {
        match c.status {
            CustomerStatus::Waiting => waiting_count += 1,
            CustomerStatus::Called => called_count += 1,
            _ => {}
        }
    }
    QueueSnapshot {
        waiting_count,
        called_count,
    }
}

/// Estimated wait for a customer at the given rank
pub fn estimated_wait_minutes(rank: u32, settings: &QueueSettings) -> u32 {
    rank * settings.estimated_service_time_minutes
}
