// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Queue is inactive")]
    QueueInactive,

    #[error("Queue is paused and not accepting joins")]
    QueuePaused,

    #[error("Queue is full (max {max} waiting)")]
    QueueFull { max: u32 },

    #[error("Invalid customer name: {reason}")]
    InvalidName { reason: String },

    #[error("No callable waiting customer")]
    NoWaitingCustomers,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Customer not found: {token}")]
    CustomerNotFound { token: String },

    #[error("Invalid setting {field}: allowed {allowed}")]
    InvalidSettings {
        field: &'static str,
        allowed: &'static str,
    },

    #[error("Invalid slug: {reason}")]
    InvalidSlug { reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
