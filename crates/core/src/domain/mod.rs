// Domain Layer - Queue aggregate, customer state machine, projections

pub mod customer;
pub mod error;
pub mod event;
pub mod projection;
pub mod queue;
pub mod settings;

// Re-exports
pub use customer::{CustomerId, CustomerStatus, QueueCustomer, Token};
pub use error::DomainError;
pub use event::QueueEvent;
pub use projection::QueueSnapshot;
pub use queue::{Queue, QueueId};
pub use settings::{QueueSettings, SettingsPatch};
