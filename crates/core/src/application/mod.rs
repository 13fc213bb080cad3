// Application Layer - operation surface, sweeper, retention

pub mod retention;
pub mod service;
pub mod shutdown;
pub mod sweeper;

// Re-exports
pub use retention::RetentionPruner;
pub use service::{
    CalledCustomer, CustomerList, CustomerView, JoinReceipt, NewQueueRequest, PositionView,
    QueueInfo, QueueService,
};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use sweeper::Sweeper;
