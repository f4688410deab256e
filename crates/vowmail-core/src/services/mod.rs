pub mod directory;
pub mod outbox;
pub mod queue;
pub mod reconciler;
pub mod scheduler;
pub mod transport;
