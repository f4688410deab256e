/// Vowmail Worker - Delivery worker for the Vowmail guest email pipeline
///
/// Polls the delivery queue, sends claimed emails through the transport, and
/// keeps the outbox in sync with every attempt's outcome.
pub mod dispatcher;

pub use dispatcher::Dispatcher;
pub use vowmail_core::*;
