/// Shared utilities
pub mod logging;
pub mod retry;
pub mod validation;

pub use validation::validate_email_address;
