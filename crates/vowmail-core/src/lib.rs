/// Vowmail Core - Shared library for the Vowmail guest email delivery system
///
/// This crate contains shared types, traits, and utilities used across
/// the Vowmail worker and API services.
pub mod constants;
pub mod email;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use error::VowmailError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
