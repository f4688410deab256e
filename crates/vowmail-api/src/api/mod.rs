/// API endpoint modules
pub mod emails;
pub mod health;
pub mod webhook;
