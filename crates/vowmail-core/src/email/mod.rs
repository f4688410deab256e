/// Email composition
pub mod composer;

pub use composer::{ComposedEmail, EmailComposer};
