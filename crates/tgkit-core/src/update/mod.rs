//! Inbound updates: wire shapes and classification.

pub mod classify;
pub mod types;

pub use classify::{classify, extract_command, ClassifiedUpdate, UpdateKind, COMMAND_MARKER};
pub use types::RawUpdate;
