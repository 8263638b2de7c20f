//! Core of a Telegram Bot API client library.
//!
//! Two pieces of real logic live here: the per-chat inline keyboard layout
//! (`keyboard`) and the inbound update classifier + dispatcher (`update`,
//! `dispatch`). HTTP lives behind the `Transport` port, implemented in the
//! adapter crate.

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod keyboard;
pub mod logging;
pub mod transport;
pub mod update;

pub use bot::Bot;
pub use dispatch::{Dispatcher, UpdateHandler};
pub use errors::{Error, Result};
pub use keyboard::{Button, KeyboardBuilder, KeyboardGrid, KeyboardManager};
pub use update::{ClassifiedUpdate, RawUpdate, UpdateKind};
