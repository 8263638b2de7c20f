//! Outbound side: the transport port and the typed Bot API requests sent through it.

pub mod port;
pub mod requests;

pub use port::{send, ApiRequest, Transport};
