/// Core error type.
///
/// Layout and classification errors are local and recoverable: callers get a
/// condition back and fall back to a safe default (empty grid, dropped update).
/// Adapter crates map their own failures into `Transport`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("decode failure: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
