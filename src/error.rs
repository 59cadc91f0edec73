use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Result type for caller-facing operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Failure to start a session. Fatal to the attempt, never to the process.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid request header: {0}")]
    InvalidHeader(String),

    #[error("already connected")]
    AlreadyConnected,

    #[error("failed to build request: {0}")]
    Request(#[from] tungstenite::Error),
}

/// A frame that could not be turned into events. Always dropped by the caller.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Valid JSON, but nothing this client understands.
    #[error("unrecognized server message")]
    Unrecognized,

    #[error("malformed server message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A client message that could not be serialized.
#[derive(Error, Debug)]
#[error("failed to encode client message: {0}")]
pub struct EncodingError(#[from] serde_json::Error);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid flush policy: {0:?} (expected \"all\" or \"threshold(n)\")")]
    InvalidFlushPolicy(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("not connected")]
    NotConnected,
}
