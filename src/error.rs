use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifelogError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote API answered with a non-success status.
    #[error("HTTP error! status: {status}, body: {body}")]
    Request { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local transport failure: broken pipe, child exited, stream closed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON-RPC error object returned by the peer.
    #[error("MCP error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Session is closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, LifelogError>;
