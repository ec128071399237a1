use thiserror::Error;

/// Failure reported by a [`Transport`](crate::domain::traits::Transport).
///
/// Cloneable so a single outcome can be broadcast to every caller attached
/// to the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response decode error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum CoordError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Batch item failed: {0}")]
    BatchItem(String),

    #[error("Batch execution failed: {0}")]
    BatchMachinery(String),

    #[error("Batch coordinator is closed")]
    BatchClosed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CoordError {
    /// Returns the underlying transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            CoordError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
