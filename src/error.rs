use thiserror::Error;

pub type Result<T, E = CommentError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CommentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Timed out after {0}s before any comments were collected")]
    Timeout(u64),

    #[error("Failed to spawn downloader: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CommentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Errors the top-by-likes fallback path is allowed to retry once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout(_))
    }
}

impl From<CommentError> for rmcp::ErrorData {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::InvalidInput(msg) => rmcp::ErrorData::invalid_params(msg, None),
            other => rmcp::ErrorData::internal_error(other.to_string(), None),
        }
    }
}
