use thiserror::Error;

/// Result type for chunk operations
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors that can occur while chunking documents
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChunkError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
