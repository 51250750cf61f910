use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Chunking error: {0}")]
    Chunk(#[from] context_chunk::ChunkError),

    #[error("Dependency graph lock poisoned")]
    GraphLock,
}

impl RetrievalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
