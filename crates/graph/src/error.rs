use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported language for import extraction: {0}")]
    UnsupportedLanguage(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },
}

impl GraphError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
