use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] kite_cache::CacheError),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl SourceError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SourceError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
