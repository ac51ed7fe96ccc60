pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] kite_cache::CacheError),

    #[error("classpath error: {0}")]
    Classpath(#[from] kite_classpath::ClasspathError),

    #[error("source error: {0}")]
    Source(#[from] kite_source::SourceError),

    #[error("config error: {0}")]
    Config(#[from] kite_config::ConfigError),
}
