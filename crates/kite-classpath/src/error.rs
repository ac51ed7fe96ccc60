use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ClasspathError>;

#[derive(Debug, thiserror::Error)]
pub enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("classfile error: {0}")]
    ClassFile(#[from] kite_classfile::ClassFileError),
    #[error("cache error: {0}")]
    Cache(#[from] kite_cache::CacheError),
    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
    #[error("`{path}` is not a class directory, jar or jmod")]
    UnsupportedEntry { path: PathBuf },
}
