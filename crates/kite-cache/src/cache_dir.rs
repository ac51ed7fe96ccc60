use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};
use crate::fingerprint::Fingerprint;

/// Environment variable overriding the global cache root.
pub const CACHE_DIR_ENV: &str = "KITE_CACHE_DIR";

/// Configuration for selecting the on-disk cache root.
#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Override the global cache directory (the project hash is still appended).
    pub cache_root_override: Option<PathBuf>,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            cache_root_override: std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from),
        }
    }
}

/// The per-project cache directory, `<cache_root>/<project_hash>/`.
#[derive(Clone, Debug)]
pub struct CacheDir {
    project_root: PathBuf,
    project_hash: Fingerprint,
    root: PathBuf,
}

impl CacheDir {
    pub fn new(project_root: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        let project_root = kite_core::canonicalize_if_possible(project_root.as_ref())?;
        let project_hash = Fingerprint::for_project_root(&project_root)?;

        let base = match config.cache_root_override {
            Some(root) => root,
            None => default_cache_root()?,
        };
        let root = base.join(project_hash.as_str());

        std::fs::create_dir_all(root.join("members"))?;
        std::fs::create_dir_all(root.join("sources"))?;
        std::fs::create_dir_all(root.join("classpath"))?;

        tracing::debug!(
            target = "kite.cache",
            project_root = %project_root.display(),
            cache_dir = %root.display(),
            "opened project cache directory"
        );

        Ok(Self {
            project_root,
            project_hash,
            root,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn project_hash(&self) -> &Fingerprint {
        &self.project_hash
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn members_dir(&self) -> PathBuf {
        self.root.join("members")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    pub fn classpath_dir(&self) -> PathBuf {
        self.root.join("classpath")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("cache.lock")
    }
}

fn default_cache_root() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or(CacheError::MissingHomeDir)?;

    Ok(home.join(".kite").join("cache"))
}
