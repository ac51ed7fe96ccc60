//! Configuration for Kite.
//!
//! A project is configured through `kite.toml` (or `.kite.toml`, or the file
//! named by `KITE_CONFIG_PATH`) at its root. Every section is optional and
//! defaulted, so an absent file behaves like an empty one.

mod logging;
mod sections;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use logging::{init_tracing, LoggingConfig};
pub use sections::{CacheConfig, CachePolicyConfig, ClasspathConfig, CompletionConfig};

/// Environment variable naming an explicit config file.
pub const KITE_CONFIG_ENV_VAR: &str = "KITE_CONFIG_PATH";

/// Config file names looked up in the project root, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["kite.toml", ".kite.toml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KiteConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub classpath: ClasspathConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form quotes the offending source line; keep only the message.
        ConfigError::Toml(err.message().to_string())
    }
}

impl KiteConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file. Relative paths inside it are taken relative to the
    /// directory holding the file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::load_from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative_paths(dir);
        }
        Ok(config)
    }

    /// Make every relative path in the config absolute against `base`.
    pub fn resolve_relative_paths(&mut self, base: &Path) {
        let absolutize = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(file) = self.logging.file.as_mut() {
            absolutize(file);
        }
        if let Some(root) = self.cache.root.as_mut() {
            absolutize(root);
        }
        if let Some(home) = self.classpath.jdk_home.as_mut() {
            absolutize(home);
        }
        self.classpath.entries.iter_mut().for_each(absolutize);
    }
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the config environment lock.
///
/// Tests that set [`KITE_CONFIG_ENV_VAR`] wrap the mutation and the
/// discovery in this so concurrent discovery never sees a half-applied
/// override.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Find the config file of a project.
///
/// Search order:
/// 1) `KITE_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `kite.toml` in `workspace_root`
/// 3) `.kite.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(KITE_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    CONFIG_FILE_NAMES
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration of a project.
///
/// Without a config file this is [`KiteConfig::default`] and `None`.
pub fn load_for_workspace(workspace_root: &Path) -> Result<(KiteConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KiteConfig::default(), None));
    };

    let config = KiteConfig::load_from_path(&path)?;
    tracing::debug!(target = "kite.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}
