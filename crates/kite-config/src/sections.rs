use std::path::PathBuf;
use std::time::Duration;

use kite_cache::MemoryCachePolicy;
use kite_matcher::MatchMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When `false` sources are re-parsed on every access and nothing is
    /// persisted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache root override; `KITE_CACHE_DIR` and then `~/.kite/cache` apply
    /// when unset. The project hash is appended either way.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub members: CachePolicyConfig,

    #[serde(default)]
    pub sources: CachePolicyConfig,
}

impl CacheConfig {
    pub fn cache_dir_config(&self) -> kite_cache::CacheConfig {
        match &self.root {
            Some(root) => kite_cache::CacheConfig {
                cache_root_override: Some(root.clone()),
            },
            None => kite_cache::CacheConfig::from_env(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
            members: CachePolicyConfig::default(),
            sources: CachePolicyConfig::default(),
        }
    }
}

/// Bounds of one in-memory cache tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicyConfig {
    #[serde(default = "CachePolicyConfig::default_max_entries")]
    pub max_entries: usize,

    /// Seconds an entry may go unread before it is evicted; `0` disables
    /// expiry.
    #[serde(default = "CachePolicyConfig::default_expire_after_access_secs")]
    pub expire_after_access_secs: u64,
}

impl CachePolicyConfig {
    fn default_max_entries() -> usize {
        MemoryCachePolicy::default().max_entries
    }

    fn default_expire_after_access_secs() -> u64 {
        MemoryCachePolicy::default()
            .expire_after_access
            .map_or(0, |ttl| ttl.as_secs())
    }

    pub fn policy(&self) -> MemoryCachePolicy {
        MemoryCachePolicy {
            max_entries: self.max_entries.max(1),
            expire_after_access: (self.expire_after_access_secs > 0)
                .then(|| Duration::from_secs(self.expire_after_access_secs)),
        }
    }
}

impl Default for CachePolicyConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
            expire_after_access_secs: Self::default_expire_after_access_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClasspathConfig {
    /// Class directories, jars and jmods, in lookup order.
    #[serde(default)]
    pub entries: Vec<PathBuf>,

    #[serde(default = "default_true")]
    pub include_jdk: bool,

    /// Explicit JDK root; `JAVA_HOME` is consulted when unset.
    #[serde(default)]
    pub jdk_home: Option<PathBuf>,
}

impl Default for ClasspathConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            include_jdk: true,
            jdk_home: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub matcher: MatchMode,

    /// Whether fuzzy matching pins the first query character to the first
    /// candidate character, case included.
    #[serde(default = "default_true")]
    pub fuzzy_first_char_exact: bool,

    #[serde(default = "CompletionConfig::default_max_results")]
    pub max_results: usize,
}

impl CompletionConfig {
    fn default_max_results() -> usize {
        100
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            matcher: MatchMode::default(),
            fuzzy_first_char_exact: true,
            max_results: Self::default_max_results(),
        }
    }
}

fn default_true() -> bool {
    true
}
