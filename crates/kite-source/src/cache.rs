use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use kite_cache::{
    CacheStats, ChecksumTable, DiskStore, Fingerprint, MemoryCache, MemoryCachePolicy, RemovalCause,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ParsedSource;
use crate::parser::SourceParser;

/// Bumped whenever [`ParsedSource`] changes shape.
const SOURCE_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SourceRecord {
    schema_version: u32,
    source: ParsedSource,
}

#[derive(Clone, Debug)]
pub struct SourceCacheOptions {
    /// When `false` every access re-parses and nothing is cached.
    pub enabled: bool,
    pub policy: MemoryCachePolicy,
}

impl Default for SourceCacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: MemoryCachePolicy::default(),
        }
    }
}

/// Checksum-gated cache of parsed sources for one project.
///
/// A file's tree is parsed on first access and kept in memory. Evicted trees
/// are written to the store; a stored tree is served again only while the
/// file's content checksum equals the one recorded in the checksum table.
pub struct SourceCache {
    parser: Arc<dyn SourceParser>,
    memory: MemoryCache<PathBuf, ParsedSource>,
    store: Option<DiskStore>,
    checksums: ChecksumTable,
    enabled: AtomicBool,
    known: RwLock<BTreeSet<PathBuf>>,
    parses: AtomicU64,
}

impl SourceCache {
    pub fn new(parser: Arc<dyn SourceParser>, options: SourceCacheOptions, store: Option<DiskStore>) -> Self {
        let checksums = store.as_ref().map(ChecksumTable::load).unwrap_or_default();

        let mut memory = MemoryCache::new("sources", options.policy);
        if let Some(store) = store.clone() {
            memory = memory.on_removal(move |path: &PathBuf, source: &Arc<ParsedSource>, cause| match cause {
                RemovalCause::Size | RemovalCause::Expired => store_snapshot(&store, source),
                RemovalCause::Explicit => remove_snapshot(&store, path),
                RemovalCause::Replaced => {}
            });
        }

        Self {
            parser,
            memory,
            store,
            checksums,
            enabled: AtomicBool::new(options.enabled),
            known: RwLock::new(BTreeSet::new()),
            parses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turning caching off drops the memory tier; persisted snapshots stay.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::AcqRel) && !enabled {
            self.memory.discard_all();
        }
    }

    /// The parsed tree of `path`.
    ///
    /// A missing file yields a placeholder, which is not cached. Errors
    /// reading the file or from the front end are returned as is.
    pub fn get_source(&self, path: &Path) -> Result<Arc<ParsedSource>> {
        let path = kite_core::canonicalize_if_possible(path)?;
        if !path.is_file() {
            tracing::trace!(target = "kite.source", path = %path.display(), "no such source file");
            return Ok(Arc::new(ParsedSource::placeholder(path)));
        }
        self.known.write().insert(path.clone());

        if !self.is_enabled() {
            let (text, checksum) = read_source(&path)?;
            return self.parse(&path, &text, checksum).map(Arc::new);
        }

        let loaded = self.memory.get_or_try_insert_with(&path, || -> Result<Option<ParsedSource>> {
            let (text, checksum) = match read_source(&path) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            if let Some(source) = self.load_snapshot(&path, &checksum) {
                return Ok(Some(source));
            }
            let source = self.parse(&path, &text, checksum.clone())?;
            self.checksums.set(path.clone(), checksum);
            if let Some(store) = &self.store {
                store_snapshot(store, &source);
            }
            Ok(Some(source))
        })?;

        // Deleted between the existence check and the read.
        Ok(loaded.unwrap_or_else(|| Arc::new(ParsedSource::placeholder(path))))
    }

    /// Make `source` the live tree for its path.
    pub fn replace_source(&self, mut source: ParsedSource) -> Arc<ParsedSource> {
        let path = kite_core::canonicalize_if_possible(&source.path).unwrap_or_else(|_| source.path.clone());
        source.path = path.clone();
        self.known.write().insert(path.clone());

        if !self.is_enabled() {
            return Arc::new(source);
        }
        if let Some(checksum) = &source.checksum {
            self.checksums.set(path.clone(), checksum.clone());
        }
        if let Some(store) = &self.store {
            store_snapshot(store, &source);
        }
        tracing::trace!(target = "kite.source", path = %path.display(), "replaced source");
        self.memory.insert(path, source)
    }

    /// Forget the cached tree of `path`; the next access re-parses.
    pub fn invalidate_source(&self, path: &Path) {
        let path = kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
        self.checksums.remove(&path);
        let removed = self.memory.invalidate(&path);
        if removed.is_none() && self.is_enabled() {
            if let Some(store) = &self.store {
                remove_snapshot(store, &path);
            }
        }
        tracing::trace!(target = "kite.source", path = %path.display(), "invalidated source");
    }

    /// Invalidate `path` and drop it from the known source set.
    pub fn remove_source(&self, path: &Path) {
        self.invalidate_source(path);
        let path = kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
        self.known.write().remove(&path);
    }

    /// Register `path` as part of the project without parsing it.
    pub fn add_known_source(&self, path: &Path) -> bool {
        let path = kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
        self.known.write().insert(path)
    }

    /// Trees currently held in memory, without touching the file system.
    pub fn resident_sources(&self) -> Vec<Arc<ParsedSource>> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.memory.entries().into_iter().map(|(_, source)| source).collect()
    }

    /// Every source file the project knows about, sorted.
    pub fn known_sources(&self) -> Vec<PathBuf> {
        self.known.read().iter().cloned().collect()
    }

    /// Times the front end has been invoked.
    pub fn parse_count(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    pub fn checksums(&self) -> &ChecksumTable {
        &self.checksums
    }

    pub fn run_pending_tasks(&self) {
        self.memory.run_pending_tasks();
    }

    /// Persist every live tree and the checksum table.
    pub fn flush(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if self.is_enabled() {
            for (_, source) in self.memory.entries() {
                store_snapshot(store, &source);
            }
        }
        self.checksums.flush(store)?;
        tracing::debug!(
            target = "kite.source",
            entries = self.memory.len(),
            checksums = self.checksums.len(),
            "flushed source cache"
        );
        Ok(())
    }

    fn parse(&self, path: &Path, text: &str, checksum: Fingerprint) -> Result<ParsedSource> {
        self.parses.fetch_add(1, Ordering::Relaxed);
        let mut source = self.parser.parse(path, text)?;
        source.path = path.to_path_buf();
        source.checksum = Some(checksum);
        source.placeholder = false;
        Ok(source)
    }

    fn load_snapshot(&self, path: &Path, checksum: &Fingerprint) -> Option<ParsedSource> {
        if !self.checksums.matches(path, checksum) {
            return None;
        }
        let store = self.store.as_ref()?;
        match store.load::<SourceRecord>(&snapshot_key(path)) {
            Ok(Some(record))
                if record.schema_version == SOURCE_SNAPSHOT_SCHEMA_VERSION
                    && record.source.path == path
                    && record.source.checksum.as_ref() == Some(checksum) =>
            {
                tracing::trace!(target = "kite.source", path = %path.display(), "served persisted snapshot");
                Some(record.source)
            }
            Ok(Some(_)) => {
                remove_snapshot(store, path);
                None
            }
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(
                    target = "kite.source",
                    path = %path.display(),
                    error = %err,
                    "failed to read source snapshot"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCache")
            .field("enabled", &self.is_enabled())
            .field("memory", &self.memory)
            .field("known", &self.known.read().len())
            .finish_non_exhaustive()
    }
}

fn read_source(path: &Path) -> io::Result<(String, Fingerprint)> {
    let bytes = std::fs::read(path)?;
    let checksum = Fingerprint::from_bytes(&bytes);
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Ok((text, checksum))
}

fn snapshot_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn store_snapshot(store: &DiskStore, source: &ParsedSource) {
    let record = SourceRecord {
        schema_version: SOURCE_SNAPSHOT_SCHEMA_VERSION,
        source: source.clone(),
    };
    if let Err(err) = store.store(&snapshot_key(&source.path), &record) {
        tracing::debug!(
            target = "kite.source",
            path = %source.path.display(),
            error = %err,
            "failed to persist source snapshot"
        );
    }
}

fn remove_snapshot(store: &DiskStore, path: &Path) {
    if let Err(err) = store.remove(&snapshot_key(path)) {
        tracing::debug!(
            target = "kite.source",
            path = %path.display(),
            error = %err,
            "failed to delete source snapshot"
        );
    }
}
