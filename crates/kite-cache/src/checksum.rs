use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::store::DiskStore;

/// Record key of the checksum table inside its store. Source snapshots are
/// keyed by absolute paths, which can never take this form.
pub const CHECKSUM_TABLE_KEY: &str = "@checksum-table";

/// Per-project table of file path -> last known content checksum.
///
/// Decides parse-cache hits: a persisted snapshot is only trusted when the
/// current content checksum equals the table entry.
#[derive(Debug, Default)]
pub struct ChecksumTable {
    entries: RwLock<HashMap<PathBuf, Fingerprint>>,
    dirty: AtomicBool,
}

impl ChecksumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted table, or an empty one when none is usable.
    pub fn load(store: &DiskStore) -> Self {
        let entries = match store.load::<Vec<(PathBuf, Fingerprint)>>(CHECKSUM_TABLE_KEY) {
            Ok(Some(entries)) => entries.into_iter().collect(),
            Ok(None) => HashMap::new(),
            Err(err) => {
                tracing::debug!(
                    target = "kite.cache",
                    error = %err,
                    "failed to load checksum table; starting empty"
                );
                HashMap::new()
            }
        };
        tracing::debug!(
            target = "kite.cache",
            entries = entries.len(),
            "loaded checksum table"
        );
        Self {
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn get(&self, path: &Path) -> Option<Fingerprint> {
        self.entries.read().get(path).cloned()
    }

    pub fn matches(&self, path: &Path, checksum: &Fingerprint) -> bool {
        self.entries.read().get(path) == Some(checksum)
    }

    pub fn set(&self, path: PathBuf, checksum: Fingerprint) {
        let mut entries = self.entries.write();
        if entries.get(&path) != Some(&checksum) {
            entries.insert(path, checksum);
            self.dirty.store(true, Ordering::Release);
        }
    }

    pub fn remove(&self, path: &Path) -> Option<Fingerprint> {
        let removed = self.entries.write().remove(path);
        if removed.is_some() {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Persist the table if it changed since the last load or flush.
    pub fn flush(&self, store: &DiskStore) -> Result<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let mut snapshot: Vec<(PathBuf, Fingerprint)> = self
            .entries
            .read()
            .iter()
            .map(|(path, checksum)| (path.clone(), checksum.clone()))
            .collect();
        snapshot.sort();

        if let Err(err) = store.store(CHECKSUM_TABLE_KEY, &snapshot) {
            self.dirty.store(true, Ordering::Release);
            return Err(err);
        }
        Ok(())
    }
}
