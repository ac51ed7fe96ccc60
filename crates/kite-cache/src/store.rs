use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::util::{
    atomic_write, bincode_deserialize, bincode_options, bincode_serialize, now_millis,
    read_file_limited, remove_file_best_effort, BINCODE_PAYLOAD_LIMIT_BYTES,
};

pub const DISK_STORE_SCHEMA_VERSION: u32 = 1;

/// A persisted key-value store: one versioned bincode record per key.
///
/// Records are written atomically and named by the key's fingerprint; the
/// full key is stored alongside so a fingerprint collision reads as a miss
/// rather than as another key's value.
#[derive(Clone, Debug)]
pub struct DiskStore {
    root: PathBuf,
    policy: DiskStorePolicy,
    last_gc_millis: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug)]
pub struct DiskStorePolicy {
    /// Time-to-live for records, measured from when they were saved.
    pub ttl_millis: u64,
    /// Maximum total size of records on disk.
    pub max_bytes: u64,
    /// Minimum time between GC runs triggered by writes.
    pub gc_interval_millis: u64,
}

impl Default for DiskStorePolicy {
    fn default() -> Self {
        Self {
            ttl_millis: 30 * 24 * 60 * 60 * 1000,
            max_bytes: 512 * 1024 * 1024,
            gc_interval_millis: 5 * 60 * 1000,
        }
    }
}

impl DiskStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::new_with_policy(root, DiskStorePolicy::default())
    }

    pub fn new_with_policy(root: impl AsRef<Path>, policy: DiskStorePolicy) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let store = Self {
            root,
            policy,
            last_gc_millis: Arc::new(AtomicU64::new(now_millis())),
        };
        if let Err(err) = store.gc() {
            tracing::debug!(
                target = "kite.cache",
                root = %store.root.display(),
                error = %err,
                "disk store gc failed"
            );
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let key_fingerprint = Fingerprint::from_bytes(key.as_bytes());
        let path = self.entry_path(&key_fingerprint);
        let payload = bincode_serialize(value)?;
        let record = PersistedRecord {
            schema_version: DISK_STORE_SCHEMA_VERSION,
            kite_version: kite_core::KITE_VERSION,
            saved_at_millis: now_millis(),
            key,
            key_fingerprint: &key_fingerprint,
            payload: &payload,
        };

        let bytes = bincode_serialize(&record)?;
        atomic_write(&path, &bytes)?;
        self.maybe_gc();
        Ok(())
    }

    /// Load the value stored under `key`.
    ///
    /// Unreadable, stale-version or undecodable records are deleted and
    /// reported as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let key_fingerprint = Fingerprint::from_bytes(key.as_bytes());
        let path = self.entry_path(&key_fingerprint);
        let Some(bytes) = read_file_limited(&path) else {
            return Ok(None);
        };

        let record: PersistedRecordOwned = match bincode_deserialize(&bytes) {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(
                    target = "kite.cache",
                    path = %path.display(),
                    error = %err,
                    "discarding corrupt cache record"
                );
                remove_file_best_effort(&path, "load.corrupt");
                return Ok(None);
            }
        };

        if record.schema_version != DISK_STORE_SCHEMA_VERSION
            || record.kite_version != kite_core::KITE_VERSION
        {
            remove_file_best_effort(&path, "load.version_mismatch");
            return Ok(None);
        }

        if record.key_fingerprint != key_fingerprint {
            remove_file_best_effort(&path, "load.fingerprint_mismatch");
            return Ok(None);
        }

        if record.key != key {
            // Collision: do not erase the other key's record.
            return Ok(None);
        }

        match bincode_deserialize(&record.payload) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::debug!(
                    target = "kite.cache",
                    key,
                    error = %err,
                    "discarding cache record with undecodable payload"
                );
                remove_file_best_effort(&path, "load.payload");
                Ok(None)
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(&Fingerprint::from_bytes(key.as_bytes()))
            .is_file()
    }

    /// Delete the record for `key`. Returns whether a record existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(&Fingerprint::from_bytes(key.as_bytes()));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete every record. Unrelated files in the directory are left alone.
    pub fn clear(&self) -> Result<()> {
        for path in self.record_paths()? {
            remove_file_best_effort(&path, "clear");
        }
        Ok(())
    }

    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.record_paths()?.len())
    }

    /// Total size of all records in bytes.
    pub fn disk_usage(&self) -> Result<u64> {
        let mut total = 0u64;
        for path in self.record_paths()? {
            if let Ok(meta) = std::fs::symlink_metadata(&path) {
                total = total.saturating_add(meta.len());
            }
        }
        Ok(total)
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{}.bin", fingerprint.as_str()))
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("bin"))
            .collect())
    }

    fn maybe_gc(&self) {
        let now = now_millis();
        let last = self.last_gc_millis.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.policy.gc_interval_millis {
            return;
        }
        if self
            .last_gc_millis
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        if let Err(err) = self.gc() {
            tracing::debug!(target = "kite.cache", error = %err, "disk store gc failed");
        }
    }

    /// Drop expired, stale-version and corrupt records, then evict the
    /// oldest records until the store fits `max_bytes`.
    pub fn gc(&self) -> Result<()> {
        let now = now_millis();
        let mut candidates: Vec<GcEntry> = Vec::new();
        let mut total_bytes: u64 = 0;

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let Ok(meta) = std::fs::symlink_metadata(&path) else {
                continue;
            };
            if !meta.file_type().is_file() {
                continue;
            }

            // Leftover temp files from crashed writers.
            if path.extension().and_then(|s| s.to_str()) != Some("bin") {
                if path.to_string_lossy().contains(".tmp.") {
                    remove_file_best_effort(&path, "gc.tmp");
                }
                continue;
            }

            let Some(header) = read_header(&path) else {
                remove_file_best_effort(&path, "gc.corrupt");
                continue;
            };

            if header.schema_version != DISK_STORE_SCHEMA_VERSION
                || header.kite_version != kite_core::KITE_VERSION
            {
                remove_file_best_effort(&path, "gc.version_mismatch");
                continue;
            }

            if path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem != header.key_fingerprint.as_str())
            {
                remove_file_best_effort(&path, "gc.fingerprint_mismatch");
                continue;
            }

            if now.saturating_sub(header.saved_at_millis) > self.policy.ttl_millis {
                remove_file_best_effort(&path, "gc.expired");
                continue;
            }

            let len = meta.len();
            total_bytes = total_bytes.saturating_add(len);
            candidates.push(GcEntry {
                saved_at_millis: header.saved_at_millis,
                len,
                path,
            });
        }

        if total_bytes <= self.policy.max_bytes {
            return Ok(());
        }

        candidates.sort_by_key(|entry| entry.saved_at_millis);
        for entry in candidates {
            if total_bytes <= self.policy.max_bytes {
                break;
            }
            if remove_file_best_effort(&entry.path, "gc.over_budget") {
                total_bytes = total_bytes.saturating_sub(entry.len);
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
struct GcEntry {
    saved_at_millis: u64,
    len: u64,
    path: PathBuf,
}

#[derive(Serialize)]
struct PersistedRecord<'a> {
    schema_version: u32,
    kite_version: &'a str,
    saved_at_millis: u64,
    key: &'a str,
    key_fingerprint: &'a Fingerprint,
    payload: &'a [u8],
}

#[derive(Deserialize)]
struct PersistedRecordOwned {
    schema_version: u32,
    kite_version: String,
    #[allow(dead_code)]
    saved_at_millis: u64,
    key: String,
    key_fingerprint: Fingerprint,
    payload: Vec<u8>,
}

#[derive(Deserialize)]
struct PersistedRecordHeader {
    schema_version: u32,
    kite_version: String,
    saved_at_millis: u64,
    #[allow(dead_code)]
    key: String,
    key_fingerprint: Fingerprint,
    // The payload is left unread.
}

fn read_header(path: &Path) -> Option<PersistedRecordHeader> {
    let bytes = read_file_limited(path)?;
    let mut cursor = Cursor::new(bytes);
    bincode_options()
        .with_limit(BINCODE_PAYLOAD_LIMIT_BYTES as u64)
        .deserialize_from(&mut cursor)
        .ok()
}
