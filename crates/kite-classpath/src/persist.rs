use kite_cache::{DiskStore, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::entry::ClasspathEntry;
use crate::error::Result;
use crate::stub::ClassStub;

/// Bumped whenever [`ClassStub`] changes shape.
const CLASSPATH_ENTRY_CACHE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct EntryCacheRecord {
    schema_version: u32,
    fingerprint: Fingerprint,
    entry: ClasspathEntry,
    stubs: Vec<ClassStub>,
}

fn record_key(fingerprint: &Fingerprint) -> String {
    format!("classpath-entry-{}", fingerprint.as_str())
}

/// Serve `entry`'s stubs from the per-entry cache, or build and store them.
///
/// Persistence is best-effort: a missing, corrupt or mismatched record is a
/// rescan, and a failed write only loses the warm start.
pub(crate) fn load_or_build_entry<F>(
    store: &DiskStore,
    entry: &ClasspathEntry,
    fingerprint: &Fingerprint,
    build: F,
) -> Result<(Vec<ClassStub>, bool)>
where
    F: FnOnce() -> Result<Vec<ClassStub>>,
{
    let key = record_key(fingerprint);

    match store.load::<EntryCacheRecord>(&key) {
        Ok(Some(record))
            if record.schema_version == CLASSPATH_ENTRY_CACHE_SCHEMA_VERSION
                && &record.fingerprint == fingerprint
                && &record.entry == entry =>
        {
            return Ok((record.stubs, true));
        }
        Ok(Some(_)) => {
            tracing::debug!(
                target = "kite.classpath",
                entry = %entry,
                "discarding mismatched classpath entry cache"
            );
            if let Err(err) = store.remove(&key) {
                tracing::debug!(target = "kite.classpath", error = %err, "failed to remove entry cache");
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::debug!(
                target = "kite.classpath",
                entry = %entry,
                error = %err,
                "failed to read classpath entry cache"
            );
        }
    }

    let stubs = build()?;

    let record = EntryCacheRecord {
        schema_version: CLASSPATH_ENTRY_CACHE_SCHEMA_VERSION,
        fingerprint: fingerprint.clone(),
        entry: entry.clone(),
        stubs,
    };
    if let Err(err) = store.store(&key, &record) {
        tracing::debug!(
            target = "kite.classpath",
            entry = %entry,
            error = %err,
            "failed to persist classpath entry cache"
        );
    }

    Ok((record.stubs, false))
}
