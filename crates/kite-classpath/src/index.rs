use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kite_cache::{DiskStore, Fingerprint, FingerprintBuilder};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::entry::ClasspathEntry;
use crate::error::Result;
use crate::jdk::JdkInstallation;
use crate::persist;
use crate::scan::index_entry;
use crate::stub::ClassStub;
use crate::table::{ClassIndex, ClassTable};

/// How the standard library joins the classpath.
#[derive(Clone, Debug, Default)]
pub struct IndexOptions {
    pub include_jdk: bool,
    /// Explicit JDK root; `JAVA_HOME` is used when absent.
    pub jdk_home: Option<PathBuf>,
}

/// Summary of one [`ClasspathIndex::build_index`] run.
#[derive(Clone, Debug)]
pub struct IndexReport {
    pub entries_indexed: usize,
    pub entries_failed: usize,
    /// Entries served from the persisted stub cache.
    pub entries_cached: usize,
    pub classes: usize,
    pub duration: Duration,
    pub fingerprint: Fingerprint,
}

struct EntryOutcome {
    entry: ClasspathEntry,
    result: Result<(Fingerprint, Vec<ClassStub>, bool)>,
}

/// The class index of one project.
///
/// Entries are registered up front; [`build_index`](Self::build_index) scans
/// them and swaps the finished [`ClassTable`] in. Readers holding an older
/// table keep using it until they ask again.
pub struct ClasspathIndex {
    entries: RwLock<Vec<ClasspathEntry>>,
    options: IndexOptions,
    store: Option<DiskStore>,
    table: RwLock<Arc<ClassTable>>,
}

impl ClasspathIndex {
    pub fn new(options: IndexOptions, store: Option<DiskStore>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            options,
            store,
            table: RwLock::new(Arc::new(ClassTable::default())),
        }
    }

    /// Register a classpath entry. Returns `false` when it was already
    /// registered. Nothing is scanned until the next build.
    pub fn add_classpath_entry(&self, entry: ClasspathEntry) -> bool {
        let entry = entry.normalize().unwrap_or(entry);
        let mut entries = self.entries.write();
        if entries.contains(&entry) {
            return false;
        }
        tracing::debug!(target = "kite.classpath", entry = %entry, "registered classpath entry");
        entries.push(entry);
        true
    }

    /// Convenience for [`add_classpath_entry`](Self::add_classpath_entry)
    /// that classifies `path` first.
    pub fn add_classpath_path(&self, path: impl AsRef<Path>) -> Result<bool> {
        let entry = ClasspathEntry::from_path(path.as_ref())?;
        Ok(self.add_classpath_entry(entry))
    }

    pub fn remove_classpath_entry(&self, entry: &ClasspathEntry) -> bool {
        let entry = entry.normalize().unwrap_or_else(|_| entry.clone());
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e != &entry);
        entries.len() != before
    }

    pub fn entries(&self) -> Vec<ClasspathEntry> {
        self.entries.read().clone()
    }

    /// The current table. Cheap; the snapshot stays valid across rebuilds.
    pub fn table(&self) -> Arc<ClassTable> {
        self.table.read().clone()
    }

    /// Scan the standard library and every registered entry and replace the
    /// table.
    ///
    /// An entry that cannot be read is logged and contributes nothing; the
    /// build itself never fails.
    pub fn build_index(&self) -> IndexReport {
        let started = Instant::now();

        let mut entries = Vec::new();
        if self.options.include_jdk {
            if let Some(jdk) = JdkInstallation::discover(self.options.jdk_home.as_deref()) {
                entries.extend(jdk.entries().iter().cloned());
            }
        }
        for entry in self.entries.read().iter() {
            if !entries.contains(entry) {
                entries.push(entry.clone());
            }
        }

        // `collect` on an indexed parallel iterator keeps classpath order.
        let outcomes: Vec<EntryOutcome> = entries
            .into_par_iter()
            .map(|entry| {
                let result = self.load_entry(&entry);
                EntryOutcome { entry, result }
            })
            .collect();

        let mut fingerprint = FingerprintBuilder::new();
        let mut entries_indexed = 0;
        let mut entries_failed = 0;
        let mut entries_cached = 0;
        let mut stubs = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok((entry_fingerprint, entry_stubs, cached)) => {
                    entries_indexed += 1;
                    if cached {
                        entries_cached += 1;
                    }
                    fingerprint.push_str(entry_fingerprint.as_str());
                    let path = outcome.entry.path().to_path_buf();
                    stubs.extend(entry_stubs.into_iter().map(|stub| (path.clone(), stub)));
                }
                Err(err) => {
                    entries_failed += 1;
                    fingerprint.push_str("failed");
                    fingerprint.push_str(&outcome.entry.path().to_string_lossy());
                    tracing::warn!(
                        target = "kite.classpath",
                        entry = %outcome.entry,
                        error = %err,
                        "skipping unreadable classpath entry"
                    );
                }
            }
        }

        let fingerprint = fingerprint.finish();
        let table = Arc::new(ClassTable::from_stubs(stubs, Some(fingerprint.clone())));
        let classes = table.len();
        *self.table.write() = table;

        let report = IndexReport {
            entries_indexed,
            entries_failed,
            entries_cached,
            classes,
            duration: started.elapsed(),
            fingerprint,
        };
        tracing::info!(
            target = "kite.classpath",
            entries_indexed,
            entries_failed,
            entries_cached,
            classes,
            duration_ms = report.duration.as_millis() as u64,
            "classpath index built"
        );
        report
    }

    fn load_entry(&self, entry: &ClasspathEntry) -> Result<(Fingerprint, Vec<ClassStub>, bool)> {
        let fingerprint = entry.fingerprint()?;
        let (stubs, cached) = match &self.store {
            Some(store) => {
                persist::load_or_build_entry(store, entry, &fingerprint, || index_entry(entry))?
            }
            None => (index_entry(entry)?, false),
        };
        Ok((fingerprint, stubs, cached))
    }

    pub fn resolve(&self, fqcn: &str) -> Option<Arc<ClassIndex>> {
        self.table().resolve(fqcn)
    }

    pub fn resolve_by_simple_name(&self, name: &str) -> Vec<Arc<ClassIndex>> {
        self.table().resolve_by_simple_name(name)
    }

    pub fn supertype_chain(&self, fqcn: &str) -> Vec<String> {
        self.table().supertype_chain(fqcn)
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.table().fingerprint().cloned()
    }
}

impl std::fmt::Debug for ClasspathIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClasspathIndex")
            .field("entries", &self.entries.read().len())
            .field("classes", &self.table.read().len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
