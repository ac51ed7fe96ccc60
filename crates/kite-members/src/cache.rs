use std::convert::Infallible;
use std::sync::Arc;

use kite_cache::{CacheStats, DiskStore, Fingerprint, MemoryCache, MemoryCachePolicy, RemovalCause};
use kite_classpath::{ClassTable, ClasspathIndex};
use kite_core::inner_class_candidates;
use serde::{Deserialize, Serialize};

use crate::descriptor::MemberDescriptor;
use crate::flatten::flatten;

/// Bumped whenever [`MemberDescriptor`] changes shape.
const MEMBER_SET_SCHEMA_VERSION: u32 = 1;

/// The flattened members of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSet {
    pub fqcn: String,
    /// Fingerprint of the class table the set was derived from.
    pub fingerprint: Option<Fingerprint>,
    pub members: Vec<MemberDescriptor>,
}

impl MemberSet {
    pub fn empty(fqcn: &str) -> Self {
        Self {
            fqcn: fqcn.to_string(),
            fingerprint: None,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberDescriptor> {
        self.members.iter()
    }

    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MemberDescriptor> + 'a {
        self.members.iter().filter(move |m| m.name == name)
    }
}

#[derive(Serialize, Deserialize)]
struct MemberRecord {
    schema_version: u32,
    set: MemberSet,
}

fn record_key(fqcn: &str) -> String {
    format!("members:{fqcn}")
}

/// Two-tier cache of flattened member sets.
///
/// The memory tier is bounded and access-expiring; whatever it evicts is
/// written to the persisted tier, and explicit invalidation deletes from
/// both. Persisted sets are only served while their fingerprint matches the
/// current class table.
pub struct MemberCache {
    index: Arc<ClasspathIndex>,
    memory: MemoryCache<String, MemberSet>,
    store: Option<DiskStore>,
}

impl MemberCache {
    pub fn new(index: Arc<ClasspathIndex>, policy: MemoryCachePolicy, store: Option<DiskStore>) -> Self {
        let mut memory = MemoryCache::new("members", policy);
        if let Some(store) = store.clone() {
            memory = memory.on_removal(move |fqcn: &String, set: &Arc<MemberSet>, cause| {
                on_removal(&store, fqcn, set, cause)
            });
        }
        Self { index, memory, store }
    }

    /// Flattened members of `fqcn`.
    ///
    /// Dotted nested-class names (`a.Outer.Inner`) are retried with the
    /// inner-class marker. Unknown classes yield an empty set that is not
    /// cached.
    pub fn get_members(&self, fqcn: &str) -> Arc<MemberSet> {
        let table = self.index.table();
        let Some(name) = resolve_class_name(&table, fqcn) else {
            tracing::trace!(target = "kite.members", fqcn, "unknown class");
            return Arc::new(MemberSet::empty(fqcn));
        };
        let fingerprint = table.fingerprint().cloned();

        if let Some(set) = self.memory.get(&name) {
            if set.fingerprint == fingerprint {
                return set;
            }
            // Left over from an older table.
            self.memory.discard(&name);
        }

        let loaded = self
            .memory
            .get_or_try_insert_with(&name, || -> Result<Option<MemberSet>, Infallible> {
                if let Some(set) = self.load_persisted(&name, fingerprint.as_ref()) {
                    return Ok(Some(set));
                }
                let set = MemberSet {
                    fqcn: name.clone(),
                    fingerprint: fingerprint.clone(),
                    members: flatten(&table, &name),
                };
                self.persist(&set);
                Ok(Some(set))
            });

        match loaded {
            Ok(Some(set)) => set,
            Ok(None) => Arc::new(MemberSet::empty(fqcn)),
            Err(never) => match never {},
        }
    }

    /// Drop `fqcn` from memory and delete its persisted set.
    pub fn invalidate(&self, fqcn: &str) {
        let table = self.index.table();
        let mut names = vec![fqcn.to_string()];
        if let Some(resolved) = resolve_class_name(&table, fqcn) {
            if resolved != fqcn {
                names.push(resolved);
            }
        }

        for name in names {
            // The removal hook deletes the record for live entries; the record
            // may also exist with nothing in memory.
            if self.memory.invalidate(&name).is_none() {
                if let Some(store) = &self.store {
                    remove_record(store, &name);
                }
            }
        }
    }

    /// Drop every entry from memory and storage.
    pub fn invalidate_all(&self) {
        self.memory.invalidate_all();
        if let Some(store) = &self.store {
            if let Err(err) = store.clear() {
                tracing::warn!(target = "kite.members", error = %err, "failed to clear member store");
            }
        }
    }

    /// Forget everything in memory without touching storage. Used after a
    /// classpath rebuild; persisted sets from the old table no longer match
    /// its fingerprint.
    pub fn discard_all(&self) {
        self.memory.discard_all();
    }

    /// Apply pending expiry so evicted sets reach storage.
    pub fn run_pending_tasks(&self) {
        self.memory.run_pending_tasks();
    }

    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    pub fn contains_in_memory(&self, fqcn: &str) -> bool {
        self.memory.contains_key(&fqcn.to_string())
    }

    fn load_persisted(&self, fqcn: &str, fingerprint: Option<&Fingerprint>) -> Option<MemberSet> {
        let store = self.store.as_ref()?;
        let key = record_key(fqcn);
        match store.load::<MemberRecord>(&key) {
            Ok(Some(record))
                if record.schema_version == MEMBER_SET_SCHEMA_VERSION
                    && record.set.fqcn == fqcn
                    && record.set.fingerprint.as_ref() == fingerprint =>
            {
                tracing::trace!(target = "kite.members", fqcn, "member set restored from disk");
                Some(record.set)
            }
            Ok(Some(_)) => {
                tracing::debug!(target = "kite.members", fqcn, "discarding stale member set");
                remove_record(store, fqcn);
                None
            }
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(target = "kite.members", fqcn, error = %err, "failed to read member set");
                None
            }
        }
    }

    fn persist(&self, set: &MemberSet) {
        if let Some(store) = &self.store {
            store_record(store, set);
        }
    }
}

impl std::fmt::Debug for MemberCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberCache")
            .field("memory", &self.memory)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

/// The indexed name `fqcn` refers to, trying nested-class spellings.
pub fn resolve_class_name(table: &ClassTable, fqcn: &str) -> Option<String> {
    if table.contains(fqcn) {
        return Some(fqcn.to_string());
    }
    inner_class_candidates(fqcn)
        .into_iter()
        .find(|candidate| table.contains(candidate))
}

fn on_removal(store: &DiskStore, fqcn: &str, set: &MemberSet, cause: RemovalCause) {
    match cause {
        RemovalCause::Size | RemovalCause::Expired => store_record(store, set),
        RemovalCause::Explicit => remove_record(store, fqcn),
        RemovalCause::Replaced => {}
    }
}

fn store_record(store: &DiskStore, set: &MemberSet) {
    let record = MemberRecord {
        schema_version: MEMBER_SET_SCHEMA_VERSION,
        set: set.clone(),
    };
    if let Err(err) = store.store(&record_key(&set.fqcn), &record) {
        tracing::debug!(
            target = "kite.members",
            fqcn = %set.fqcn,
            error = %err,
            "failed to persist member set"
        );
    }
}

fn remove_record(store: &DiskStore, fqcn: &str) {
    if let Err(err) = store.remove(&record_key(fqcn)) {
        tracing::debug!(target = "kite.members", fqcn, error = %err, "failed to delete member set");
    }
}
