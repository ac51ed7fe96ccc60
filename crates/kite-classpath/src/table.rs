use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use kite_cache::Fingerprint;
use kite_core::{package_name, simple_name, ClassKind, ROOT_TYPE};
use serde::{Deserialize, Serialize};

use crate::stub::ClassStub;

/// Where a class was loaded from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassOrigin {
    /// The classpath entry (directory, jar or jmod).
    pub entry: PathBuf,
    /// Location of the class file inside the entry.
    pub location: String,
}

/// The indexed view of one class, interface, enum or annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIndex {
    pub fqcn: String,
    pub simple_name: String,
    pub package: String,
    pub kind: ClassKind,
    /// Superclasses, immediate parent first, ending with [`ROOT_TYPE`].
    /// Empty only for the root itself.
    pub supertypes: Vec<String>,
    /// Directly declared interfaces, in declaration order.
    pub interfaces: Vec<String>,
    pub origin: Option<ClassOrigin>,
    pub synthetic: bool,
}

/// An immutable snapshot of the whole classpath.
///
/// Built in one go and swapped in atomically by
/// [`ClasspathIndex`](crate::ClasspathIndex); never patched.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<String, Arc<ClassIndex>>,
    stubs: HashMap<String, Arc<ClassStub>>,
    by_simple_name: HashMap<String, Vec<String>>,
    names_sorted: Vec<String>,
    packages_sorted: Vec<String>,
    fingerprint: Option<Fingerprint>,
}

impl ClassTable {
    /// Build a table from stubs in classpath order; the first stub defining a
    /// name wins.
    pub fn from_stubs(
        stubs: impl IntoIterator<Item = (PathBuf, ClassStub)>,
        fingerprint: Option<Fingerprint>,
    ) -> Self {
        let mut by_name: HashMap<String, Arc<ClassStub>> = HashMap::new();
        let mut origins: HashMap<String, ClassOrigin> = HashMap::new();
        for (entry, stub) in stubs {
            if by_name.contains_key(&stub.binary_name) {
                continue;
            }
            origins.insert(
                stub.binary_name.clone(),
                ClassOrigin {
                    entry,
                    location: stub.location.clone(),
                },
            );
            by_name.insert(stub.binary_name.clone(), Arc::new(stub));
        }

        let mut classes = HashMap::with_capacity(by_name.len());
        let mut by_simple_name: HashMap<String, Vec<String>> = HashMap::new();
        let mut packages = BTreeSet::new();
        for (fqcn, stub) in &by_name {
            let simple = simple_name(fqcn).to_string();
            let package = package_name(fqcn).to_string();
            by_simple_name
                .entry(simple.clone())
                .or_default()
                .push(fqcn.clone());
            if !package.is_empty() {
                packages.insert(package.clone());
            }

            classes.insert(
                fqcn.clone(),
                Arc::new(ClassIndex {
                    fqcn: fqcn.clone(),
                    simple_name: simple,
                    package,
                    kind: stub.kind(),
                    supertypes: supertype_chain_of(fqcn, &by_name),
                    interfaces: stub.interfaces.clone(),
                    origin: origins.remove(fqcn),
                    synthetic: stub.synthetic_or_anonymous,
                }),
            );
        }
        for names in by_simple_name.values_mut() {
            names.sort();
        }

        let mut names_sorted: Vec<String> = by_name.keys().cloned().collect();
        names_sorted.sort();

        Self {
            classes,
            stubs: by_name,
            by_simple_name,
            names_sorted,
            packages_sorted: packages.into_iter().collect(),
            fingerprint,
        }
    }

    /// Fingerprint of the classpath the table was built from.
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn resolve(&self, fqcn: &str) -> Option<Arc<ClassIndex>> {
        self.classes.get(fqcn).cloned()
    }

    pub fn contains(&self, fqcn: &str) -> bool {
        self.classes.contains_key(fqcn)
    }

    pub fn stub(&self, fqcn: &str) -> Option<Arc<ClassStub>> {
        self.stubs.get(fqcn).cloned()
    }

    /// Every class with the given simple name, sorted by FQCN.
    pub fn resolve_by_simple_name(&self, name: &str) -> Vec<Arc<ClassIndex>> {
        self.by_simple_name
            .get(name)
            .map(|names| names.iter().filter_map(|fqcn| self.resolve(fqcn)).collect())
            .unwrap_or_default()
    }

    /// Superclasses of `fqcn`, nearest first. Empty for unknown classes and
    /// for the root itself.
    pub fn supertype_chain(&self, fqcn: &str) -> Vec<String> {
        self.classes
            .get(fqcn)
            .map(|class| class.supertypes.clone())
            .unwrap_or_default()
    }

    /// Every interface `fqcn` implements, directly or inherited, nearest
    /// first: the class's own interfaces and their super-interfaces, then
    /// those of each superclass in chain order.
    pub fn all_interfaces(&self, fqcn: &str) -> Vec<String> {
        let Some(class) = self.classes.get(fqcn) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let owners = std::iter::once(fqcn.to_string()).chain(class.supertypes.iter().cloned());
        for owner in owners {
            let Some(stub) = self.stubs.get(&owner) else {
                continue;
            };
            let mut queue: VecDeque<String> = stub.interfaces.iter().cloned().collect();
            while let Some(iface) = queue.pop_front() {
                if !seen.insert(iface.clone()) {
                    continue;
                }
                if let Some(iface_stub) = self.stubs.get(&iface) {
                    queue.extend(iface_stub.interfaces.iter().cloned());
                }
                out.push(iface);
            }
        }
        out
    }

    /// Whether `sub` is `sup` or has it among its superclasses or interfaces.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == ROOT_TYPE {
            return true;
        }
        if self.supertype_chain(sub).iter().any(|s| s == sup) {
            return true;
        }
        self.all_interfaces(sub).iter().any(|i| i == sup)
    }

    /// FQCNs starting with `prefix`, sorted. `/` is accepted as separator.
    pub fn class_names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.replace('/', ".");
        sorted_with_prefix(&self.names_sorted, &prefix)
    }

    pub fn packages_with_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.replace('/', ".");
        sorted_with_prefix(&self.packages_sorted, &prefix)
    }

    pub fn package_exists(&self, package: &str) -> bool {
        self.packages_sorted
            .binary_search_by(|p| p.as_str().cmp(package))
            .is_ok()
    }

    /// All classes, in FQCN order.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassIndex>> + '_ {
        self.names_sorted
            .iter()
            .filter_map(|fqcn| self.classes.get(fqcn))
    }
}

fn sorted_with_prefix(sorted: &[String], prefix: &str) -> Vec<String> {
    let start = sorted.partition_point(|name| name.as_str() < prefix);
    sorted[start..]
        .iter()
        .take_while(|name| name.starts_with(prefix))
        .cloned()
        .collect()
}

/// Walk superclass links from `fqcn`.
///
/// The walk ends at the root, at a parent missing from the classpath, or at
/// a repeated class (a corrupt classpath can contain cycles). Every chain
/// except the root's own ends with the root exactly once.
fn supertype_chain_of(fqcn: &str, stubs: &HashMap<String, Arc<ClassStub>>) -> Vec<String> {
    if fqcn == ROOT_TYPE {
        return Vec::new();
    }

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(fqcn.to_string());

    let mut current = stubs.get(fqcn).and_then(|s| s.super_binary_name.clone());
    while let Some(parent) = current {
        if parent == ROOT_TYPE {
            break;
        }
        if !seen.insert(parent.clone()) {
            tracing::warn!(
                target = "kite.classpath",
                class = fqcn,
                repeated = %parent,
                "supertype cycle detected; cutting chain"
            );
            break;
        }
        current = stubs.get(&parent).and_then(|s| s.super_binary_name.clone());
        chain.push(parent);
    }

    chain.push(ROOT_TYPE.to_string());
    chain
}
