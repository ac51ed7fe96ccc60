use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use kite_classpath::ClassTable;
use kite_core::{ClassKind, ROOT_TYPE};
use kite_members::resolve_class_name;
use kite_source::{ParsedSource, TypeScope};
use parking_lot::RwLock;

/// Types known to one query: the indexed class table plus every loaded
/// source file.
///
/// Source declarations shadow indexed classes of the same name since they
/// reflect unsaved edits. Ancestor lists are computed once per type and
/// reused for the rest of the query.
pub struct TypeHierarchy<'a> {
    table: &'a ClassTable,
    sources: &'a [Arc<ParsedSource>],
    declared: HashMap<&'a str, (&'a ParsedSource, &'a TypeScope)>,
    ancestors: RwLock<HashMap<String, Arc<[String]>>>,
}

impl<'a> TypeHierarchy<'a> {
    /// The first source declaring a name wins.
    pub fn new(table: &'a ClassTable, sources: &'a [Arc<ParsedSource>]) -> Self {
        let mut declared = HashMap::new();
        for source in sources {
            let source: &'a ParsedSource = source;
            for scope in source.all_types() {
                declared.entry(scope.name.as_str()).or_insert((source, scope));
            }
        }
        Self {
            table,
            sources,
            declared,
            ancestors: RwLock::new(HashMap::new()),
        }
    }

    pub fn table(&self) -> &'a ClassTable {
        self.table
    }

    pub fn sources(&self) -> &'a [Arc<ParsedSource>] {
        self.sources
    }

    /// The source declaration of `fqcn` and the file it lives in.
    pub fn source_type(&self, fqcn: &str) -> Option<(&'a ParsedSource, &'a TypeScope)> {
        self.declared.get(fqcn).copied()
    }

    pub fn exists(&self, fqcn: &str) -> bool {
        self.declared.contains_key(fqcn) || self.table.contains(fqcn)
    }

    /// The name `name` is known under, trying nested-class spellings of a
    /// dotted name; `name` itself when nothing matches.
    pub fn canonical_name(&self, name: &str) -> String {
        if self.exists(name) {
            return name.to_string();
        }
        kite_core::inner_class_candidates(name)
            .into_iter()
            .find(|candidate| self.exists(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    /// The known type a name written in `source` refers to.
    pub fn resolve_type_name(&self, source: &ParsedSource, name: &str) -> Option<String> {
        let erased = kite_core::erase_generics(name);
        let erased = erased.trim_end_matches("[]");
        if self.exists(erased) {
            return Some(erased.to_string());
        }
        if let Some(indexed) = resolve_class_name(self.table, erased) {
            return Some(indexed);
        }
        if erased.contains('.') {
            let nested = self.canonical_name(erased);
            if self.exists(&nested) {
                return Some(nested);
            }
        }
        source
            .type_name_candidates(erased)
            .into_iter()
            .find(|candidate| self.exists(candidate))
    }

    /// The known type a site's declaring class names. Front ends leave
    /// names they could not qualify as spelled (`Greeter`, `Outer.Inner`);
    /// those resolve like any other name written in `source`, and stay as
    /// written when nothing matches.
    pub fn site_class(&self, source: &ParsedSource, class: &str) -> String {
        self.resolve_type_name(source, class)
            .unwrap_or_else(|| class.to_string())
    }

    /// Every ancestor of `fqcn`: superclasses nearest first, then interfaces,
    /// ending with the root type. Empty for the root itself.
    pub fn ancestors(&self, fqcn: &str) -> Vec<String> {
        self.ancestor_list(fqcn).to_vec()
    }

    /// Whether a value of type `sub` is a `sup`.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.ancestor_list(sub).iter().any(|ancestor| ancestor == sup)
    }

    fn ancestor_list(&self, fqcn: &str) -> Arc<[String]> {
        if let Some(known) = self.ancestors.read().get(fqcn) {
            return Arc::clone(known);
        }
        let computed: Arc<[String]> = self.walk_ancestors(fqcn).into();
        self.ancestors
            .write()
            .entry(fqcn.to_string())
            .or_insert(computed)
            .clone()
    }

    fn walk_ancestors(&self, fqcn: &str) -> Vec<String> {
        if fqcn == ROOT_TYPE {
            return Vec::new();
        }
        let mut out: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::from([fqcn.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([fqcn.to_string()]);

        while let Some(current) = queue.pop_front() {
            for parent in self.direct_supertypes(&current) {
                if parent != ROOT_TYPE && seen.insert(parent.clone()) {
                    out.push(parent.clone());
                    queue.push_back(parent);
                }
            }
        }
        out.push(ROOT_TYPE.to_string());
        out
    }

    fn direct_supertypes(&self, fqcn: &str) -> Vec<String> {
        if let Some((source, scope)) = self.source_type(fqcn) {
            let mut parents = Vec::new();
            match &scope.super_class {
                Some(name) => parents.push(self.resolve_type_name(source, name).unwrap_or_else(|| name.clone())),
                None if scope.kind != ClassKind::Interface => parents.push(ROOT_TYPE.to_string()),
                None => {}
            }
            for name in &scope.interfaces {
                parents.push(self.resolve_type_name(source, name).unwrap_or_else(|| name.clone()));
            }
            return parents;
        }
        match self.table.resolve(fqcn) {
            Some(class) => class.supertypes.iter().take(1).chain(&class.interfaces).cloned().collect(),
            None => Vec::new(),
        }
    }
}
