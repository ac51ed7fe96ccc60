use std::path::{Path, PathBuf};
use std::sync::Arc;

use kite_classpath::ClasspathIndex;
use kite_core::{binary_to_source_name, package_name, simple_name, ClassKind, Position, SourceRange};
use kite_members::{MemberCache, MemberDescriptor, MemberKind};
use kite_source::{MethodDecl, ParsedSource, SourceCache, TypeScope, Variable};
use rayon::prelude::*;

use crate::compat::arguments_compatible;
use crate::condition::{ConditionKind, SearchCondition};
use crate::declaration::{Declaration, DeclarationKind, Reference};
use crate::hierarchy::TypeHierarchy;
use crate::lookup::{first_found, Lookup};

/// A member found in the index or in a source file.
#[derive(Debug, Clone)]
struct ResolvedMember {
    kind: MemberKind,
    name: String,
    declaring_class: String,
    params: Option<Vec<String>>,
    is_varargs: bool,
    signature: String,
    location: Option<Reference>,
}

impl ResolvedMember {
    fn from_descriptor(member: &MemberDescriptor) -> Self {
        Self {
            kind: member.kind,
            name: member.name.clone(),
            declaring_class: member.declaring_class.clone(),
            params: member.params.clone(),
            is_varargs: member.is_varargs,
            signature: member.declaration.clone(),
            location: None,
        }
    }

    fn from_field(owner: &TypeScope, field: &Variable, path: &Path) -> Self {
        Self {
            kind: MemberKind::Field,
            name: field.name.clone(),
            declaring_class: owner.name.clone(),
            params: None,
            is_varargs: false,
            signature: format!("{} {}", binary_to_source_name(&field.ty), field.name),
            location: Some(Reference::new(path, field.range)),
        }
    }

    fn from_method(owner: &TypeScope, decl: &MethodDecl, path: &Path) -> Self {
        let params = decl
            .param_types
            .iter()
            .map(|ty| binary_to_source_name(ty))
            .collect::<Vec<_>>()
            .join(", ");
        let signature = match &decl.return_type {
            Some(ret) => format!("{} {}({params})", binary_to_source_name(ret), decl.name),
            None => format!("{}({params})", owner.simple_name()),
        };
        Self {
            kind: if decl.is_constructor() {
                MemberKind::Constructor
            } else {
                MemberKind::Method
            },
            name: decl.name.clone(),
            declaring_class: owner.name.clone(),
            params: Some(decl.param_types.clone()),
            is_varargs: decl.is_varargs,
            signature,
            location: Some(Reference::new(path, decl.name_range)),
        }
    }

    /// The constructor a class without declared constructors gets.
    fn default_constructor(owner: &TypeScope, path: &Path) -> Self {
        Self {
            kind: MemberKind::Constructor,
            name: owner.simple_name().to_string(),
            declaring_class: owner.name.clone(),
            params: Some(Vec::new()),
            is_varargs: false,
            signature: format!("{}()", owner.simple_name()),
            location: Some(Reference::new(path, owner.name_range)),
        }
    }

    fn accepts(&self, args: &[String], hierarchy: &TypeHierarchy<'_>) -> bool {
        match &self.params {
            Some(params) => arguments_compatible(params, self.is_varargs, args, hierarchy),
            None => false,
        }
    }
}

/// What the symbol under the cursor was resolved to.
#[derive(Debug, Clone)]
enum Target {
    ReservedWord,
    Member(ResolvedMember),
    Type {
        fqcn: String,
        kind: ClassKind,
        location: Option<Reference>,
    },
    Local {
        owner: String,
        method: String,
        scope: SourceRange,
        declaration: Variable,
        path: PathBuf,
    },
}

struct Query<'a> {
    source: &'a ParsedSource,
    pos: Position,
    symbol: &'a str,
    hierarchy: &'a TypeHierarchy<'a>,
    members: &'a MemberCache,
}

type Strategy = for<'q, 'a> fn(&'q Query<'a>) -> Lookup<Target>;

/// Reference-site strategies first, then declaration sites, then plain
/// type names and variables.
const STRATEGIES: &[Strategy] = &[
    reserved_word,
    field_access,
    method_call,
    method_declaration,
    field_declaration,
    type_declaration,
    class_name,
    variable,
];

impl Target {
    /// Whether a lookup over part of the project can stand: a source
    /// declaration, a local or a reserved word. Results from the index alone
    /// may be shadowed by a source file that was not loaded.
    fn is_settled(&self) -> bool {
        match self {
            Target::ReservedWord | Target::Local { .. } => true,
            Target::Member(member) => member.location.is_some(),
            Target::Type { location, .. } => location.is_some(),
        }
    }
}

/// Declaration and reference search over one project's index and caches.
pub struct Resolver {
    index: Arc<ClasspathIndex>,
    members: Arc<MemberCache>,
    sources: Arc<SourceCache>,
}

impl Resolver {
    pub fn new(index: Arc<ClasspathIndex>, members: Arc<MemberCache>, sources: Arc<SourceCache>) -> Self {
        Self {
            index,
            members,
            sources,
        }
    }

    /// Resolve `symbol` at `line`:`column` of `path`.
    ///
    /// The trees already in memory are tried first. The remaining known
    /// sources are loaded only when that leaves the symbol unresolved or
    /// resolved to the index alone, since an unloaded file may declare it.
    pub fn search_declaration(&self, path: &Path, line: u32, column: u32, symbol: &str) -> Option<Declaration> {
        let source = self.current_source(path)?;
        let pos = Position::new(line, column);
        let table = self.index.table();

        let resident = self.resident_sources(&source);
        let hierarchy = TypeHierarchy::new(&table, &resident);
        let target = match self.resolve_target(&source, pos, symbol, &hierarchy) {
            Some(target) if target.is_settled() => target,
            _ => {
                let sources = self.load_sources(&source);
                let hierarchy = TypeHierarchy::new(&table, &sources);
                self.resolve_target(&source, pos, symbol, &hierarchy)?
            }
        };
        let argument_index = source
            .call_enclosing_argument(pos)
            .and_then(|(_, index)| i32::try_from(index).ok())
            .unwrap_or(-1);
        let declaration = declaration_of(target, symbol, argument_index);
        tracing::debug!(
            target = "kite.resolve",
            path = %path.display(),
            line,
            column,
            symbol,
            kind = ?declaration.kind,
            "resolved declaration"
        );
        Some(declaration)
    }

    /// The search condition for `symbol` at `line`:`column` of `path`.
    pub fn search_condition(&self, path: &Path, line: u32, column: u32, symbol: &str) -> Option<SearchCondition> {
        let source = self.current_source(path)?;
        let table = self.index.table();
        let sources = self.load_sources(&source);
        let hierarchy = TypeHierarchy::new(&table, &sources);
        let target = self.resolve_target(&source, Position::new(line, column), symbol, &hierarchy)?;
        condition_of(target)
    }

    /// Every site across the known sources that refers to what `symbol` at
    /// `line`:`column` of `path` resolves to, sorted by path and position.
    pub fn search_references(&self, path: &Path, line: u32, column: u32, symbol: &str) -> Vec<Reference> {
        let Some(source) = self.current_source(path) else {
            return Vec::new();
        };
        let table = self.index.table();
        let sources = self.load_sources(&source);
        let hierarchy = TypeHierarchy::new(&table, &sources);

        let Some(condition) = self
            .resolve_target(&source, Position::new(line, column), symbol, &hierarchy)
            .and_then(condition_of)
        else {
            tracing::debug!(target = "kite.resolve", path = %path.display(), symbol, "no search condition");
            return Vec::new();
        };

        let mut references: Vec<Reference> = sources
            .par_iter()
            .flat_map_iter(|source| condition.references_in(source, &hierarchy))
            .collect();
        references.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.line().cmp(&b.line()))
                .then_with(|| a.column().cmp(&b.column()))
        });
        references.dedup_by(|a, b| a.path == b.path && a.range.begin == b.range.begin);

        tracing::debug!(
            target = "kite.resolve",
            symbol,
            declaring_class = %condition.declaring_class,
            files = sources.len(),
            references = references.len(),
            "searched references"
        );
        references
    }

    fn current_source(&self, path: &Path) -> Option<Arc<ParsedSource>> {
        match self.sources.get_source(path) {
            Ok(source) => Some(source),
            Err(err) => {
                tracing::debug!(
                    target = "kite.resolve",
                    path = %path.display(),
                    error = %err,
                    "failed to load source"
                );
                None
            }
        }
    }

    /// `current` plus the other trees held in memory.
    fn resident_sources(&self, current: &Arc<ParsedSource>) -> Vec<Arc<ParsedSource>> {
        let mut sources: Vec<Arc<ParsedSource>> = self
            .sources
            .resident_sources()
            .into_iter()
            .filter(|source| !source.placeholder && source.path() != current.path())
            .collect();
        if !current.placeholder {
            sources.insert(0, current.clone());
        }
        sources
    }

    /// `current` plus every other known source that loads.
    fn load_sources(&self, current: &Arc<ParsedSource>) -> Vec<Arc<ParsedSource>> {
        let known = self.sources.known_sources();
        let mut sources: Vec<Arc<ParsedSource>> = known
            .par_iter()
            .filter(|path| path.as_path() != current.path())
            .filter_map(|path| match self.sources.get_source(path) {
                Ok(source) if !source.placeholder => Some(source),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(
                        target = "kite.resolve",
                        path = %path.display(),
                        error = %err,
                        "skipping unparsable source"
                    );
                    None
                }
            })
            .collect();
        if !current.placeholder {
            sources.insert(0, current.clone());
        }
        sources
    }

    fn resolve_target(
        &self,
        source: &ParsedSource,
        pos: Position,
        symbol: &str,
        hierarchy: &TypeHierarchy<'_>,
    ) -> Option<Target> {
        if symbol.is_empty() {
            return None;
        }
        let query = Query {
            source,
            pos,
            symbol,
            hierarchy,
            members: &self.members,
        };
        first_found(&query, STRATEGIES).into_option()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

fn reserved_word(query: &Query<'_>) -> Lookup<Target> {
    if kite_core::is_reserved_word(query.symbol) {
        Lookup::Found(Target::ReservedWord)
    } else {
        Lookup::NotFound
    }
}

fn field_access(query: &Query<'_>) -> Lookup<Target> {
    let Some((owner, access)) = query.source.field_access_at(query.pos, query.symbol) else {
        return Lookup::NotFound;
    };
    let class = query
        .hierarchy
        .site_class(query.source, access.declaring_class.as_deref().unwrap_or(&owner.name));
    find_field(query, &class, &access.name).map(Target::Member).into()
}

fn method_call(query: &Query<'_>) -> Lookup<Target> {
    let Some((owner, call)) = query.source.method_call_at(query.pos, query.symbol) else {
        return Lookup::NotFound;
    };
    let class = query
        .hierarchy
        .site_class(query.source, call.declaring_class.as_deref().unwrap_or(&owner.name));
    let found = if call.is_constructor {
        find_constructor(query, &class, &call.arg_types)
    } else {
        find_method(query, &class, &call.name, &call.arg_types)
    };
    found.map(Target::Member).into()
}

fn method_declaration(query: &Query<'_>) -> Lookup<Target> {
    query
        .source
        .method_declaration_at(query.pos, query.symbol)
        .map(|(owner, _, decl)| Target::Member(ResolvedMember::from_method(owner, decl, query.source.path())))
        .into()
}

fn field_declaration(query: &Query<'_>) -> Lookup<Target> {
    query
        .source
        .field_declaration_at(query.pos, query.symbol)
        .map(|(owner, field)| Target::Member(ResolvedMember::from_field(owner, field, query.source.path())))
        .into()
}

fn type_declaration(query: &Query<'_>) -> Lookup<Target> {
    query
        .source
        .type_declaration_at(query.pos, query.symbol)
        .map(|scope| Target::Type {
            fqcn: scope.name.clone(),
            kind: scope.kind,
            location: Some(Reference::new(query.source.path(), scope.name_range)),
        })
        .into()
}

/// A type reference at the cursor, or failing that `symbol` read as a type
/// name visible in the file.
fn class_name(query: &Query<'_>) -> Lookup<Target> {
    let written = query
        .source
        .type_reference_at(query.pos, query.symbol)
        .map(|reference| reference.name.as_str())
        .unwrap_or(query.symbol);
    let Some(fqcn) = query.hierarchy.resolve_type_name(query.source, written) else {
        return Lookup::NotFound;
    };

    if let Some((source, scope)) = query.hierarchy.source_type(&fqcn) {
        return Lookup::Found(Target::Type {
            kind: scope.kind,
            location: Some(Reference::new(source.path(), scope.name_range)),
            fqcn,
        });
    }
    match query.hierarchy.table().resolve(&fqcn) {
        Some(class) => Lookup::Found(Target::Type {
            fqcn,
            kind: class.kind,
            location: None,
        }),
        None => Lookup::NotFound,
    }
}

fn variable(query: &Query<'_>) -> Lookup<Target> {
    let Some((owner, block, occurrence)) = query.source.variable_at(query.pos, query.symbol) else {
        return Lookup::NotFound;
    };
    let declaration = if occurrence.is_def {
        occurrence
    } else {
        match query.source.visible_variable(occurrence.range.begin, query.symbol) {
            Some(declaration) => declaration,
            None => return Lookup::NotFound,
        }
    };

    let is_field = query
        .source
        .all_types()
        .iter()
        .any(|scope| scope.fields.iter().any(|field| std::ptr::eq(field, declaration)));
    if is_field {
        return find_field(query, &owner.name, &declaration.name).map(Target::Member).into();
    }

    let method = block.method.as_ref().map(|decl| decl.name.clone()).unwrap_or_default();
    Lookup::Found(Target::Local {
        owner: owner.name.clone(),
        method,
        scope: block.range,
        declaration: declaration.clone(),
        path: query.source.path().to_path_buf(),
    })
}

/// `class` followed by its ancestors, each under its known name.
fn lookup_chain(query: &Query<'_>, class: &str) -> Vec<String> {
    let class = query.hierarchy.canonical_name(class);
    let mut chain = query.hierarchy.ancestors(&class);
    chain.insert(0, class);
    chain
}

fn find_field(query: &Query<'_>, class: &str, name: &str) -> Option<ResolvedMember> {
    for candidate in lookup_chain(query, class) {
        if let Some((source, scope)) = query.hierarchy.source_type(&candidate) {
            if let Some(field) = scope.fields.iter().find(|field| field.is_def && field.name == name) {
                return Some(ResolvedMember::from_field(scope, field, source.path()));
            }
            continue;
        }
        let set = query.members.get_members(&candidate);
        let found = set
            .named(name)
            .find(|member| member.is_field())
            .map(ResolvedMember::from_descriptor);
        if found.is_some() {
            return found;
        }
    }
    None
}

/// The overload of `name` the arguments fit, or the only overload there is.
fn find_method(query: &Query<'_>, class: &str, name: &str, args: &[String]) -> Option<ResolvedMember> {
    let mut overloads: Vec<ResolvedMember> = Vec::new();
    for candidate in lookup_chain(query, class) {
        let found: Vec<ResolvedMember> = match query.hierarchy.source_type(&candidate) {
            Some((source, scope)) => scope
                .methods()
                .filter(|(_, decl)| !decl.is_constructor() && decl.name == name)
                .map(|(_, decl)| ResolvedMember::from_method(scope, decl, source.path()))
                .collect(),
            None => query
                .members
                .get_members(&candidate)
                .named(name)
                .filter(|member| member.kind == MemberKind::Method)
                .map(ResolvedMember::from_descriptor)
                .collect(),
        };
        for member in found {
            if member.accepts(args, query.hierarchy) {
                return Some(member);
            }
            let duplicate = overloads
                .iter()
                .any(|seen| seen.params == member.params && seen.declaring_class == member.declaring_class);
            if !duplicate {
                overloads.push(member);
            }
        }
    }
    if overloads.len() == 1 {
        overloads.pop()
    } else {
        None
    }
}

fn find_constructor(query: &Query<'_>, class: &str, args: &[String]) -> Option<ResolvedMember> {
    let class = query.hierarchy.canonical_name(class);
    if let Some((source, scope)) = query.hierarchy.source_type(&class) {
        let declared: Vec<ResolvedMember> = scope
            .methods()
            .filter(|(_, decl)| decl.is_constructor())
            .map(|(_, decl)| ResolvedMember::from_method(scope, decl, source.path()))
            .collect();
        if declared.is_empty() {
            return args
                .is_empty()
                .then(|| ResolvedMember::default_constructor(scope, source.path()));
        }
        let only = (declared.len() == 1).then(|| declared[0].clone());
        return declared
            .into_iter()
            .find(|ctor| ctor.accepts(args, query.hierarchy))
            .or(only);
    }

    let set = query.members.get_members(&class);
    let declared: Vec<&MemberDescriptor> = set
        .iter()
        .filter(|member| member.kind == MemberKind::Constructor && member.declaring_class == class)
        .collect();
    declared
        .iter()
        .map(|member| ResolvedMember::from_descriptor(member))
        .find(|ctor| ctor.accepts(args, query.hierarchy))
        .or_else(|| (declared.len() == 1).then(|| ResolvedMember::from_descriptor(declared[0])))
}

fn declaration_of(target: Target, symbol: &str, argument_index: i32) -> Declaration {
    let (scope, signature, kind, location) = match target {
        Target::ReservedWord => (String::new(), symbol.to_string(), DeclarationKind::ReservedWord, None),
        Target::Member(member) => (
            binary_to_source_name(&member.declaring_class),
            member.signature,
            member.kind.into(),
            member.location,
        ),
        Target::Type { fqcn, kind, location } => (
            package_name(&fqcn).to_string(),
            format!("{} {}", kind.as_str(), binary_to_source_name(&fqcn)),
            DeclarationKind::Type(kind),
            location,
        ),
        Target::Local {
            owner,
            method,
            declaration,
            path,
            ..
        } => (
            format!("{}#{method}", binary_to_source_name(&owner)),
            format!("{} {}", binary_to_source_name(&declaration.ty), declaration.name),
            if declaration.is_parameter {
                DeclarationKind::Parameter
            } else {
                DeclarationKind::LocalVariable
            },
            Some(Reference::new(path, declaration.range)),
        ),
    };
    Declaration {
        scope,
        signature,
        kind,
        argument_index,
        location,
    }
}

fn condition_of(target: Target) -> Option<SearchCondition> {
    let condition = match target {
        Target::ReservedWord => return None,
        Target::Member(member) => {
            let kind = match member.kind {
                MemberKind::Field => ConditionKind::Field,
                MemberKind::Method => ConditionKind::Method,
                MemberKind::Constructor => ConditionKind::Constructor,
            };
            let condition = SearchCondition::new(kind, &member.declaring_class, &member.name);
            match member.params {
                Some(params) => condition.with_params(params, member.is_varargs),
                None => condition,
            }
        }
        Target::Type { fqcn, .. } => SearchCondition::new(ConditionKind::Type, &fqcn, simple_name(&fqcn)),
        Target::Local {
            owner,
            scope,
            declaration,
            path,
            ..
        } => SearchCondition::new(ConditionKind::Local { path, scope }, &owner, &declaration.name),
    };
    Some(condition)
}
