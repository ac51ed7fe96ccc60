use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use kite_cache::{CacheDir, CacheLock, DiskStore};
use kite_classpath::{ClassIndex, ClassTable, ClasspathEntry, ClasspathIndex, IndexOptions, IndexReport};
use kite_config::KiteConfig;
use kite_core::SOURCE_FILE_EXTENSION;
use kite_matcher::{matcher_for, rank, CandidateUnit, MatchRequest, Matcher};
use kite_members::{MemberCache, MemberSet};
use kite_resolve::{Declaration, Reference, Resolver};
use kite_source::{ParsedSource, SourceCache, SourceCacheOptions, SourceParser};
use parking_lot::RwLock;

use crate::error::Result;
use crate::events::{has_extension, ChangeCategory, FileChange, FileChangeKind};
use crate::hook::{CompileHook, NoopCompileHook};
use crate::trigger::BackgroundTrigger;

#[derive(Clone, Debug)]
struct Stores {
    members: DiskStore,
    sources: DiskStore,
    classpath: DiskStore,
}

/// Persisted footprint of one project cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub root: Option<PathBuf>,
    pub member_sets: usize,
    pub source_snapshots: usize,
    pub classpath_entries: usize,
    pub bytes: u64,
}

/// Everything Kite knows about one project: the class index, the member and
/// source caches and the resolver on top of them.
///
/// A workspace is opened once per project root and closed when the project
/// goes away; closing persists the source cache and its checksum table.
/// Dropping an open workspace does the same on a best-effort basis.
pub struct Workspace {
    root: PathBuf,
    config: KiteConfig,
    cache_dir: Option<CacheDir>,
    stores: Option<Stores>,
    index: Arc<ClasspathIndex>,
    members: Arc<MemberCache>,
    sources: Arc<SourceCache>,
    resolver: Resolver,
    hook: Arc<dyn CompileHook>,
    background: BackgroundTrigger,
    source_roots: RwLock<Vec<PathBuf>>,
    closed: AtomicBool,
}

impl Workspace {
    /// Open the project at `root`.
    ///
    /// An unusable cache directory is logged and the workspace runs without
    /// persistence. Classpath entries from `config` are registered but not
    /// scanned; call [`build_index`](Self::build_index) for that.
    pub fn open(root: impl AsRef<Path>, config: KiteConfig, parser: Arc<dyn SourceParser>) -> Result<Self> {
        let root = kite_core::canonicalize_if_possible(root.as_ref())?;

        let cache_dir = if config.cache.enabled {
            match CacheDir::new(&root, config.cache.cache_dir_config()) {
                Ok(dir) => Some(dir),
                Err(err) => {
                    tracing::warn!(
                        target = "kite.workspace",
                        root = %root.display(),
                        error = %err,
                        "cache directory unavailable; running without persistence"
                    );
                    None
                }
            }
        } else {
            None
        };
        let stores = cache_dir.as_ref().and_then(open_stores);

        let index = Arc::new(ClasspathIndex::new(
            IndexOptions {
                include_jdk: config.classpath.include_jdk,
                jdk_home: config.classpath.jdk_home.clone(),
            },
            stores.as_ref().map(|s| s.classpath.clone()),
        ));
        for entry in &config.classpath.entries {
            if let Err(err) = index.add_classpath_path(entry) {
                tracing::warn!(
                    target = "kite.workspace",
                    path = %entry.display(),
                    error = %err,
                    "skipping classpath entry"
                );
            }
        }

        let members = Arc::new(MemberCache::new(
            Arc::clone(&index),
            config.cache.members.policy(),
            stores.as_ref().map(|s| s.members.clone()),
        ));
        let sources = Arc::new(SourceCache::new(
            parser,
            SourceCacheOptions {
                enabled: config.cache.enabled,
                policy: config.cache.sources.policy(),
            },
            stores.as_ref().map(|s| s.sources.clone()),
        ));
        let resolver = Resolver::new(Arc::clone(&index), Arc::clone(&members), Arc::clone(&sources));

        tracing::info!(
            target = "kite.workspace",
            root = %root.display(),
            cache_dir = ?cache_dir.as_ref().map(|dir| dir.root().to_path_buf()),
            classpath_entries = config.classpath.entries.len(),
            "opened workspace"
        );

        Ok(Self {
            root,
            config,
            cache_dir,
            stores,
            index,
            members,
            sources,
            resolver,
            hook: Arc::new(NoopCompileHook),
            background: BackgroundTrigger::new("background"),
            source_roots: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Open `root` with the config discovered in it.
    pub fn open_discovered(root: impl AsRef<Path>, parser: Arc<dyn SourceParser>) -> Result<Self> {
        let (config, _) = kite_config::load_for_workspace(root.as_ref())?;
        Self::open(root, config, parser)
    }

    pub fn with_compile_hook(mut self, hook: Arc<dyn CompileHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &KiteConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> Option<&CacheDir> {
        self.cache_dir.as_ref()
    }

    pub fn index(&self) -> &Arc<ClasspathIndex> {
        &self.index
    }

    pub fn members(&self) -> &Arc<MemberCache> {
        &self.members
    }

    pub fn sources(&self) -> &Arc<SourceCache> {
        &self.sources
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    // Classpath.

    /// Register a class directory, jar or jmod. Returns `false` when it was
    /// already registered.
    pub fn add_classpath_entry(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.index.add_classpath_path(path)?)
    }

    /// Scan the classpath synchronously and publish the new table.
    pub fn build_index(&self) -> IndexReport {
        rebuild_index(&self.index, &self.members)
    }

    /// [`build_index`](Self::build_index) on the background thread. `None`
    /// when background work is already running.
    pub fn rebuild_index_in_background(&self) -> Option<JoinHandle<IndexReport>> {
        let index = Arc::clone(&self.index);
        let members = Arc::clone(&self.members);
        let sources = Arc::clone(&self.sources);
        let lock_path = self.lock_path();
        self.background.trigger(move || {
            let report = rebuild_index(&index, &members);
            flush_sources(&sources, lock_path.as_deref());
            report
        })
    }

    /// Run the compile hook's full compile and then rebuild the index, on
    /// the background thread. `None` when background work is already
    /// running.
    pub fn request_full_compile(&self) -> Option<JoinHandle<IndexReport>> {
        let hook = Arc::clone(&self.hook);
        let index = Arc::clone(&self.index);
        let members = Arc::clone(&self.members);
        let sources = Arc::clone(&self.sources);
        let lock_path = self.lock_path();
        self.background.trigger(move || {
            tracing::info!(target = "kite.workspace", "running full compile");
            hook.full_compile();
            let report = rebuild_index(&index, &members);
            flush_sources(&sources, lock_path.as_deref());
            report
        })
    }

    pub fn is_background_work_running(&self) -> bool {
        self.background.is_running()
    }

    pub fn resolve(&self, fqcn: &str) -> Option<Arc<ClassIndex>> {
        self.index.resolve(fqcn)
    }

    pub fn resolve_by_simple_name(&self, name: &str) -> Vec<Arc<ClassIndex>> {
        self.index.resolve_by_simple_name(name)
    }

    pub fn supertype_chain(&self, fqcn: &str) -> Vec<String> {
        self.index.supertype_chain(fqcn)
    }

    // Members.

    pub fn get_members(&self, fqcn: &str) -> Arc<MemberSet> {
        self.members.get_members(fqcn)
    }

    pub fn invalidate_members(&self, fqcn: &str) {
        self.members.invalidate(fqcn);
    }

    // Sources.

    pub fn add_source_file(&self, path: impl AsRef<Path>) -> bool {
        self.sources.add_known_source(path.as_ref())
    }

    /// Register every source file under `root`. Returns how many were new.
    pub fn add_source_root(&self, root: impl AsRef<Path>) -> Result<usize> {
        let root = kite_core::canonicalize_if_possible(root.as_ref())?;
        let files = kite_core::collect_source_files(&root)?;
        let added = files
            .iter()
            .filter(|file| self.sources.add_known_source(file))
            .count();
        {
            let mut roots = self.source_roots.write();
            if !roots.contains(&root) {
                roots.push(root.clone());
            }
        }
        tracing::debug!(
            target = "kite.workspace",
            root = %root.display(),
            files = files.len(),
            added,
            "added source root"
        );
        Ok(added)
    }

    pub fn source_roots(&self) -> Vec<PathBuf> {
        self.source_roots.read().clone()
    }

    pub fn get_source(&self, path: impl AsRef<Path>) -> Result<Arc<ParsedSource>> {
        Ok(self.sources.get_source(path.as_ref())?)
    }

    pub fn replace_source(&self, source: ParsedSource) -> Arc<ParsedSource> {
        self.sources.replace_source(source)
    }

    pub fn invalidate_source(&self, path: impl AsRef<Path>) {
        self.sources.invalidate_source(path.as_ref());
    }

    /// Apply a file watcher notification. Returns what the change touched,
    /// `None` for files the workspace does not track.
    pub fn on_file_event(&self, change: &FileChange) -> Option<ChangeCategory> {
        let path = normalize_event_path(&change.path);
        let category = self.categorize(&path)?;
        match category {
            ChangeCategory::Source => {
                match change.kind {
                    FileChangeKind::Created => {
                        self.sources.add_known_source(&path);
                        self.sources.invalidate_source(&path);
                    }
                    FileChangeKind::Modified => self.sources.invalidate_source(&path),
                    FileChangeKind::Deleted => self.sources.remove_source(&path),
                }
                self.hook.source_changed(&path);
            }
            ChangeCategory::Classpath => {
                if self.rebuild_index_in_background().is_none() {
                    tracing::debug!(
                        target = "kite.workspace",
                        path = %path.display(),
                        "classpath changed during background work; not rescheduled"
                    );
                }
            }
        }
        tracing::trace!(
            target = "kite.workspace",
            path = %path.display(),
            kind = ?change.kind,
            category = ?category,
            "handled file event"
        );
        Some(category)
    }

    fn categorize(&self, path: &Path) -> Option<ChangeCategory> {
        if has_extension(path, SOURCE_FILE_EXTENSION) {
            return Some(ChangeCategory::Source);
        }
        let on_classpath = self.index.entries().iter().any(|entry| match entry {
            ClasspathEntry::ClassDir(dir) => path.starts_with(dir) && has_extension(path, "class"),
            ClasspathEntry::Jar(archive) | ClasspathEntry::Jmod(archive) => archive == path,
        });
        on_classpath.then_some(ChangeCategory::Classpath)
    }

    // Resolution and completion.

    pub fn search_declaration(&self, path: impl AsRef<Path>, line: u32, column: u32, symbol: &str) -> Option<Declaration> {
        self.resolver.search_declaration(path.as_ref(), line, column, symbol)
    }

    pub fn search_references(&self, path: impl AsRef<Path>, line: u32, column: u32, symbol: &str) -> Vec<Reference> {
        self.resolver.search_references(path.as_ref(), line, column, symbol)
    }

    /// The configured matcher for `query`, preferring the imports of
    /// `source` when given.
    pub fn matcher_for(&self, query: &str, source: Option<&ParsedSource>) -> Box<dyn Matcher> {
        let completion = &self.config.completion;
        let mut request = MatchRequest::new(query, completion.matcher)
            .with_fuzzy_first_char_exact(completion.fuzzy_first_char_exact);
        if let Some(source) = source {
            request = request.with_source(source);
        }
        matcher_for(&request)
    }

    /// Members of `fqcn` (inherited ones included) matching `query`.
    pub fn complete_members(&self, fqcn: &str, query: &str, source: Option<&ParsedSource>) -> Vec<CandidateUnit> {
        let matcher = self.matcher_for(query, source);
        let members = self.members.get_members(fqcn);
        rank(members.iter().map(CandidateUnit::from), matcher.as_ref(), self.result_limit())
    }

    /// Indexed classes matching `query`. Anonymous and synthetic classes are
    /// never offered.
    ///
    /// A query qualified by a known package (`java.util.Ma`) completes the
    /// part after the last dot against the classes of that package and the
    /// packages directly below it.
    pub fn complete_classes(&self, query: &str, source: Option<&ParsedSource>) -> Vec<CandidateUnit> {
        let table = self.index.table();
        if let Some((qualifier, tail)) = query.rsplit_once('.') {
            let scoped = package_candidates(&table, qualifier);
            if !scoped.is_empty() {
                let matcher = self.matcher_for(tail, source);
                return rank(scoped, matcher.as_ref(), self.result_limit());
            }
        }

        let matcher = self.matcher_for(query, source);
        let candidates = table
            .classes()
            .filter(|class| !class.synthetic)
            .map(|class| CandidateUnit::from(class.as_ref()));
        rank(candidates, matcher.as_ref(), self.result_limit())
    }

    fn result_limit(&self) -> Option<usize> {
        let max = self.config.completion.max_results;
        (max > 0).then_some(max)
    }

    // Persistence.

    pub fn cache_status(&self) -> Result<CacheStatus> {
        let Some(stores) = &self.stores else {
            return Ok(CacheStatus::default());
        };
        Ok(CacheStatus {
            root: self.cache_dir.as_ref().map(|dir| dir.root().to_path_buf()),
            member_sets: stores.members.entry_count()?,
            // The checksum table lives next to the snapshots.
            source_snapshots: stores
                .sources
                .entry_count()?
                .saturating_sub(usize::from(stores.sources.contains(kite_cache::CHECKSUM_TABLE_KEY))),
            classpath_entries: stores.classpath.entry_count()?,
            bytes: stores.members.disk_usage()? + stores.sources.disk_usage()? + stores.classpath.disk_usage()?,
        })
    }

    /// Delete every persisted record of this project and drop the in-memory
    /// member sets and source trees.
    pub fn clear_cache(&self) -> Result<()> {
        let _lock = self.lock_path().as_deref().map(CacheLock::lock_exclusive).transpose()?;
        self.members.discard_all();
        for path in self.sources.known_sources() {
            self.sources.invalidate_source(&path);
        }
        if let Some(stores) = &self.stores {
            stores.members.clear()?;
            stores.sources.clear()?;
            stores.classpath.clear()?;
        }
        tracing::info!(target = "kite.workspace", root = %self.root.display(), "cleared project cache");
        Ok(())
    }

    /// Persist the source cache and checksum table under the cache lock.
    pub fn flush(&self) -> Result<()> {
        let _lock = self.lock_path().as_deref().map(CacheLock::lock_exclusive).transpose()?;
        self.sources.flush()?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.flush()?;
        tracing::info!(target = "kite.workspace", root = %self.root.display(), "closed workspace");
        Ok(())
    }

    fn lock_path(&self) -> Option<PathBuf> {
        self.stores.as_ref()?;
        self.cache_dir.as_ref().map(CacheDir::lock_path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.flush() {
            tracing::warn!(
                target = "kite.workspace",
                root = %self.root.display(),
                error = %err,
                "failed to flush workspace on drop"
            );
        }
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("cache_dir", &self.cache_dir.as_ref().map(CacheDir::root))
            .field("index", &self.index)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

fn open_stores(dir: &CacheDir) -> Option<Stores> {
    let open = |path: PathBuf| match DiskStore::new(&path) {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(
                target = "kite.workspace",
                path = %path.display(),
                error = %err,
                "failed to open cache store; running without persistence"
            );
            None
        }
    };
    Some(Stores {
        members: open(dir.members_dir())?,
        sources: open(dir.sources_dir())?,
        classpath: open(dir.classpath_dir())?,
    })
}

/// Classes declared directly in `package` plus its immediate subpackages.
fn package_candidates(table: &ClassTable, package: &str) -> Vec<CandidateUnit> {
    let prefix = format!("{package}.");
    let mut candidates: Vec<CandidateUnit> = Vec::new();
    if table.package_exists(package) {
        candidates.extend(
            table
                .class_names_with_prefix(&prefix)
                .iter()
                .filter(|fqcn| kite_core::package_name(fqcn) == package)
                .filter_map(|fqcn| table.resolve(fqcn))
                .filter(|class| !class.synthetic)
                .map(|class| CandidateUnit::from(class.as_ref())),
        );
    }

    // Sorted input keeps equal children adjacent.
    let mut children: Vec<String> = table
        .packages_with_prefix(&prefix)
        .iter()
        .filter_map(|sub| sub[prefix.len()..].split('.').next())
        .map(|segment| format!("{prefix}{segment}"))
        .collect();
    children.dedup();
    candidates.extend(children.iter().map(|name| CandidateUnit::package(name)));
    candidates
}

fn rebuild_index(index: &ClasspathIndex, members: &MemberCache) -> IndexReport {
    let report = index.build_index();
    // Persisted sets carry the old table's fingerprint and will miss.
    members.discard_all();
    tracing::info!(
        target = "kite.workspace",
        classes = report.classes,
        entries_indexed = report.entries_indexed,
        entries_failed = report.entries_failed,
        entries_cached = report.entries_cached,
        duration_ms = report.duration.as_millis() as u64,
        "rebuilt class index"
    );
    report
}

fn flush_sources(sources: &SourceCache, lock_path: Option<&Path>) {
    let flushed = lock_path
        .map(CacheLock::lock_exclusive)
        .transpose()
        .map_err(crate::error::WorkspaceError::from)
        .and_then(|_lock| sources.flush().map_err(Into::into));
    if let Err(err) = flushed {
        tracing::warn!(target = "kite.workspace", error = %err, "failed to flush source cache");
    }
}

/// Canonical form of a watcher path. Deleted files no longer resolve, so
/// their parent directory is canonicalized instead.
fn normalize_event_path(path: &Path) -> PathBuf {
    if path.exists() {
        return kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => kite_core::canonicalize_if_possible(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
