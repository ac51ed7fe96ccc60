use std::path::Path;
use std::sync::Arc;

use kite_cache::MemoryCachePolicy;
use kite_classpath::{ClasspathIndex, IndexOptions};
use kite_members::MemberCache;
use kite_resolve::Resolver;
use kite_source::{SourceCache, SourceCacheOptions, SourceParser};

pub struct Project {
    pub index: Arc<ClasspathIndex>,
    pub sources: Arc<SourceCache>,
    pub resolver: Resolver,
}

/// A resolver over `classpath` (already built) and the given source files.
pub fn project(index: Arc<ClasspathIndex>, parser: Arc<dyn SourceParser>, files: &[&Path]) -> Project {
    let members = Arc::new(MemberCache::new(index.clone(), MemoryCachePolicy::default(), None));
    let sources = Arc::new(SourceCache::new(parser, SourceCacheOptions::default(), None));
    for file in files {
        sources.add_known_source(file);
    }
    let resolver = Resolver::new(index.clone(), members, sources.clone());
    Project {
        index,
        sources,
        resolver,
    }
}

pub fn empty_index() -> Arc<ClasspathIndex> {
    let index = Arc::new(ClasspathIndex::new(IndexOptions::default(), None));
    index.build_index();
    index
}
