use std::sync::Arc;
use std::time::Duration;

use kite_cache::{DiskStore, MemoryCachePolicy};
use kite_source::{ParsedSource, SourceCache, SourceCacheOptions, SourceParser};
use kite_test_utils::{FakeParser, GreeterProject};

fn cache_for(project: &GreeterProject, store: Option<DiskStore>) -> SourceCache {
    let parser: Arc<dyn SourceParser> = project.parser.clone();
    SourceCache::new(parser, SourceCacheOptions::default(), store)
}

#[test]
fn unmodified_file_is_parsed_once() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let cache = cache_for(&project, None);

    let first = cache.get_source(&project.greeter).unwrap();
    let second = cache.get_source(&project.greeter).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(project.parser.calls(), 1);
    assert_eq!(first.path, project.greeter);
    assert!(first.checksum.is_some());
    assert!(!first.placeholder);
}

#[test]
fn invalidate_always_reparses() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let store = DiskStore::new(tmp.path().join("sources")).unwrap();
    let cache = cache_for(&project, Some(store));

    cache.get_source(&project.greeter).unwrap();
    cache.invalidate_source(&project.greeter);
    cache.get_source(&project.greeter).unwrap();
    assert_eq!(project.parser.calls(), 2);
}

#[test]
fn missing_file_is_an_uncached_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let cache = cache_for(&project, None);

    let missing = tmp.path().join("src/app/Gone.java");
    let source = cache.get_source(&missing).unwrap();
    assert!(source.placeholder);
    assert!(source.types.is_empty());
    assert_eq!(project.parser.calls(), 0);
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn persisted_snapshot_serves_a_restart_without_parsing() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let store_dir = tmp.path().join("sources");

    let cold = cache_for(&project, Some(DiskStore::new(&store_dir).unwrap()));
    let parsed = cold.get_source(&project.main).unwrap();
    cold.flush().unwrap();
    assert_eq!(project.parser.calls(), 1);

    let warm = cache_for(&project, Some(DiskStore::new(&store_dir).unwrap()));
    let restored = warm.get_source(&project.main).unwrap();
    assert_eq!(project.parser.calls(), 1);
    assert_eq!(restored.as_ref(), parsed.as_ref());
}

#[test]
fn changed_content_bypasses_the_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let store_dir = tmp.path().join("sources");

    let cold = cache_for(&project, Some(DiskStore::new(&store_dir).unwrap()));
    cold.get_source(&project.main).unwrap();
    cold.flush().unwrap();

    std::fs::write(&project.main, format!("{}// edited\n", kite_test_utils::MAIN_JAVA)).unwrap();
    let warm = cache_for(&project, Some(DiskStore::new(&store_dir).unwrap()));
    warm.get_source(&project.main).unwrap();
    assert_eq!(project.parser.calls(), 2);
}

#[test]
fn disabled_cache_always_parses() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let parser: Arc<dyn SourceParser> = project.parser.clone();
    let cache = SourceCache::new(
        parser,
        SourceCacheOptions {
            enabled: false,
            ..SourceCacheOptions::default()
        },
        None,
    );

    cache.get_source(&project.greeter).unwrap();
    cache.get_source(&project.greeter).unwrap();
    assert_eq!(project.parser.calls(), 2);
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn replace_source_installs_the_given_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let cache = cache_for(&project, None);
    cache.get_source(&project.greeter).unwrap();

    let edited = ParsedSource::new(project.greeter.clone(), "app.edited");
    cache.replace_source(edited);
    let current = cache.get_source(&project.greeter).unwrap();
    assert_eq!(current.package, "app.edited");
    assert_eq!(project.parser.calls(), 1);
}

#[test]
fn evicted_trees_are_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let store = DiskStore::new(tmp.path().join("sources")).unwrap();
    let parser: Arc<dyn SourceParser> = project.parser.clone();
    let cache = SourceCache::new(
        parser,
        SourceCacheOptions {
            enabled: true,
            policy: MemoryCachePolicy {
                max_entries: 1,
                expire_after_access: Some(Duration::from_secs(60)),
            },
        },
        Some(store),
    );

    cache.get_source(&project.greeter).unwrap();
    cache.get_source(&project.main).unwrap();
    // Greeter was evicted but its snapshot and checksum survive.
    cache.get_source(&project.greeter).unwrap();
    assert_eq!(project.parser.calls(), 2);
}

#[test]
fn front_end_errors_are_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let parser = Arc::new(FakeParser::new());
    let path = tmp.path().join("Unknown.java");
    std::fs::write(&path, "class Unknown {}").unwrap();
    let cache = SourceCache::new(parser.clone(), SourceCacheOptions::default(), None);

    assert!(cache.get_source(&path).is_err());
    assert_eq!(parser.calls(), 1);
}

#[test]
fn known_sources_track_access_and_removal() {
    let tmp = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let cache = cache_for(&project, None);

    cache.add_known_source(&project.greeter);
    cache.get_source(&project.main).unwrap();
    assert_eq!(cache.known_sources(), {
        let mut v = project.sources();
        v.sort();
        v
    });
    cache.remove_source(&project.greeter);
    assert_eq!(cache.known_sources(), vec![project.main.clone()]);
}
