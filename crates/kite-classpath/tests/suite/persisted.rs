use kite_cache::DiskStore;
use kite_classpath::{ClasspathIndex, IndexOptions};
use kite_test_utils::{write_jar, ClassFileBuilder};

#[test]
fn unchanged_jars_are_served_from_the_stub_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("dep.jar");
    write_jar(&jar, &[("dep/Api.class", ClassFileBuilder::new("dep/Api").build())]).unwrap();
    let store_dir = tmp.path().join("classpath");

    let cold = ClasspathIndex::new(IndexOptions::default(), Some(DiskStore::new(&store_dir).unwrap()));
    cold.add_classpath_path(&jar).unwrap();
    let first = cold.build_index();
    assert_eq!(first.entries_cached, 0);

    let warm = ClasspathIndex::new(IndexOptions::default(), Some(DiskStore::new(&store_dir).unwrap()));
    warm.add_classpath_path(&jar).unwrap();
    let second = warm.build_index();
    assert_eq!(second.entries_cached, 1);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(
        warm.resolve("dep.Api").unwrap().as_ref(),
        cold.resolve("dep.Api").unwrap().as_ref()
    );
}

#[test]
fn corrupt_stub_cache_degrades_to_rescan() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("dep.jar");
    write_jar(&jar, &[("dep/Api.class", ClassFileBuilder::new("dep/Api").build())]).unwrap();
    let store_dir = tmp.path().join("classpath");

    let index = ClasspathIndex::new(IndexOptions::default(), Some(DiskStore::new(&store_dir).unwrap()));
    index.add_classpath_path(&jar).unwrap();
    index.build_index();

    for entry in std::fs::read_dir(&store_dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            std::fs::write(&path, b"garbage").unwrap();
        }
    }

    let again = ClasspathIndex::new(IndexOptions::default(), Some(DiskStore::new(&store_dir).unwrap()));
    again.add_classpath_path(&jar).unwrap();
    let report = again.build_index();
    assert_eq!(report.entries_failed, 0);
    assert_eq!(report.entries_cached, 0);
    assert!(again.resolve("dep.Api").is_some());
}
