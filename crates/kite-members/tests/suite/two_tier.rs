use std::time::Duration;

use kite_cache::{DiskStore, MemoryCachePolicy};
use kite_members::MemberCache;

use super::fixtures::animals;

fn tiny_policy() -> MemoryCachePolicy {
    MemoryCachePolicy {
        max_entries: 1,
        expire_after_access: None,
    }
}

#[test]
fn evicted_sets_round_trip_through_storage() {
    let tmp = tempfile::tempdir().unwrap();
    let index = animals(&tmp.path().join("classes"));
    let store = DiskStore::new(tmp.path().join("members")).unwrap();
    let cache = MemberCache::new(index.clone(), tiny_policy(), Some(store.clone()));

    let dog = cache.get_members("app.Dog");
    // Pushes app.Dog out of the single memory slot.
    cache.get_members("app.Animal");
    assert!(!cache.contains_in_memory("app.Dog"));
    assert!(store.contains("members:app.Dog"));

    // A fresh cache over the same table reads the persisted set back.
    let warm = MemberCache::new(index, tiny_policy(), Some(store));
    let reloaded = warm.get_members("app.Dog");
    assert_eq!(reloaded.as_ref(), dog.as_ref());
}

#[test]
fn expired_sets_are_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    let index = animals(&tmp.path().join("classes"));
    let store = DiskStore::new(tmp.path().join("members")).unwrap();
    let policy = MemoryCachePolicy {
        max_entries: 16,
        expire_after_access: Some(Duration::from_millis(1)),
    };
    let cache = MemberCache::new(index, policy, Some(store.clone()));

    cache.get_members("app.Animal");
    store.remove("members:app.Animal").unwrap();
    std::thread::sleep(Duration::from_millis(10));
    cache.run_pending_tasks();

    assert!(!cache.contains_in_memory("app.Animal"));
    assert!(store.contains("members:app.Animal"));
}

#[test]
fn invalidate_deletes_the_persisted_set() {
    let tmp = tempfile::tempdir().unwrap();
    let index = animals(&tmp.path().join("classes"));
    let store = DiskStore::new(tmp.path().join("members")).unwrap();
    let cache = MemberCache::new(index, MemoryCachePolicy::default(), Some(store.clone()));

    cache.get_members("app.Dog");
    assert!(store.contains("members:app.Dog"));
    cache.invalidate("app.Dog");
    assert!(!cache.contains_in_memory("app.Dog"));
    assert!(!store.contains("members:app.Dog"));

    // Also when only the persisted tier holds the set.
    cache.get_members("app.Dog");
    cache.discard_all();
    assert!(store.contains("members:app.Dog"));
    cache.invalidate("app.Dog");
    assert!(!store.contains("members:app.Dog"));
}

#[test]
fn persisted_sets_from_another_table_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let index = animals(&tmp.path().join("classes"));
    let store = DiskStore::new(tmp.path().join("members")).unwrap();
    let cache = MemberCache::new(index.clone(), MemoryCachePolicy::default(), Some(store.clone()));
    let before = cache.get_members("app.Dog");

    // Recompiling a class changes the table fingerprint.
    std::fs::write(
        tmp.path().join("classes/app/Extra.class"),
        kite_test_utils::ClassFileBuilder::new("app/Extra").build(),
    )
    .unwrap();
    index.build_index();
    cache.discard_all();

    let after = cache.get_members("app.Dog");
    assert_ne!(after.fingerprint, before.fingerprint);
    assert_eq!(after.fingerprint, index.fingerprint());
    assert_eq!(after.members, before.members);
}
