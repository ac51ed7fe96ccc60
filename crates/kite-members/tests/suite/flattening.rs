use std::collections::HashSet;

use kite_cache::MemoryCachePolicy;
use kite_members::{MemberCache, MemberKind};

use super::fixtures::animals;

#[test]
fn nearest_declaration_wins_and_private_members_stay_home() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = MemberCache::new(animals(tmp.path()), MemoryCachePolicy::default(), None);

    let dog = cache.get_members("app.Dog");
    let summary: Vec<(&str, &str, MemberKind)> = dog
        .iter()
        .map(|m| (m.name.as_str(), m.declaring_class.as_str(), m.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("size", "app.Dog", MemberKind::Field),
            ("Dog", "app.Dog", MemberKind::Constructor),
            ("speak", "app.Dog", MemberKind::Method),
            ("size", "app.Dog", MemberKind::Method),
            ("run", "app.Dog", MemberKind::Method),
            ("name", "app.Animal", MemberKind::Field),
            ("toString", "app.Animal", MemberKind::Method),
            ("hashCode", "java.lang.Object", MemberKind::Method),
            ("SPEED", "app.Runnable", MemberKind::Field),
        ]
    );
}

#[test]
fn no_two_members_share_a_signature() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = MemberCache::new(animals(tmp.path()), MemoryCachePolicy::default(), None);

    for fqcn in ["app.Dog", "app.Animal", "app.Runnable", "java.lang.Object"] {
        let set = cache.get_members(fqcn);
        let keys: HashSet<_> = set.iter().map(|m| m.signature_key()).collect();
        assert_eq!(keys.len(), set.len(), "{fqcn}");
    }
}

#[test]
fn nested_class_names_fall_back_to_the_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = MemberCache::new(animals(tmp.path()), MemoryCachePolicy::default(), None);

    let inner = cache.get_members("app.Outer.Inner");
    assert_eq!(inner.fqcn, "app.Outer$Inner");
    assert!(inner.named("inside").next().is_some());
    assert_eq!(
        cache.get_members("app.Outer$Inner").as_ref(),
        inner.as_ref()
    );
}

#[test]
fn unknown_classes_are_empty_and_not_cached() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = MemberCache::new(animals(tmp.path()), MemoryCachePolicy::default(), None);

    assert!(cache.get_members("app.Nope").is_empty());
    assert!(!cache.contains_in_memory("app.Nope"));
    assert_eq!(cache.stats().entries, 0);
}
