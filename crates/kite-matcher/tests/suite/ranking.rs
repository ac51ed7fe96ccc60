use std::sync::Arc;

use kite_cache::MemoryCachePolicy;
use kite_classfile::access;
use kite_classpath::{ClasspathEntry, ClasspathIndex, IndexOptions};
use kite_matcher::{matcher_for, rank, CandidateKind, CandidateUnit, MatchMode, MatchRequest};
use kite_members::MemberCache;
use kite_source::ParsedSource;
use kite_test_utils::{write_class_dir, ClassFileBuilder};

fn holder_index(dir: &std::path::Path) -> Arc<ClasspathIndex> {
    let object = ClassFileBuilder::new("java/lang/Object")
        .no_super_class()
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "toString", "()Ljava/lang/String;")
        .build();
    let holder = ClassFileBuilder::new("app/Holder")
        .field(access::PUBLIC, "Getter", "I")
        .method(access::PUBLIC, "get", "()Ljava/lang/Object;")
        .method(access::PUBLIC, "getAll", "()Ljava/util/List;")
        .method(access::PUBLIC, "getValue", "()I")
        .method(access::PUBLIC, "giveValue", "(I)V")
        .build();
    let list = ClassFileBuilder::interface_type("java/util/List").build();
    let awt_list = ClassFileBuilder::new("java/awt/List").build();
    let link = ClassFileBuilder::new("app/Link").build();
    write_class_dir(
        dir,
        &[
            ("java/lang/Object", object),
            ("app/Holder", holder),
            ("java/util/List", list),
            ("java/awt/List", awt_list),
            ("app/Link", link),
        ],
    )
    .unwrap();

    let index = Arc::new(ClasspathIndex::new(IndexOptions::default(), None));
    index.add_classpath_entry(ClasspathEntry::ClassDir(dir.to_path_buf()));
    index.build_index();
    index
}

fn member_candidates(index: &Arc<ClasspathIndex>) -> Vec<CandidateUnit> {
    let cache = MemberCache::new(index.clone(), MemoryCachePolicy::default(), None);
    cache.get_members("app.Holder").iter().map(CandidateUnit::from).collect()
}

fn names(units: &[CandidateUnit]) -> Vec<&str> {
    units.iter().map(|unit| unit.name.as_str()).collect()
}

#[test]
fn prefix_completion_prefers_the_shortest_match() {
    let tmp = tempfile::tempdir().unwrap();
    let index = holder_index(tmp.path());
    let matcher = matcher_for(&MatchRequest::new("get", MatchMode::Auto));

    let ranked = rank(member_candidates(&index), matcher.as_ref(), None);
    assert_eq!(names(&ranked), vec!["get", "getAll", "getValue"]);
    assert!(ranked
        .iter()
        .all(|unit| unit.kind == CandidateKind::Member(kite_members::MemberKind::Method)));
}

#[test]
fn camel_case_query_skips_non_boundary_letters() {
    let tmp = tempfile::tempdir().unwrap();
    let index = holder_index(tmp.path());
    let matcher = matcher_for(&MatchRequest::new("gV", MatchMode::Auto));

    let ranked = rank(member_candidates(&index), matcher.as_ref(), None);
    assert_eq!(names(&ranked), vec!["getValue"]);
}

#[test]
fn fuzzy_ranking_puts_best_score_first() {
    let tmp = tempfile::tempdir().unwrap();
    let index = holder_index(tmp.path());
    let matcher = matcher_for(&MatchRequest::new("getVa", MatchMode::Fuzzy));

    let ranked = rank(member_candidates(&index), matcher.as_ref(), Some(5));
    assert_eq!(names(&ranked), vec!["getValue"]);

    let strict = matcher_for(&MatchRequest::new("GetVa", MatchMode::Fuzzy));
    assert!(rank(member_candidates(&index), strict.as_ref(), None).is_empty());

    let loose = matcher_for(&MatchRequest::new("GetVa", MatchMode::Fuzzy).with_fuzzy_first_char_exact(false));
    let ranked = rank(member_candidates(&index), loose.as_ref(), None);
    assert_eq!(names(&ranked), vec!["getValue"]);
}

#[test]
fn class_completion_prefers_imported_types() {
    let tmp = tempfile::tempdir().unwrap();
    let index = holder_index(tmp.path());
    let table = index.table();
    let classes: Vec<CandidateUnit> = table.classes().map(|class| CandidateUnit::from(class.as_ref())).collect();

    let source = ParsedSource::new(tmp.path().join("Main.java"), "app").with_import("java.util.List");
    let matcher = matcher_for(&MatchRequest::new("Li", MatchMode::Prefix).with_source(&source));
    let ranked = rank(classes, matcher.as_ref(), Some(2));

    let fqcns: Vec<_> = ranked.iter().filter_map(|unit| unit.fqcn.as_deref()).collect();
    assert_eq!(fqcns, vec!["java.util.List", "app.Link"]);
    assert_eq!(ranked[0].display, "List - java.util");
}

#[test]
fn exact_mode_matches_whole_names_only() {
    let tmp = tempfile::tempdir().unwrap();
    let index = holder_index(tmp.path());
    let matcher = matcher_for(&MatchRequest::new("getValue", MatchMode::Exact));

    let ranked = rank(member_candidates(&index), matcher.as_ref(), None);
    assert_eq!(names(&ranked), vec!["getValue"]);
}
