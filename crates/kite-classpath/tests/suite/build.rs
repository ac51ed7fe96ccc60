use kite_classpath::{ClasspathEntry, ClasspathIndex, IndexOptions};
use kite_test_utils::{env_lock, write_jar, write_jmod, ClassFileBuilder, EnvVarGuard};

#[test]
fn add_classpath_entry_is_idempotent_and_lazy() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("dep.jar");
    write_jar(&jar, &[("dep/Api.class", ClassFileBuilder::new("dep/Api").build())]).unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    assert!(index.add_classpath_path(&jar).unwrap());
    assert!(!index.add_classpath_path(&jar).unwrap());
    assert_eq!(index.entries().len(), 1);

    // Registration alone does not scan.
    assert!(index.resolve("dep.Api").is_none());
    index.build_index();
    assert!(index.resolve("dep.Api").is_some());
}

#[test]
fn malformed_entries_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("good.jar");
    let not_a_zip = tmp.path().join("garbage.jar");
    let missing = tmp.path().join("missing.jar");
    write_jar(
        &good,
        &[
            ("ok/Fine.class", ClassFileBuilder::new("ok/Fine").build()),
            ("ok/Broken.class", b"\xCA\xFE\xBA\xBEtruncated".to_vec()),
        ],
    )
    .unwrap();
    std::fs::write(&not_a_zip, b"definitely not a zip").unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&good).unwrap();
    index.add_classpath_path(&not_a_zip).unwrap();
    index.add_classpath_entry(ClasspathEntry::Jar(missing));

    let report = index.build_index();
    assert_eq!(report.entries_indexed, 1);
    assert_eq!(report.entries_failed, 2);
    assert_eq!(report.classes, 1);
    assert!(index.resolve("ok.Fine").is_some());
    assert!(index.resolve("ok.Broken").is_none());
}

#[test]
fn first_entry_defining_a_class_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let first = tmp.path().join("first.jar");
    let second = tmp.path().join("second.jar");
    write_jar(&first, &[("lib/Dup.class", ClassFileBuilder::new("lib/Dup").build())]).unwrap();
    write_jar(
        &second,
        &[(
            "lib/Dup.class",
            ClassFileBuilder::new("lib/Dup").interface("java/io/Serializable").build(),
        )],
    )
    .unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&first).unwrap();
    index.add_classpath_path(&second).unwrap();
    index.build_index();

    let dup = index.resolve("lib.Dup").unwrap();
    assert!(dup.interfaces.is_empty());
    assert_eq!(
        dup.origin.as_ref().unwrap().entry,
        kite_core::canonicalize_if_possible(&first).unwrap()
    );
}

#[test]
fn multi_release_jar_prefers_base_then_highest_version() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("mr.jar");
    write_jar(
        &jar,
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\nMulti-Release: true\n".to_vec()),
            ("mr/Base.class", ClassFileBuilder::new("mr/Base").build()),
            (
                "META-INF/versions/11/mr/Base.class",
                ClassFileBuilder::new("mr/Base").interface("mr/Eleven").build(),
            ),
            (
                "META-INF/versions/9/mr/Only.class",
                ClassFileBuilder::new("mr/Only").interface("mr/Nine").build(),
            ),
            (
                "META-INF/versions/17/mr/Only.class",
                ClassFileBuilder::new("mr/Only").interface("mr/Seventeen").build(),
            ),
        ],
    )
    .unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&jar).unwrap();
    index.build_index();

    assert!(index.resolve("mr.Base").unwrap().interfaces.is_empty());
    assert_eq!(index.resolve("mr.Only").unwrap().interfaces, vec!["mr.Seventeen"]);
}

#[test]
fn jdk_from_java_home_is_indexed_first() {
    let _lock = env_lock();
    let tmp = tempfile::tempdir().unwrap();
    let jdk = tmp.path().join("jdk");
    write_jmod(
        &jdk.join("jmods/java.base.jmod"),
        &[
            ("java/lang/Object.class", ClassFileBuilder::new("java/lang/Object").no_super_class().build()),
            ("java/lang/String.class", ClassFileBuilder::new("java/lang/String").build()),
        ],
    )
    .unwrap();
    // A user jar shadowing a JDK class does not replace it.
    let shadow = tmp.path().join("shadow.jar");
    write_jar(
        &shadow,
        &[(
            "java/lang/String.class",
            ClassFileBuilder::new("java/lang/String").interface("evil/Marker").build(),
        )],
    )
    .unwrap();
    let _java_home = EnvVarGuard::set("JAVA_HOME", &jdk);

    let index = ClasspathIndex::new(
        IndexOptions {
            include_jdk: true,
            jdk_home: None,
        },
        None,
    );
    index.add_classpath_path(&shadow).unwrap();
    let report = index.build_index();

    assert_eq!(report.entries_indexed, 2);
    assert!(index.resolve("java.lang.Object").is_some());
    assert!(index.resolve("java.lang.String").unwrap().interfaces.is_empty());
}

#[test]
fn rebuild_swaps_the_whole_table() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.jar");
    let b = tmp.path().join("b.jar");
    write_jar(&a, &[("a/A.class", ClassFileBuilder::new("a/A").build())]).unwrap();
    write_jar(&b, &[("b/B.class", ClassFileBuilder::new("b/B").build())]).unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&a).unwrap();
    index.build_index();
    let before = index.table();

    index.add_classpath_path(&b).unwrap();
    let report = index.build_index();
    assert_eq!(report.classes, 2);

    // The old snapshot is untouched.
    assert_eq!(before.len(), 1);
    assert!(before.resolve("b.B").is_none());
    assert!(index.resolve("b.B").is_some());
    assert_ne!(before.fingerprint(), index.table().fingerprint());
}
