use kite_classpath::{ClassTable, ClasspathEntry, ClasspathIndex, IndexOptions};
use kite_core::{ClassKind, ROOT_TYPE};
use kite_test_utils::{write_class_dir, write_jar, ClassFileBuilder};

fn animals_index(dir: &std::path::Path) -> ClasspathIndex {
    write_class_dir(
        dir,
        &[
            ("java/lang/Object", ClassFileBuilder::new("java/lang/Object").no_super_class().build()),
            ("app/Animal", ClassFileBuilder::new("app/Animal").build()),
            ("app/Runnable", ClassFileBuilder::interface_type("app/Runnable").build()),
            (
                "app/Dog",
                ClassFileBuilder::new("app/Dog")
                    .super_class("app/Animal")
                    .interface("app/Runnable")
                    .build(),
            ),
            (
                "app/Puppy",
                ClassFileBuilder::new("app/Puppy").super_class("app/Dog").build(),
            ),
        ],
    )
    .unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_entry(ClasspathEntry::ClassDir(dir.to_path_buf()));
    index.build_index();
    index
}

fn assert_chains_end_at_root(table: &ClassTable) {
    for class in table.classes() {
        if class.fqcn == ROOT_TYPE {
            assert!(class.supertypes.is_empty());
            continue;
        }
        let roots = class.supertypes.iter().filter(|s| *s == ROOT_TYPE).count();
        assert_eq!(roots, 1, "{} chain {:?}", class.fqcn, class.supertypes);
        assert_eq!(class.supertypes.last().map(String::as_str), Some(ROOT_TYPE));
    }
}

#[test]
fn dog_extends_animal_implements_runnable() {
    let tmp = tempfile::tempdir().unwrap();
    let index = animals_index(tmp.path());

    assert_eq!(index.supertype_chain("app.Dog"), vec!["app.Animal", ROOT_TYPE]);
    let dog = index.resolve("app.Dog").unwrap();
    assert_eq!(dog.interfaces, vec!["app.Runnable"]);
    assert_eq!(dog.kind, ClassKind::Class);
    assert_eq!(dog.origin.as_ref().unwrap().location, "app/Dog.class");

    assert_eq!(
        index.supertype_chain("app.Puppy"),
        vec!["app.Dog", "app.Animal", ROOT_TYPE]
    );
    let table = index.table();
    assert_eq!(table.all_interfaces("app.Puppy"), vec!["app.Runnable"]);
    assert!(table.is_subtype("app.Puppy", "app.Runnable"));
    assert_chains_end_at_root(&table);
}

#[test]
fn cyclic_hierarchy_from_a_corrupt_jar_is_cut() {
    let tmp = tempfile::tempdir().unwrap();
    let jar = tmp.path().join("broken.jar");
    write_jar(
        &jar,
        &[
            ("x/A.class", ClassFileBuilder::new("x/A").super_class("x/B").build()),
            ("x/B.class", ClassFileBuilder::new("x/B").super_class("x/C").build()),
            ("x/C.class", ClassFileBuilder::new("x/C").super_class("x/A").build()),
        ],
    )
    .unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&jar).unwrap();
    index.build_index();

    assert_eq!(index.supertype_chain("x.A"), vec!["x.B", "x.C", ROOT_TYPE]);
    assert_chains_end_at_root(&index.table());
}

#[test]
fn simple_name_lookup_spans_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.jar");
    let b = tmp.path().join("b.jar");
    write_jar(&a, &[("one/Util.class", ClassFileBuilder::new("one/Util").build())]).unwrap();
    write_jar(&b, &[("two/Util.class", ClassFileBuilder::new("two/Util").build())]).unwrap();

    let index = ClasspathIndex::new(IndexOptions::default(), None);
    index.add_classpath_path(&a).unwrap();
    index.add_classpath_path(&b).unwrap();
    index.build_index();

    let names: Vec<_> = index
        .resolve_by_simple_name("Util")
        .iter()
        .map(|c| c.fqcn.clone())
        .collect();
    assert_eq!(names, vec!["one.Util", "two.Util"]);
    assert!(index.resolve_by_simple_name("Missing").is_empty());
    assert!(index.resolve("three.Util").is_none());
}
