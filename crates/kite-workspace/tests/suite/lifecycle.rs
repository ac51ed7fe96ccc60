use kite_resolve::DeclarationKind;
use kite_test_utils::GreeterProject;
use kite_workspace::Workspace;

use super::fixtures::{open_greeter, test_config};

#[test]
fn greet_has_one_reference_through_the_workspace() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let workspace = open_greeter(&project, cache.path());
    workspace.build_index();

    let refs = workspace.search_references(&project.main, 5, 23, "greet");
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].path, project.main);
    assert_eq!((refs[0].line(), refs[0].column()), (5, 23));

    let decl = workspace.search_declaration(&project.main, 5, 23, "greet").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Method);
    assert_eq!(decl.scope, "app.Greeter");

    workspace.close().unwrap();
}

#[test]
fn persisted_trees_survive_a_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());

    let first = open_greeter(&project, cache.path());
    first.get_source(&project.main).unwrap();
    first.get_source(&project.main).unwrap();
    assert_eq!(project.parser.calls(), 1);
    first.close().unwrap();

    let second = open_greeter(&project, cache.path());
    let tree = second.get_source(&project.main).unwrap();
    assert!(!tree.placeholder);
    assert_eq!(project.parser.calls(), 1, "served from the persisted snapshot");

    let status = second.cache_status().unwrap();
    assert!(status.root.unwrap().starts_with(cache.path()));
    assert!(status.source_snapshots >= 1);
    second.close().unwrap();
}

#[test]
fn edited_files_are_reparsed_after_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());

    let first = open_greeter(&project, cache.path());
    first.get_source(&project.greeter).unwrap();
    first.close().unwrap();

    std::fs::write(&project.greeter, format!("{}// edited\n", kite_test_utils::GREETER_JAVA)).unwrap();

    let second = open_greeter(&project, cache.path());
    second.get_source(&project.greeter).unwrap();
    assert_eq!(project.parser.calls(), 2);
}

#[test]
fn disabled_cache_parses_every_time_and_persists_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let mut config = test_config(cache.path());
    config.cache.enabled = false;

    let workspace = Workspace::open(&project.root, config, project.parser.clone()).unwrap();
    workspace.get_source(&project.main).unwrap();
    workspace.get_source(&project.main).unwrap();
    assert_eq!(project.parser.calls(), 2);
    assert!(workspace.cache_dir().is_none());
    assert_eq!(workspace.cache_status().unwrap(), Default::default());
    workspace.close().unwrap();

    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn clear_cache_forces_a_reparse() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let workspace = open_greeter(&project, cache.path());

    workspace.get_source(&project.main).unwrap();
    workspace.clear_cache().unwrap();
    assert_eq!(workspace.cache_status().unwrap().source_snapshots, 0);

    workspace.get_source(&project.main).unwrap();
    assert_eq!(project.parser.calls(), 2);
}

#[test]
fn missing_files_yield_placeholders() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let workspace = open_greeter(&project, cache.path());

    let tree = workspace.get_source(tmp.path().join("src/app/Gone.java")).unwrap();
    assert!(tree.placeholder);
    assert_eq!(project.parser.calls(), 0);
}
