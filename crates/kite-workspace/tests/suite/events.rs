use kite_test_utils::{write_source, GreeterProject};
use kite_workspace::{ChangeCategory, FileChange, Workspace};

use super::fixtures::{recording_hook, test_config};

#[test]
fn source_events_invalidate_and_notify() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let hook = recording_hook();
    let workspace = Workspace::open(&project.root, test_config(cache.path()), project.parser.clone())
        .unwrap()
        .with_compile_hook(hook.clone());
    workspace.add_source_root(project.root.join("src")).unwrap();

    workspace.get_source(&project.greeter).unwrap();
    assert_eq!(
        workspace.on_file_event(&FileChange::modified(&project.greeter)),
        Some(ChangeCategory::Source)
    );
    workspace.get_source(&project.greeter).unwrap();
    assert_eq!(project.parser.calls(), 2, "a modified file is parsed again");

    std::fs::remove_file(&project.main).unwrap();
    assert_eq!(
        workspace.on_file_event(&FileChange::deleted(&project.main)),
        Some(ChangeCategory::Source)
    );
    assert!(!workspace.sources().known_sources().contains(&project.main));

    let extra = write_source(
        &project.parser,
        &project.root.join("src/app/Extra.java"),
        "package app;\n",
        kite_source::ParsedSource::new("", "app"),
    );
    workspace.on_file_event(&FileChange::created(&extra));
    assert!(workspace.sources().known_sources().contains(&extra));

    assert_eq!(
        *hook.changed.lock(),
        vec![project.greeter.clone(), project.main.clone(), extra.clone()]
    );
}

#[test]
fn untracked_files_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let workspace = Workspace::open(&project.root, test_config(cache.path()), project.parser.clone()).unwrap();

    let notes = project.root.join("notes.txt");
    std::fs::write(&notes, "todo").unwrap();
    assert_eq!(workspace.on_file_event(&FileChange::created(&notes)), None);
    assert_eq!(
        workspace.on_file_event(&FileChange::modified(project.root.join("out/app/Main.class"))),
        None,
        "class files outside the classpath do not matter"
    );
}

#[test]
fn deleted_sources_drop_their_references() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let project = GreeterProject::write(tmp.path());
    let workspace = Workspace::open(&project.root, test_config(cache.path()), project.parser.clone()).unwrap();
    workspace.add_source_root(project.root.join("src")).unwrap();
    workspace.build_index();

    assert_eq!(workspace.search_references(&project.greeter, 4, 19, "greet").len(), 1);

    std::fs::remove_file(&project.main).unwrap();
    workspace.on_file_event(&FileChange::deleted(&project.main));
    assert!(workspace.search_references(&project.greeter, 4, 19, "greet").is_empty());
}
