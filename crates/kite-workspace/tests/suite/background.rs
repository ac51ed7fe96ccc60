use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use kite_test_utils::FakeParser;
use kite_workspace::{ChangeCategory, FileChange, Workspace};

use super::fixtures::{recording_hook, test_config, write_cat_class, write_zoo_classes};

fn wait_for_background(workspace: &Workspace) {
    for _ in 0..500 {
        if !workspace.is_background_work_running() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("background work did not finish");
}

#[test]
fn background_rebuild_publishes_new_classes() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let classes = tmp.path().join("out");
    write_zoo_classes(&classes);

    let workspace = Workspace::open(tmp.path(), test_config(cache.path()), Arc::new(FakeParser::new())).unwrap();
    workspace.add_classpath_entry(&classes).unwrap();
    workspace.build_index();
    assert!(workspace.resolve("app.Cat").is_none());

    let cat = write_cat_class(&classes);
    let report = workspace.rebuild_index_in_background().unwrap().join().unwrap();
    assert_eq!(report.classes, 5);
    assert!(workspace.resolve("app.Cat").is_some());

    assert_eq!(
        workspace.on_file_event(&FileChange::modified(&cat)),
        Some(ChangeCategory::Classpath)
    );
    wait_for_background(&workspace);
}

#[test]
fn full_compile_runs_the_hook_then_reindexes() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let classes = tmp.path().join("out");
    write_zoo_classes(&classes);

    let hook = recording_hook();
    let compiled_into = classes.clone();
    *hook.on_compile.lock() = Some(Box::new(move || {
        write_cat_class(&compiled_into);
    }));

    let workspace = Workspace::open(tmp.path(), test_config(cache.path()), Arc::new(FakeParser::new()))
        .unwrap()
        .with_compile_hook(hook.clone());
    workspace.add_classpath_entry(&classes).unwrap();

    let report = workspace.request_full_compile().unwrap().join().unwrap();
    assert_eq!(*hook.compiles.lock(), 1);
    assert_eq!(report.classes, 5);
    assert!(workspace.resolve("app.Cat").is_some());
}

#[test]
fn triggers_while_busy_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();

    let hook = recording_hook();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let channels = parking_lot::Mutex::new(Some((started_tx, release_rx)));
    *hook.on_compile.lock() = Some(Box::new(move || {
        if let Some((started, release)) = channels.lock().take() {
            started.send(()).unwrap();
            release.recv().unwrap();
        }
    }));

    let workspace = Workspace::open(tmp.path(), test_config(cache.path()), Arc::new(FakeParser::new()))
        .unwrap()
        .with_compile_hook(hook.clone());

    let running = workspace.request_full_compile().unwrap();
    started_rx.recv().unwrap();
    assert!(workspace.request_full_compile().is_none());
    assert!(workspace.rebuild_index_in_background().is_none());

    release_tx.send(()).unwrap();
    running.join().unwrap();
    assert_eq!(*hook.compiles.lock(), 1);

    workspace.request_full_compile().unwrap().join().unwrap();
    assert_eq!(*hook.compiles.lock(), 2);
}
