use std::path::{Path, PathBuf};
use std::sync::Arc;

use kite_classfile::access;
use kite_config::KiteConfig;
use kite_test_utils::{write_class_dir, ClassFileBuilder, GreeterProject};
use kite_workspace::Workspace;
use parking_lot::Mutex;

/// A config that keeps every cache under `cache_root` and never looks for a
/// JDK.
pub fn test_config(cache_root: &Path) -> KiteConfig {
    let mut config = KiteConfig::default();
    config.classpath.include_jdk = false;
    config.cache.root = Some(cache_root.to_path_buf());
    config
}

pub fn open_greeter(project: &GreeterProject, cache_root: &Path) -> Workspace {
    let workspace = Workspace::open(&project.root, test_config(cache_root), project.parser.clone()).unwrap();
    workspace.add_source_root(project.root.join("src")).unwrap();
    workspace
}

/// `java.lang.Object`, `app.Animal` and `app.Dog extends app.Animal
/// implements app.Runnable` under `dir`.
pub fn write_zoo_classes(dir: &Path) {
    let object = ClassFileBuilder::new("java/lang/Object")
        .no_super_class()
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "hashCode", "()I")
        .build();
    let runnable = ClassFileBuilder::interface_type("app/Runnable")
        .method(access::PUBLIC | access::ABSTRACT, "run", "()V")
        .build();
    let animal = ClassFileBuilder::new("app/Animal")
        .field(access::PROTECTED, "name", "Ljava/lang/String;")
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "speak", "()Ljava/lang/String;")
        .build();
    let dog = ClassFileBuilder::new("app/Dog")
        .super_class("app/Animal")
        .interface("app/Runnable")
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "speak", "()Ljava/lang/String;")
        .method(access::PUBLIC, "spin", "(I)V")
        .build();
    write_class_dir(
        dir,
        &[
            ("java/lang/Object", object),
            ("app/Runnable", runnable),
            ("app/Animal", animal),
            ("app/Dog", dog),
        ],
    )
    .unwrap();
}

pub fn write_cat_class(dir: &Path) -> PathBuf {
    let cat = ClassFileBuilder::new("app/Cat")
        .super_class("app/Animal")
        .method(access::PUBLIC, "<init>", "()V")
        .build();
    write_class_dir(dir, &[("app/Cat", cat)]).unwrap();
    dir.join("app/Cat.class")
}

/// A compile hook that records what it was told.
#[derive(Default)]
pub struct RecordingHook {
    pub compiles: Mutex<usize>,
    pub changed: Mutex<Vec<PathBuf>>,
    pub on_compile: Mutex<Option<Box<dyn FnMut() + Send>>>,
}

impl kite_workspace::CompileHook for RecordingHook {
    fn full_compile(&self) {
        *self.compiles.lock() += 1;
        if let Some(on_compile) = self.on_compile.lock().as_mut() {
            on_compile();
        }
    }

    fn source_changed(&self, path: &Path) {
        self.changed.lock().push(path.to_path_buf());
    }
}

pub fn recording_hook() -> Arc<RecordingHook> {
    Arc::new(RecordingHook::default())
}
