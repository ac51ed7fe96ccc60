use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kite_core::{ClassKind, Position, SourceRange};
use kite_source::{
    BlockScope, MethodCall, MethodDecl, ParsedSource, SourceError, SourceParser, TypeReference,
    TypeScope, Variable,
};
use parking_lot::Mutex;

/// A front end that hands out pre-built scope trees and counts its calls.
#[derive(Default)]
pub struct FakeParser {
    trees: Mutex<HashMap<PathBuf, ParsedSource>>,
    calls: AtomicUsize,
}

impl FakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `tree` for `path` from now on.
    pub fn insert(&self, path: &Path, tree: ParsedSource) {
        let path = kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
        self.trees.lock().insert(path, tree);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn has_tree(&self, path: &Path) -> bool {
        self.trees.lock().contains_key(path)
    }
}

impl SourceParser for FakeParser {
    fn parse(&self, path: &Path, _text: &str) -> kite_source::Result<ParsedSource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.trees
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::parse(path, "no fixture tree registered"))
    }
}

/// Multi-line range from `(l1, c1)` to `(l2, c2)`.
pub fn range(l1: u32, c1: u32, l2: u32, c2: u32) -> SourceRange {
    SourceRange::new(Position::new(l1, c1), Position::new(l2, c2))
}

/// Write `text` at `path` and register `tree` for it.
pub fn write_source(parser: &FakeParser, path: &Path, text: &str, tree: ParsedSource) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create source dir");
    }
    fs::write(path, text).expect("write source");
    let path = kite_core::canonicalize_if_possible(path).unwrap_or_else(|_| path.to_path_buf());
    parser.insert(&path, ParsedSource { path: path.clone(), ..tree });
    path
}

pub const GREETER_JAVA: &str = "\
package app;

public class Greeter {
    public String greet() {
        return \"hi\";
    }
}
";

pub const MAIN_JAVA: &str = "\
package app;

public class Main {
    public static void main(String[] args) {
        new Greeter().greet();
    }
}
";

/// Two files: `app.Greeter` declaring `greet()` and `app.Main` calling
/// `new Greeter().greet()` on line 5, column 23.
pub struct GreeterProject {
    pub parser: Arc<FakeParser>,
    pub root: PathBuf,
    pub greeter: PathBuf,
    pub main: PathBuf,
}

impl GreeterProject {
    pub fn write(root: &Path) -> Self {
        let parser = Arc::new(FakeParser::new());
        let src = root.join("src/app");

        let greeter_tree = ParsedSource::new("", "app").with_type(
            TypeScope::new("app.Greeter", ClassKind::Class, range(3, 1, 7, 1), SourceRange::on_line(3, 14, 7))
                .with_block(BlockScope::method(
                    MethodDecl::new("greet", "java.lang.String", SourceRange::on_line(4, 19, 5)),
                    range(4, 5, 6, 5),
                )),
        );
        let main_tree = ParsedSource::new("", "app").with_type(
            TypeScope::new("app.Main", ClassKind::Class, range(3, 1, 7, 1), SourceRange::on_line(3, 14, 4))
                .with_block(
                    BlockScope::method(
                        MethodDecl::new("main", "void", SourceRange::on_line(4, 24, 4))
                            .with_param("java.lang.String[]")
                            .with_static(),
                        range(4, 5, 6, 5),
                    )
                    .with_variable(Variable::param("args", "java.lang.String[]", SourceRange::on_line(4, 38, 4)))
                    .with_type_reference(TypeReference::new("app.Greeter", SourceRange::on_line(5, 13, 7)))
                    .with_call(MethodCall::constructor("app.Greeter", SourceRange::on_line(5, 13, 7)))
                    .with_call(MethodCall::new("greet", Some("app.Greeter"), SourceRange::on_line(5, 23, 5))),
                ),
        );

        let greeter = write_source(&parser, &src.join("Greeter.java"), GREETER_JAVA, greeter_tree);
        let main = write_source(&parser, &src.join("Main.java"), MAIN_JAVA, main_tree);
        Self {
            parser,
            root: root.to_path_buf(),
            greeter,
            main,
        }
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        vec![self.greeter.clone(), self.main.clone()]
    }
}
