use std::path::{Path, PathBuf};
use std::sync::Arc;

use kite_classfile::access;
use kite_classpath::{ClasspathEntry, ClasspathIndex, IndexOptions};
use kite_core::{ClassKind, SourceRange};
use kite_resolve::{ConditionKind, DeclarationKind};
use kite_source::{BlockScope, FieldAccess, MethodCall, MethodDecl, ParsedSource, TypeScope, Variable};
use kite_test_utils::{range, write_class_dir, write_source, ClassFileBuilder, FakeParser};

use super::fixtures::{project, Project};

fn zoo_classpath(dir: &Path) -> Arc<ClasspathIndex> {
    let object = ClassFileBuilder::new("java/lang/Object")
        .no_super_class()
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "toString", "()Ljava/lang/String;")
        .build();
    let animal = ClassFileBuilder::new("app/Animal")
        .field(access::PROTECTED, "name", "Ljava/lang/String;")
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "speak", "()Ljava/lang/String;")
        .method(access::PUBLIC, "feed", "(Ljava/lang/String;)V")
        .method(access::PUBLIC, "feed", "(I)V")
        .build();
    let dog = ClassFileBuilder::new("app/Dog")
        .super_class("app/Animal")
        .method(access::PUBLIC, "<init>", "()V")
        .method(access::PUBLIC, "speak", "()Ljava/lang/String;")
        .build();
    let util = ClassFileBuilder::new("app/Util")
        .method(
            access::PUBLIC | access::STATIC | access::VARARGS,
            "log",
            "(Ljava/lang/String;[Ljava/lang/Object;)V",
        )
        .build();
    let sounds = ClassFileBuilder::interface_type("app/Sounds")
        .field(access::PUBLIC | access::STATIC | access::FINAL, "LOUD", "I")
        .build();
    let parrot = ClassFileBuilder::new("app/Parrot")
        .super_class("app/Animal")
        .interface("app/Sounds")
        .method(access::PUBLIC, "<init>", "()V")
        .build();
    let cage = ClassFileBuilder::new("app/Cage")
        .method(access::PUBLIC, "<init>", "()V")
        .build();
    let door = ClassFileBuilder::new("app/Cage$Door")
        .method(access::PUBLIC, "<init>", "(I)V")
        .build();
    write_class_dir(
        dir,
        &[
            ("java/lang/Object", object),
            ("app/Animal", animal),
            ("app/Dog", dog),
            ("app/Util", util),
            ("app/Sounds", sounds),
            ("app/Parrot", parrot),
            ("app/Cage", cage),
            ("app/Cage$Door", door),
        ],
    )
    .unwrap();

    let index = Arc::new(ClasspathIndex::new(IndexOptions::default(), None));
    index.add_classpath_entry(ClasspathEntry::ClassDir(dir.to_path_buf()));
    index.build_index();
    index
}

const ZOO_JAVA: &str = "\
package app;

public class Zoo {
    void run() {
        Dog dog = new Dog();
        Animal animal = dog;
        String msg = \"hi\";
        dog.speak();
        animal.speak();
        dog.feed(\"x\");
        animal.feed(1);
        String n = dog.name;
        Util.log(\"a\", msg);
        Util.log(\"a\", \"b\", \"c\");
    }
}
";

fn zoo_tree() -> ParsedSource {
    let body = BlockScope::method(MethodDecl::new("run", "void", SourceRange::on_line(4, 10, 3)), range(4, 5, 15, 5))
        .with_variable(Variable::def("dog", "app.Dog", SourceRange::on_line(5, 13, 3)))
        .with_variable(Variable::def("animal", "app.Animal", SourceRange::on_line(6, 16, 6)))
        .with_variable(Variable::def("msg", "java.lang.String", SourceRange::on_line(7, 16, 3)))
        .with_call(MethodCall::new("speak", Some("app.Dog"), SourceRange::on_line(8, 13, 5)))
        .with_call(MethodCall::new("speak", Some("app.Animal"), SourceRange::on_line(9, 16, 5)))
        .with_call(
            MethodCall::new("feed", Some("app.Dog"), SourceRange::on_line(10, 13, 4))
                .with_arg("java.lang.String", SourceRange::on_line(10, 18, 3)),
        )
        .with_call(
            MethodCall::new("feed", Some("app.Animal"), SourceRange::on_line(11, 16, 4))
                .with_arg("int", SourceRange::on_line(11, 21, 1)),
        )
        .with_field_access(FieldAccess::new("name", Some("app.Dog"), SourceRange::on_line(12, 24, 4)))
        .with_call(
            MethodCall::new("log", Some("app.Util"), SourceRange::on_line(13, 14, 3))
                .with_arg("java.lang.String", SourceRange::on_line(13, 18, 3))
                .with_arg("java.lang.String", SourceRange::on_line(13, 23, 3)),
        )
        .with_variable(Variable::usage("msg", "java.lang.String", SourceRange::on_line(13, 23, 3)))
        .with_call(
            MethodCall::new("log", Some("app.Util"), SourceRange::on_line(14, 14, 3))
                .with_arg("java.lang.String", SourceRange::on_line(14, 18, 3))
                .with_arg("java.lang.String", SourceRange::on_line(14, 23, 3))
                .with_arg("java.lang.String", SourceRange::on_line(14, 28, 3)),
        );
    ParsedSource::new("", "app").with_type(
        TypeScope::new("app.Zoo", ClassKind::Class, range(3, 1, 16, 1), SourceRange::on_line(3, 14, 3)).with_block(body),
    )
}

fn zoo() -> (tempfile::TempDir, Project, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let index = zoo_classpath(&tmp.path().join("classes"));
    let parser = Arc::new(FakeParser::new());
    let zoo = write_source(&parser, &tmp.path().join("src/app/Zoo.java"), ZOO_JAVA, zoo_tree());
    let p = project(index, parser, &[&zoo]);
    (tmp, p, zoo)
}

const AVIARY_JAVA: &str = "\
package app;

public class Aviary {
    void fly() {
        Parrot polly = new Parrot();
        polly.speak();
        int a = polly.LOUD;
        int b = Sounds.LOUD;
        Cage.Door door = new Cage.Door(a);
    }
}
";

/// Call sites spelled the way they are written: simple and dotted nested
/// names relative to package `app`.
fn aviary_tree() -> ParsedSource {
    let body = BlockScope::method(MethodDecl::new("fly", "void", SourceRange::on_line(4, 10, 3)), range(4, 5, 10, 5))
        .with_variable(Variable::def("polly", "app.Parrot", SourceRange::on_line(5, 16, 5)))
        .with_call(MethodCall::constructor("Parrot", SourceRange::on_line(5, 28, 6)))
        .with_call(MethodCall::new("speak", Some("Parrot"), SourceRange::on_line(6, 15, 5)))
        .with_variable(Variable::def("a", "int", SourceRange::on_line(7, 13, 1)))
        .with_field_access(FieldAccess::new("LOUD", Some("Parrot"), SourceRange::on_line(7, 23, 4)))
        .with_variable(Variable::def("b", "int", SourceRange::on_line(8, 13, 1)))
        .with_field_access(FieldAccess::new("LOUD", Some("Sounds"), SourceRange::on_line(8, 24, 4)))
        .with_variable(Variable::def("door", "app.Cage$Door", SourceRange::on_line(9, 19, 4)))
        .with_call(
            MethodCall::constructor("Cage.Door", SourceRange::on_line(9, 35, 4))
                .with_arg("int", SourceRange::on_line(9, 40, 1)),
        )
        .with_variable(Variable::usage("a", "int", SourceRange::on_line(9, 40, 1)));
    ParsedSource::new("", "app").with_type(
        TypeScope::new("app.Aviary", ClassKind::Class, range(3, 1, 11, 1), SourceRange::on_line(3, 14, 6)).with_block(body),
    )
}

fn aviary() -> (tempfile::TempDir, Project, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let index = zoo_classpath(&tmp.path().join("classes"));
    let parser = Arc::new(FakeParser::new());
    let aviary = write_source(&parser, &tmp.path().join("src/app/Aviary.java"), AVIARY_JAVA, aviary_tree());
    let p = project(index, parser, &[&aviary]);
    (tmp, p, aviary)
}

fn lines(refs: &[kite_resolve::Reference]) -> Vec<u32> {
    refs.iter().map(|r| r.line()).collect()
}

#[test]
fn overload_is_picked_by_argument_types() {
    let (_tmp, p, zoo) = zoo();

    let decl = p.resolver.search_declaration(&zoo, 10, 13, "feed").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Method);
    assert_eq!(decl.scope, "app.Animal");
    assert_eq!(decl.signature, "public void feed(java.lang.String)");
    assert!(decl.location.is_none());

    assert_eq!(lines(&p.resolver.search_references(&zoo, 10, 13, "feed")), vec![10]);
    assert_eq!(lines(&p.resolver.search_references(&zoo, 11, 16, "feed")), vec![11]);
}

#[test]
fn override_references_include_calls_through_the_supertype() {
    let (_tmp, p, zoo) = zoo();

    let condition = p.resolver.search_condition(&zoo, 8, 13, "speak").unwrap();
    assert_eq!(condition.kind, ConditionKind::Method);
    assert_eq!(condition.declaring_class, "app.Dog");
    assert_eq!(lines(&p.resolver.search_references(&zoo, 8, 13, "speak")), vec![8, 9]);
}

#[test]
fn inherited_field_accessed_through_a_subtype() {
    let (_tmp, p, zoo) = zoo();

    let decl = p.resolver.search_declaration(&zoo, 12, 25, "name").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Field);
    assert_eq!(decl.scope, "app.Animal");
    assert_eq!(lines(&p.resolver.search_references(&zoo, 12, 25, "name")), vec![12]);
}

#[test]
fn varargs_calls_match_spread_and_single_arguments() {
    let (_tmp, p, zoo) = zoo();

    let decl = p.resolver.search_declaration(&zoo, 14, 14, "log").unwrap();
    assert_eq!(decl.signature, "public static void log(java.lang.String, java.lang.Object...)");
    assert_eq!(lines(&p.resolver.search_references(&zoo, 14, 14, "log")), vec![13, 14]);
}

#[test]
fn locals_report_the_argument_they_sit_in() {
    let (_tmp, p, zoo) = zoo();

    let decl = p.resolver.search_declaration(&zoo, 13, 24, "msg").unwrap();
    assert_eq!(decl.kind, DeclarationKind::LocalVariable);
    assert_eq!(decl.argument_index, 1);
    assert_eq!(decl.signature, "java.lang.String msg");
    let location = decl.location.unwrap();
    assert_eq!((location.line(), location.column()), (7, 16));

    let refs = p.resolver.search_references(&zoo, 13, 24, "msg");
    assert_eq!(refs.len(), 1);
    assert_eq!((refs[0].line(), refs[0].column()), (13, 23));
}

#[test]
fn simple_declaring_class_resolves_in_the_file_package() {
    let (_tmp, p, aviary) = aviary();

    let decl = p.resolver.search_declaration(&aviary, 6, 15, "speak").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Method);
    assert_eq!(decl.scope, "app.Animal");
    assert_eq!(lines(&p.resolver.search_references(&aviary, 6, 15, "speak")), vec![6]);

    let ctor = p.resolver.search_declaration(&aviary, 5, 28, "Parrot").unwrap();
    assert_eq!(ctor.kind, DeclarationKind::Constructor);
    assert_eq!(ctor.scope, "app.Parrot");
    assert_eq!(lines(&p.resolver.search_references(&aviary, 5, 28, "Parrot")), vec![5]);
}

#[test]
fn interface_constant_is_reached_through_an_implementor() {
    let (_tmp, p, aviary) = aviary();

    let through_parrot = p.resolver.search_declaration(&aviary, 7, 23, "LOUD").unwrap();
    assert_eq!(through_parrot.kind, DeclarationKind::Field);
    assert_eq!(through_parrot.scope, "app.Sounds");

    let direct = p.resolver.search_declaration(&aviary, 8, 24, "LOUD").unwrap();
    assert_eq!(direct.scope, "app.Sounds");
    assert_eq!(direct.signature, through_parrot.signature);

    assert_eq!(lines(&p.resolver.search_references(&aviary, 7, 23, "LOUD")), vec![7, 8]);
    assert_eq!(lines(&p.resolver.search_references(&aviary, 8, 24, "LOUD")), vec![7, 8]);
}

#[test]
fn dotted_nested_constructor_resolves_to_the_inner_class() {
    let (_tmp, p, aviary) = aviary();

    let decl = p.resolver.search_declaration(&aviary, 9, 35, "Door").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Constructor);
    assert_eq!(decl.scope, "app.Cage.Door");
    assert_eq!(decl.argument_index, -1);

    let condition = p.resolver.search_condition(&aviary, 9, 35, "Door").unwrap();
    assert_eq!(condition.declaring_class, "app.Cage$Door");
    assert_eq!(lines(&p.resolver.search_references(&aviary, 9, 35, "Door")), vec![9]);
}
