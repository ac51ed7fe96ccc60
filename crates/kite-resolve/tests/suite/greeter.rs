use kite_core::{ClassKind, SourceRange};
use kite_resolve::{DeclarationKind, Reference};
use kite_source::{BlockScope, MethodCall, MethodDecl, ParsedSource, TypeReference, TypeScope};
use kite_test_utils::{range, GreeterProject};

use super::fixtures::{empty_index, project};

fn greeter() -> (tempfile::TempDir, GreeterProject) {
    let tmp = tempfile::tempdir().unwrap();
    let fixture = GreeterProject::write(tmp.path());
    (tmp, fixture)
}

#[test]
fn call_site_is_the_only_reference_to_greet() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let refs = p.resolver.search_references(&fixture.main, 5, 23, "greet");
    assert_eq!(refs.len(), 1, "{refs:?}");
    assert_eq!(refs[0].path, fixture.main);
    assert_eq!((refs[0].line(), refs[0].column()), (5, 23));
}

#[test]
fn references_from_the_declaration_site_match_the_call_site() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let from_decl = p.resolver.search_references(&fixture.greeter, 4, 19, "greet");
    let from_call = p.resolver.search_references(&fixture.main, 5, 25, "greet");
    assert_eq!(from_decl, from_call);
    assert_eq!(from_decl.len(), 1);
}

#[test]
fn declaration_of_a_source_method() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.main, 5, 23, "greet").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Method);
    assert_eq!(decl.scope, "app.Greeter");
    assert_eq!(decl.signature, "java.lang.String greet()");
    assert_eq!(decl.argument_index, -1);
    let location = decl.location.unwrap();
    assert_eq!(location.path, fixture.greeter);
    assert_eq!((location.line(), location.column()), (4, 19));
}

#[test]
fn class_without_constructors_has_a_default_one() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.main, 5, 13, "Greeter").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Constructor);
    assert_eq!(decl.signature, "Greeter()");
}

#[test]
fn type_references_are_found_from_the_declaration() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.greeter, 3, 14, "Greeter").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Type(ClassKind::Class));
    assert_eq!(decl.signature, "class app.Greeter");
    assert_eq!(decl.scope, "app");

    let refs = p.resolver.search_references(&fixture.greeter, 3, 14, "Greeter");
    assert_eq!(refs, vec![Reference::new(&fixture.main, kite_core::SourceRange::on_line(5, 13, 7))]);
}

#[test]
fn parameters_resolve_inside_their_method() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.main, 4, 40, "args").unwrap();
    assert_eq!(decl.kind, DeclarationKind::Parameter);
    assert_eq!(decl.scope, "app.Main#main");
    assert_eq!(decl.signature, "java.lang.String[] args");
}

#[test]
fn reserved_words_have_no_references() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.main, 5, 9, "new").unwrap();
    assert_eq!(decl.kind, DeclarationKind::ReservedWord);
    assert!(p.resolver.search_references(&fixture.main, 5, 9, "new").is_empty());
}

#[test]
fn unknown_symbols_and_missing_files_resolve_to_nothing() {
    let (tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    assert!(p.resolver.search_declaration(&fixture.main, 5, 23, "frobnicate").is_none());
    let missing = tmp.path().join("src/app/Gone.java");
    assert!(p.resolver.search_declaration(&missing, 1, 1, "greet").is_none());
    assert!(p.resolver.search_references(&missing, 1, 1, "greet").is_empty());
}

#[test]
fn every_known_source_is_parsed_once_across_queries() {
    let (_tmp, fixture) = greeter();
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    p.resolver.search_references(&fixture.main, 5, 23, "greet");
    p.resolver.search_references(&fixture.main, 5, 23, "greet");
    assert_eq!(p.sources.parse_count(), 2);
    assert!(p.index.table().is_empty());
}

#[test]
fn call_sites_spelled_with_the_simple_name_resolve_in_the_package() {
    let (_tmp, fixture) = greeter();
    let spelled = ParsedSource::new("", "app").with_type(
        TypeScope::new("app.Main", ClassKind::Class, range(3, 1, 7, 1), SourceRange::on_line(3, 14, 4)).with_block(
            BlockScope::method(
                MethodDecl::new("main", "void", SourceRange::on_line(4, 24, 4))
                    .with_param("java.lang.String[]")
                    .with_static(),
                range(4, 5, 6, 5),
            )
            .with_type_reference(TypeReference::new("Greeter", SourceRange::on_line(5, 13, 7)))
            .with_call(MethodCall::constructor("Greeter", SourceRange::on_line(5, 13, 7)))
            .with_call(MethodCall::new("greet", Some("Greeter"), SourceRange::on_line(5, 23, 5))),
        ),
    );
    fixture.parser.insert(&fixture.main, ParsedSource { path: fixture.main.clone(), ..spelled });
    let p = project(empty_index(), fixture.parser.clone(), &[&fixture.greeter, &fixture.main]);

    let decl = p.resolver.search_declaration(&fixture.main, 5, 23, "greet").unwrap();
    assert_eq!(decl.scope, "app.Greeter");
    assert_eq!(decl.location.unwrap().path, fixture.greeter);

    let expected = vec![Reference::new(&fixture.main, SourceRange::on_line(5, 23, 5))];
    assert_eq!(p.resolver.search_references(&fixture.greeter, 4, 19, "greet"), expected);
    assert_eq!(p.resolver.search_references(&fixture.main, 5, 23, "greet"), expected);

    let ctor = p.resolver.search_declaration(&fixture.main, 5, 13, "Greeter").unwrap();
    assert_eq!(ctor.kind, DeclarationKind::Constructor);
    assert_eq!(ctor.signature, "Greeter()");
    let construction = vec![Reference::new(&fixture.main, SourceRange::on_line(5, 13, 7))];
    assert_eq!(p.resolver.search_references(&fixture.main, 5, 13, "Greeter"), construction);
    assert_eq!(p.resolver.search_references(&fixture.greeter, 3, 14, "Greeter"), construction);
}
