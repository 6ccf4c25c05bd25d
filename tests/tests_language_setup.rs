#![allow(clippy::unwrap_used)]
//! End-to-end language setup over on-disk fixtures.
//!
//! Each test writes grammar and metamodel files into a temporary
//! directory and drives [`LanguageConfig::initialize`] through a loader
//! context rooted there.

use std::fs;

use glotta::base::ResourceUri;
use glotta::loader::{LanguageConfig, LanguageError, LoaderContext};
use rstest::rstest;
use tempfile::TempDir;

const MINI: &str = "\
grammar org.example.Mini

generate mini \"http://example.org/mini\"

Model:
    'model' name=ID items+=Item* ;

Item:
    'item' name=ID ;

terminal ID:
    ('a'..'z' | '_')+ ;
";

fn fixture(files: &[(&str, &str)]) -> (TempDir, LoaderContext) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let ctx = LoaderContext::standard().with_base_dir(dir.path());
    (dir, ctx)
}

// ============================================================================
// Successful setup
// ============================================================================

#[test]
fn test_initialize_loads_a_grammar_from_disk() {
    let (_dir, ctx) = fixture(&[("Mini.glot", MINI)]);
    let mut language = LanguageConfig::new("Mini.glot");
    language.initialize(&ctx).unwrap();

    let grammar = language.grammar().unwrap();
    assert_eq!(grammar.name, "org.example.Mini");
    assert!(grammar.is_linked());
    assert_eq!(
        language.naming().unwrap().runtime_module(),
        "org.example.MiniRuntimeModule"
    );
}

#[rstest]
#[case("grammar org.example.A Model: 'a' ;")]
#[case("grammar org.example.B Model: v=Value ; enum Value: Red='red' | Green ;")]
#[case("grammar org.example.C Model: name=ID ; terminal ID: ('a'..'z')+ ;")]
fn test_wellformed_grammars_initialize(#[case] source: &str) {
    let (_dir, ctx) = fixture(&[("Lang.glot", source)]);
    let mut language = LanguageConfig::new("Lang.glot");
    language.initialize(&ctx).unwrap();
    assert!(language.grammar_id().is_some());
}

#[test]
fn test_default_file_extension_is_the_lowercased_simple_name() {
    let (_dir, ctx) = fixture(&[("Mini.glot", MINI)]);
    let mut language = LanguageConfig::new("Mini.glot");
    assert!(language.file_extensions().is_empty());
    language.initialize(&ctx).unwrap();
    assert_eq!(language.file_extensions(), ["mini"]);
}

#[test]
fn test_configured_file_extensions_are_kept() {
    let (_dir, ctx) = fixture(&[("Mini.glot", MINI)]);
    let mut language = LanguageConfig::new("Mini.glot").with_file_extensions("mn,mini");
    language.initialize(&ctx).unwrap();
    assert_eq!(language.file_extensions(), ["mn", "mini"]);
}

#[test]
fn test_platform_resource_locators_use_registered_roots() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("model")).unwrap();
    fs::write(dir.path().join("model/Mini.glot"), MINI).unwrap();
    let ctx = LoaderContext::standard().with_platform_root("my.project", dir.path());

    let mut language = LanguageConfig::new("platform:/resource/my.project/model/Mini.glot");
    language.initialize(&ctx).unwrap();
    assert_eq!(language.grammar().unwrap().name, "org.example.Mini");
}

// ============================================================================
// Auxiliary resources
// ============================================================================

const TYPES_ECORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ecore:EPackage xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore"
    name="types" nsURI="http://example.org/types" nsPrefix="types">
  <eClassifiers xsi:type="ecore:EClass" name="Named">
    <eStructuralFeatures xsi:type="ecore:EAttribute" name="name"/>
  </eClassifiers>
</ecore:EPackage>
"#;

#[test]
fn test_imports_resolve_through_auxiliary_resources() {
    let source = "\
grammar org.example.Mini

import \"http://example.org/types\" as types

Model:
    'model' name=ID ;

terminal ID:
    ('a'..'z')+ ;
";
    let (_dir, ctx) = fixture(&[("Mini.glot", source), ("Types.ecore", TYPES_ECORE)]);
    let mut language = LanguageConfig::new("Mini.glot").with_resource("Types.ecore");
    language.initialize(&ctx).unwrap();

    let grammar = language.grammar().unwrap();
    assert!(grammar.referenced_metamodels().all(|decl| decl.package().is_some()));
}

#[test]
fn test_handler_activation_seeds_the_builtin_package() {
    // loading any .ecore resource activates the handler, which makes the
    // builtin primitives importable by nsURI
    let source = "\
grammar org.example.Mini

import \"http://www.eclipse.org/emf/2002/Ecore\" as ecore

Model:
    'model' name=ID ;

terminal ID:
    ('a'..'z')+ ;
";
    let (_dir, ctx) = fixture(&[("Mini.glot", source), ("Types.ecore", TYPES_ECORE)]);
    let mut language = LanguageConfig::new("Mini.glot").with_resource("Types.ecore");
    language.initialize(&ctx).unwrap();

    let store = language.resource_set().store();
    assert!(store.package_by_ns_uri("http://www.eclipse.org/emf/2002/Ecore").is_some());
}

#[test]
fn test_auxiliary_problems_do_not_fail_the_setup() {
    let (_dir, ctx) = fixture(&[("Mini.glot", MINI)]);
    let mut language = LanguageConfig::new("Mini.glot").with_resource("Missing.ecore");
    language.initialize(&ctx).unwrap();
    assert!(language.grammar_id().is_some());
}

#[test]
fn test_unregistered_format_degrades_to_a_resource_diagnostic() {
    // the standard registry has no .xcore handler; the auxiliary resource
    // stays empty with a diagnostic and the setup still succeeds
    let types = "package org.example.types : \"http://example.org/types\"\n";
    let (_dir, ctx) = fixture(&[("Mini.glot", MINI), ("Types.xcore", types)]);
    let mut language = LanguageConfig::new("Mini.glot").with_resource("Types.xcore");
    language.initialize(&ctx).unwrap();
    assert!(language.grammar_id().is_some());

    let set = language.resource_set();
    let id = set.resource_by_uri(&ResourceUri::from("Types.xcore")).unwrap();
    let resource = set.resource(id);
    assert!(resource.contents.is_empty());
    assert_eq!(resource.diagnostics.len(), 1);
    assert_eq!(
        resource.diagnostics[0].message,
        "No resource handler registered for 'xcore' files"
    );
}

#[test]
fn test_with_grammar_binds_through_an_auxiliary_grammar() {
    let base = "\
grammar org.example.Base

Element: 'element' ;

terminal ID:
    ('a'..'z')+ ;
";
    let derived = "\
grammar org.example.Mini with org.example.Base

Model:
    'model' name=ID ;
";
    let (_dir, ctx) = fixture(&[("Base.glot", base), ("Mini.glot", derived)]);
    let mut language = LanguageConfig::new("Mini.glot").with_resource("Base.glot");
    language.initialize(&ctx).unwrap();

    let grammar = language.grammar().unwrap();
    let used = grammar.used_grammar.as_ref().unwrap();
    assert_eq!(used.name, "org.example.Base");
    assert!(used.target.is_some());
}

// ============================================================================
// Fatal failures
// ============================================================================

#[test]
fn test_blank_grammar_file_reports_no_content() {
    let (_dir, ctx) = fixture(&[("Mini.glot", "\n\n")]);
    let err = LanguageConfig::new("Mini.glot").initialize(&ctx).unwrap_err();
    assert_eq!(err.to_string(), "Couldn't load grammar for 'Mini.glot'.");
}

#[test]
fn test_missing_grammar_file_reports_the_locator() {
    let (_dir, ctx) = fixture(&[]);
    let err = LanguageConfig::new("Nowhere.glot").initialize(&ctx).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("Problem parsing 'Nowhere.glot':\n"), "{text}");
    assert!(text.contains("Couldn't read"), "{text}");
}

#[test]
fn test_resolution_problems_report_each_diagnostic_in_order() {
    let source = "\
grammar org.example.Broken

Model:
    a=First b=Second ;
";
    let (_dir, ctx) = fixture(&[("Broken.glot", source)]);
    let err = LanguageConfig::new("Broken.glot").initialize(&ctx).unwrap_err();
    assert!(matches!(err, LanguageError::ResourceErrors { .. }));

    let text = err.to_string();
    assert!(text.starts_with("Problem parsing 'Broken.glot':\n"), "{text}");
    let first = text.find("Couldn't resolve reference to rule 'First'.").unwrap();
    let second = text.find("Couldn't resolve reference to rule 'Second'.").unwrap();
    assert!(first < second);
}

#[test]
fn test_unresolved_import_names_the_token_and_grammar() {
    let source = "\
grammar org.example.Mini

import \"http://example.org/unknown\"

Model:
    'model' ;
";
    let (_dir, ctx) = fixture(&[("Mini.glot", source)]);
    let err = LanguageConfig::new("Mini.glot").initialize(&ctx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The package \"http://example.org/unknown\" in grammar org.example.Mini could not be \
         found. You might want to register that package in your workflow file."
    );
}

#[test]
fn test_validation_stops_at_the_first_error() {
    let source = "\
grammar org.example.Dup

Model: 'a' ;
Model: 'b' ;
";
    let (_dir, ctx) = fixture(&[("Dup.glot", source)]);
    let err = LanguageConfig::new("Dup.glot").initialize(&ctx).unwrap_err();
    assert!(matches!(err, LanguageError::Validation { .. }));
    assert_eq!(err.to_string(), "A rule's name has to be unique ('Model')");
}
