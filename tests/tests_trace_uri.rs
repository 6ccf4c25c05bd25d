#![allow(clippy::unwrap_used)]
//! Trace locator conversion and its inverse.

use std::fs;

use glotta::base::ResourceUri;
use glotta::loader::{LoaderContext, ResourceSet};
use glotta::trace::{
    AbsoluteUri, ProjectConfig, TraceUriConverter, TraceUriResolver, WorkspaceConfig,
};
use rstest::rstest;
use tempfile::TempDir;

fn my_project() -> ProjectConfig {
    ProjectConfig::new("my.project", "platform:/resource/my.project")
}

#[test]
fn test_project_files_become_project_relative() {
    let converter = TraceUriConverter::new();
    let absolute = AbsoluteUri::new(ResourceUri::from(
        "platform:/resource/my.project/src/Model.glot",
    ));
    let relative = converter.uri_for_trace(&my_project(), &absolute);
    assert_eq!(relative.to_string(), "src/Model.glot");
}

#[test]
fn test_foreign_platform_locators_drop_their_workspace_prefix() {
    let converter = TraceUriConverter::new();
    let absolute = AbsoluteUri::new(ResourceUri::from(
        "platform:/resource/other.project/src/Model.glot",
    ));
    let relative = converter.uri_for_trace(&my_project(), &absolute);
    assert_eq!(relative.to_string(), "src/Model.glot");
}

#[test]
fn test_non_platform_locators_stay_verbatim() {
    let converter = TraceUriConverter::new();
    let absolute = AbsoluteUri::new(ResourceUri::from("file:///opt/lib/Base.glot"));
    let relative = converter.uri_for_trace(&my_project(), &absolute);
    assert_eq!(relative.to_string(), "file:///opt/lib/Base.glot");
}

#[rstest]
#[case("platform:/resource/my.project/Model.glot")]
#[case("platform:/resource/my.project/src/Model.glot")]
#[case("platform:/resource/my.project/src/main/deep/Model.glot")]
fn test_conversion_round_trips(#[case] input: &str) {
    let project = my_project();
    let converter = TraceUriConverter::new();
    let resolver = TraceUriResolver::new();

    let absolute = AbsoluteUri::new(ResourceUri::from(input));
    let relative = converter.uri_for_trace(&project, &absolute);
    let resolved = resolver.resolve(&relative, &project);
    assert_eq!(resolved.uri(), &ResourceUri::from(input));
}

// ============================================================================
// Workspace lookup
// ============================================================================

fn loaded_resource_set(uri: &ResourceUri, ctx: &LoaderContext) -> ResourceSet {
    let mut set = ResourceSet::new();
    set.load(uri, ctx);
    set
}

#[test]
fn test_workspace_lookup_finds_the_containing_project() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/Mini.glot"),
        "grammar org.example.Mini Model: 'm' ;",
    )
    .unwrap();
    let ctx = LoaderContext::standard().with_platform_root("my.project", dir.path());
    let uri = ResourceUri::from("platform:/resource/my.project/src/Mini.glot");
    let set = loaded_resource_set(&uri, &ctx);

    let workspace = WorkspaceConfig::new(vec![
        ProjectConfig::new("other", "platform:/resource/other"),
        my_project(),
    ]);
    let converter = TraceUriConverter::with_workspace(workspace);
    let resource = set.resources().next().unwrap().1;
    let relative = converter.uri_for_trace_resource(resource);
    assert_eq!(relative.to_string(), "src/Mini.glot");
}

#[test]
fn test_resources_outside_every_project_fall_back() {
    // the resource never loads (no root registered), but its locator is
    // still converted by the platform fallback
    let ctx = LoaderContext::standard();
    let uri = ResourceUri::from("platform:/resource/stray.project/gen/Model.glot");
    let set = loaded_resource_set(&uri, &ctx);

    let workspace = WorkspaceConfig::new(vec![my_project()]);
    let converter = TraceUriConverter::with_workspace(workspace);
    let resource = set.resources().next().unwrap().1;
    let relative = converter.uri_for_trace_resource(resource);
    assert_eq!(relative.to_string(), "gen/Model.glot");
}
