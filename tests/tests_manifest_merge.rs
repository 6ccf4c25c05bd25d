#![allow(clippy::unwrap_used)]
//! Manifest reconciliation on disk.
//!
//! The generator is driven with bundle layouts only (no languages), so
//! each test observes exactly the file the merge step produces.

use std::fs;
use std::path::Path;

use glotta::generator::{BundleLayout, Generator, ManifestConfig, ProjectLayout};
use glotta::loader::LoaderContext;
use glotta::manifest::{MergeableManifest, BUNDLE_SYMBOLIC_NAME, REQUIRE_BUNDLE};
use tempfile::TempDir;

fn run_runtime_manifest(config: ManifestConfig) {
    let mut layout = ProjectLayout::default();
    layout.runtime = BundleLayout::default().with_manifest(config);
    let mut generator = Generator::new(layout);
    generator.run(&LoaderContext::standard()).unwrap();
}

fn manifest_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("org.example.mini/META-INF/MANIFEST.MF")
}

// ============================================================================
// Synthesis
// ============================================================================

#[test]
fn test_missing_manifest_is_synthesized() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    run_runtime_manifest(
        ManifestConfig::new(&path)
            .with_bundle_name("org.example.mini")
            .require_bundle("org.alpha"),
    );

    let written = MergeableManifest::load(&path, None).unwrap();
    assert_eq!(written.attribute("Manifest-Version"), Some("1.0"));
    assert_eq!(written.attribute("Bundle-ManifestVersion"), Some("2"));
    assert_eq!(written.symbolic_name(), Some("org.example.mini"));
    assert_eq!(written.attribute(REQUIRE_BUNDLE), Some("org.alpha"));
}

#[test]
fn test_fresh_manifest_infers_its_name_from_the_path() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    run_runtime_manifest(ManifestConfig::new(&path).require_bundle("org.alpha"));

    let written = fs::read_to_string(&path).unwrap();
    assert!(
        written.contains("Bundle-SymbolicName: org.example.mini;singleton:=true"),
        "{written}"
    );
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_merge_adds_missing_entries() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    write(
        &path,
        "Manifest-Version: 1.0\n\
         Bundle-SymbolicName: org.example.mini;singleton:=true\n\
         Require-Bundle: org.alpha\n",
    );
    run_runtime_manifest(
        ManifestConfig::new(&path)
            .require_bundle("org.alpha")
            .require_bundle("org.beta"),
    );

    let written = MergeableManifest::load(&path, None).unwrap();
    assert_eq!(written.attribute(REQUIRE_BUNDLE), Some("org.alpha,org.beta"));
}

#[test]
fn test_subset_merge_leaves_the_file_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    // odd spacing would be normalized by any rewrite
    let original = "Manifest-Version: 1.0\n\
                    Bundle-SymbolicName: org.example.mini;singleton:=true\n\
                    Require-Bundle:   org.alpha,  org.beta\n";
    write(&path, original);
    run_runtime_manifest(ManifestConfig::new(&path).require_bundle("org.alpha"));

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_merge_preserves_foreign_attributes_and_sections() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    write(
        &path,
        "Manifest-Version: 1.0\n\
         X-Custom-Header: kept\n\
         \n\
         Name: sections/are/opaque\n\
         SHA1-Digest: abcdef\n",
    );
    run_runtime_manifest(ManifestConfig::new(&path).require_bundle("org.alpha"));

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("X-Custom-Header: kept\n"), "{written}");
    assert!(
        written.ends_with("\nName: sections/are/opaque\nSHA1-Digest: abcdef\n"),
        "{written}"
    );
    assert!(written.contains("Require-Bundle: org.alpha"), "{written}");
}

#[test]
fn test_unmerged_manifest_writes_a_gen_sibling() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    let original = "Manifest-Version: 1.0\nRequire-Bundle: org.keep\n";
    write(&path, original);
    run_runtime_manifest(
        ManifestConfig::new(&path)
            .with_merge(false)
            .with_bundle_name("org.example.mini")
            .require_bundle("org.alpha"),
    );

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    let sibling = MergeableManifest::load(
        &path.with_file_name("MANIFEST.MF_gen"),
        None,
    )
    .unwrap();
    assert_eq!(sibling.symbolic_name(), Some("org.example.mini"));
    assert_eq!(sibling.attribute(REQUIRE_BUNDLE), Some("org.alpha"));
}

// ============================================================================
// Line folding
// ============================================================================

#[test]
fn test_merged_lists_fold_and_reparse() {
    let dir = TempDir::new().unwrap();
    let path = manifest_path(&dir);
    write(&path, "Manifest-Version: 1.0\n");

    let mut config = ManifestConfig::new(&path);
    for index in 0..8 {
        config = config.require_bundle(format!("org.example.generated.bundle{index}"));
    }
    run_runtime_manifest(config);

    let written = fs::read_to_string(&path).unwrap();
    for line in written.lines() {
        assert!(line.len() <= 72, "line too long: {line:?}");
    }
    let reparsed = MergeableManifest::load(&path, None).unwrap();
    let bundles = reparsed.attribute(REQUIRE_BUNDLE).unwrap();
    for index in 0..8 {
        assert!(bundles.contains(&format!("org.example.generated.bundle{index}")));
    }
    // the merge also filled in the symbolic name inferred from the path
    assert_eq!(
        reparsed.attribute(BUNDLE_SYMBOLIC_NAME),
        Some("org.example.mini;singleton:=true")
    );
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
