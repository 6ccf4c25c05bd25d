//! Bundle manifest merging.
//!
//! A [`MergeableManifest`] is a line-oriented `key: value` descriptor with
//! three list-valued attributes the generator contributes to: required
//! bundles, imported packages, and exported packages. Merging is additive
//! with set semantics, keyed by the text before the first `;` of each
//! entry, and tracks whether anything actually changed. Callers write the
//! file back only when [`is_modified`] reports a change, so untouched
//! descriptors keep their timestamp and downstream builds stay quiet.
//!
//! Attribute order is preserved, unrecognized attributes pass through
//! untouched, and everything after the first blank line is kept verbatim.
//!
//! [`is_modified`]: MergeableManifest::is_modified

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;

pub const BUNDLE_NAME: &str = "Bundle-Name";
pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const REQUIRE_BUNDLE: &str = "Require-Bundle";
pub const IMPORT_PACKAGE: &str = "Import-Package";
pub const EXPORT_PACKAGE: &str = "Export-Package";
pub const BUNDLE_ACTIVATOR: &str = "Bundle-Activator";

/// Manifest lines are folded to at most this many bytes; continuations
/// start with a single space that counts toward the limit.
const MAX_LINE_WIDTH: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed manifest line: '{line}'")]
    Malformed { line: String },
}

#[derive(Debug, Clone)]
pub struct MergeableManifest {
    attributes: IndexMap<String, String>,
    /// Everything from the first blank line on, verbatim.
    tail: String,
    modified: bool,
}

impl MergeableManifest {
    /// A fresh manifest carrying the standard generated attributes.
    /// Always reports itself as modified.
    pub fn new(bundle_name: &str) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert("Manifest-Version".to_string(), "1.0".to_string());
        attributes.insert("Bundle-ManifestVersion".to_string(), "2".to_string());
        attributes.insert(BUNDLE_NAME.to_string(), bundle_name.to_string());
        attributes.insert(
            BUNDLE_SYMBOLIC_NAME.to_string(),
            format!("{bundle_name};singleton:=true"),
        );
        attributes.insert("Bundle-ActivationPolicy".to_string(), "lazy".to_string());
        attributes.insert(BUNDLE_VERSION.to_string(), "0.1.0.qualifier".to_string());
        Self {
            attributes,
            tail: String::new(),
            modified: true,
        }
    }

    /// Parse an existing manifest.
    ///
    /// When `bundle_name` is given and the manifest has no symbolic name
    /// yet, one is inserted as `<name>;singleton:=true` and the manifest
    /// counts as modified.
    pub fn from_str(content: &str, bundle_name: Option<&str>) -> Result<Self, ManifestError> {
        let mut attributes: IndexMap<String, String> = IndexMap::new();
        let mut tail = String::new();
        let mut in_tail = false;
        let mut current: Option<String> = None;

        for line in content.split_inclusive('\n') {
            if in_tail {
                tail.push_str(line);
                continue;
            }
            let text = line.trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                in_tail = true;
                tail.push_str(line);
                continue;
            }
            if let Some(continuation) = text.strip_prefix(' ') {
                // A folded line continues the previous value with no
                // separator; the leading space is pure syntax.
                let Some(key) = &current else {
                    return Err(ManifestError::Malformed {
                        line: text.to_string(),
                    });
                };
                if let Some(value) = attributes.get_mut(key) {
                    value.push_str(continuation);
                }
                continue;
            }
            let Some((key, value)) = text.split_once(':') else {
                return Err(ManifestError::Malformed {
                    line: text.to_string(),
                });
            };
            let key = key.trim_end().to_string();
            attributes.insert(key.clone(), value.trim_start().to_string());
            current = Some(key);
        }

        let mut manifest = Self {
            attributes,
            tail,
            modified: false,
        };
        if let Some(name) = bundle_name {
            if !manifest.attributes.contains_key(BUNDLE_SYMBOLIC_NAME) {
                manifest.attributes.insert(
                    BUNDLE_SYMBOLIC_NAME.to_string(),
                    format!("{name};singleton:=true"),
                );
                manifest.modified = true;
            }
        }
        Ok(manifest)
    }

    pub fn load(path: &Path, bundle_name: Option<&str>) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content, bundle_name)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Whether any merge operation changed the content since parsing.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn symbolic_name(&self) -> Option<&str> {
        self.attribute(BUNDLE_SYMBOLIC_NAME)
            .and_then(|value| value.split(';').next())
            .map(str::trim)
    }

    pub fn add_required_bundles(&mut self, bundles: &IndexSet<String>) {
        self.add_to_list(REQUIRE_BUNDLE, bundles);
    }

    pub fn add_imported_packages(&mut self, packages: &IndexSet<String>) {
        self.add_to_list(IMPORT_PACKAGE, packages);
    }

    pub fn add_exported_packages(&mut self, packages: &IndexSet<String>) {
        self.add_to_list(EXPORT_PACKAGE, packages);
    }

    /// Set `key` only when absent. Existing values are never overwritten.
    pub fn put_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.attributes.contains_key(&key) {
            self.attributes.insert(key, value.into());
            self.modified = true;
        }
    }

    /// Union `entries` into the comma-separated list attribute `key`.
    ///
    /// An entry is identified by the text before its first `;`, so
    /// `org.example;bundle-version="1.0"` and `org.example` are the same
    /// entry. The bundle never requires itself.
    fn add_to_list(&mut self, key: &str, entries: &IndexSet<String>) {
        let own_name = self.symbolic_name().map(str::to_string);
        let mut items: Vec<String> = self
            .attributes
            .get(key)
            .map(|value| split_quote_aware(value))
            .unwrap_or_default();
        let mut present: FxHashSet<String> =
            items.iter().map(|item| identity_of(item)).collect();
        let mut changed = false;
        for entry in entries {
            let identity = identity_of(entry);
            if key == REQUIRE_BUNDLE && Some(identity.as_str()) == own_name.as_deref() {
                continue;
            }
            if !present.insert(identity) {
                continue;
            }
            items.push(entry.trim().to_string());
            changed = true;
        }
        if changed {
            self.attributes.insert(key.to_string(), items.join(","));
            self.modified = true;
        }
    }
}

impl std::fmt::Display for MergeableManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        for (key, value) in &self.attributes {
            fold_line(&format!("{key}: {value}"), &mut out);
        }
        out.push_str(&self.tail);
        f.write_str(&out)
    }
}

/// Split a list value on commas, ignoring commas inside quoted parameter
/// values such as `bundle-version="[1.0,2.0)"`.
fn split_quote_aware(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in value.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                let item = current.trim();
                if !item.is_empty() {
                    items.push(item.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let item = current.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
    items
}

fn identity_of(entry: &str) -> String {
    entry
        .split(';')
        .next()
        .unwrap_or(entry)
        .trim()
        .to_string()
}

fn fold_line(line: &str, out: &mut String) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_WIDTH {
            out.push('\n');
            out.push(' ');
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    const EXISTING: &str = "Manifest-Version: 1.0\n\
                            Bundle-SymbolicName: org.example.mini;singleton:=true\n\
                            Require-Bundle: org.alpha\n";

    #[test]
    fn test_subset_merge_is_not_a_modification() {
        let mut manifest = MergeableManifest::from_str(EXISTING, None).unwrap();
        manifest.add_required_bundles(&set_of(&["org.alpha"]));
        assert!(!manifest.is_modified());
    }

    #[test]
    fn test_merge_unions_without_duplicates() {
        let mut manifest = MergeableManifest::from_str(EXISTING, None).unwrap();
        manifest.add_required_bundles(&set_of(&["org.alpha", "org.beta"]));
        assert!(manifest.is_modified());
        assert_eq!(
            manifest.attribute(REQUIRE_BUNDLE),
            Some("org.alpha,org.beta")
        );
    }

    #[test]
    fn test_entries_are_identified_by_their_name_part() {
        let content = "Require-Bundle: org.alpha;bundle-version=\"1.0.0\"\n";
        let mut manifest = MergeableManifest::from_str(content, None).unwrap();
        manifest.add_required_bundles(&set_of(&["org.alpha"]));
        assert!(!manifest.is_modified());
    }

    #[test]
    fn test_quoted_parameters_keep_their_commas() {
        let content = "Require-Bundle: org.alpha;bundle-version=\"[1.0,2.0)\",org.beta\n";
        let mut manifest = MergeableManifest::from_str(content, None).unwrap();
        manifest.add_required_bundles(&set_of(&["org.beta"]));
        assert!(!manifest.is_modified());
        manifest.add_required_bundles(&set_of(&["org.gamma"]));
        assert_eq!(
            manifest.attribute(REQUIRE_BUNDLE),
            Some("org.alpha;bundle-version=\"[1.0,2.0)\",org.beta,org.gamma")
        );
    }

    #[test]
    fn test_a_bundle_never_requires_itself() {
        let mut manifest = MergeableManifest::from_str(EXISTING, None).unwrap();
        manifest.add_required_bundles(&set_of(&["org.example.mini"]));
        assert!(!manifest.is_modified());
    }

    #[test]
    fn test_missing_symbolic_name_is_inserted() {
        let mut manifest =
            MergeableManifest::from_str("Manifest-Version: 1.0\n", Some("org.example.mini"))
                .unwrap();
        assert!(manifest.is_modified());
        assert_eq!(
            manifest.attribute(BUNDLE_SYMBOLIC_NAME),
            Some("org.example.mini;singleton:=true")
        );
        let again = MergeableManifest::from_str(EXISTING, Some("other.name")).unwrap();
        assert!(!again.is_modified());
        assert_eq!(again.symbolic_name(), Some("org.example.mini"));
    }

    #[test]
    fn test_activator_is_set_only_once() {
        let mut manifest = MergeableManifest::from_str(EXISTING, None).unwrap();
        manifest.put_if_absent(BUNDLE_ACTIVATOR, "org.example.mini.Activator");
        assert!(manifest.is_modified());
        manifest.put_if_absent(BUNDLE_ACTIVATOR, "org.other.Activator");
        assert_eq!(
            manifest.attribute(BUNDLE_ACTIVATOR),
            Some("org.example.mini.Activator")
        );
    }

    #[test]
    fn test_folded_values_are_reassembled() {
        let content = "Require-Bundle: org.example.some.very.long.bundle.name.that.gets.fold\n ed,org.alpha\n";
        let manifest = MergeableManifest::from_str(content, None).unwrap();
        assert_eq!(
            manifest.attribute(REQUIRE_BUNDLE),
            Some("org.example.some.very.long.bundle.name.that.gets.folded,org.alpha")
        );
    }

    #[test]
    fn test_long_lines_fold_at_72_bytes() {
        let mut manifest = MergeableManifest::from_str("Manifest-Version: 1.0\n", None).unwrap();
        manifest.add_required_bundles(&set_of(&[
            "org.example.alpha",
            "org.example.beta",
            "org.example.gamma",
            "org.example.delta",
        ]));
        let rendered = manifest.to_string();
        for line in rendered.lines() {
            assert!(line.len() <= MAX_LINE_WIDTH, "line too long: {line:?}");
        }
        let reparsed = MergeableManifest::from_str(&rendered, None).unwrap();
        assert_eq!(
            reparsed.attribute(REQUIRE_BUNDLE),
            manifest.attribute(REQUIRE_BUNDLE)
        );
    }

    #[test]
    fn test_unknown_attributes_and_tail_survive() {
        let content = "Manifest-Version: 1.0\n\
                       X-Custom-Header: kept\n\
                       \n\
                       Name: sections/are/opaque\n\
                       SHA1-Digest: abcdef\n";
        let manifest = MergeableManifest::from_str(content, None).unwrap();
        let rendered = manifest.to_string();
        assert!(rendered.contains("X-Custom-Header: kept\n"));
        assert!(rendered.ends_with("\nName: sections/are/opaque\nSHA1-Digest: abcdef\n"));
    }

    #[test]
    fn test_line_without_colon_is_malformed() {
        let err = MergeableManifest::from_str("NotAHeader\n", None).unwrap_err();
        assert!(matches!(err, ManifestError::Malformed { .. }));
    }

    #[test]
    fn test_fresh_manifest_has_the_standard_attributes() {
        let manifest = MergeableManifest::new("org.example.mini");
        assert!(manifest.is_modified());
        assert_eq!(manifest.attribute("Manifest-Version"), Some("1.0"));
        assert_eq!(manifest.attribute("Bundle-ManifestVersion"), Some("2"));
        assert_eq!(manifest.symbolic_name(), Some("org.example.mini"));
        assert_eq!(manifest.attribute(BUNDLE_VERSION), Some("0.1.0.qualifier"));
    }
}
