//! Cross-resource description index.
//!
//! After all resources of a language are loaded, each handler is asked to
//! describe what its resources export. The index collects those exports so
//! the resolution pass can bind by-name references across resources.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{GrammarId, PackageId, ResourceUri};

/// What one resource exports: grammars by qualified name and packages by
/// namespace URI.
#[derive(Debug, Clone, Default)]
pub struct ResourceDescription {
    pub uri: ResourceUri,
    pub exported_grammars: Vec<(SmolStr, GrammarId)>,
    pub exported_packages: Vec<(SmolStr, PackageId)>,
}

impl ResourceDescription {
    pub fn for_uri(uri: ResourceUri) -> Self {
        Self {
            uri,
            exported_grammars: Vec::new(),
            exported_packages: Vec::new(),
        }
    }

    pub fn with_grammar(mut self, name: impl Into<SmolStr>, id: GrammarId) -> Self {
        self.exported_grammars.push((name.into(), id));
        self
    }

    pub fn with_package(mut self, ns_uri: impl Into<SmolStr>, id: PackageId) -> Self {
        self.exported_packages.push((ns_uri.into(), id));
        self
    }
}

/// Name lookup tables built from resource descriptions. First entry wins
/// for a given name; later duplicates are logged and ignored.
#[derive(Debug, Default)]
pub struct ResourceIndex {
    descriptions: Vec<ResourceDescription>,
    grammars_by_name: FxHashMap<SmolStr, GrammarId>,
    packages_by_ns_uri: FxHashMap<SmolStr, PackageId>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_description(&mut self, description: ResourceDescription) {
        for (name, id) in &description.exported_grammars {
            if self.grammars_by_name.contains_key(name) {
                debug!(grammar = %name, "duplicate grammar export ignored");
            } else {
                self.grammars_by_name.insert(name.clone(), *id);
            }
        }
        for (ns_uri, id) in &description.exported_packages {
            if self.packages_by_ns_uri.contains_key(ns_uri) {
                debug!(ns_uri = %ns_uri, "duplicate package export ignored");
            } else {
                self.packages_by_ns_uri.insert(ns_uri.clone(), *id);
            }
        }
        self.descriptions.push(description);
    }

    pub fn grammar_by_name(&self, name: &str) -> Option<GrammarId> {
        self.grammars_by_name.get(name).copied()
    }

    pub fn package_by_ns_uri(&self, ns_uri: &str) -> Option<PackageId> {
        self.packages_by_ns_uri.get(ns_uri).copied()
    }

    pub fn descriptions(&self) -> &[ResourceDescription] {
        &self.descriptions
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}
