//! Arena storage for grammars and packages.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{GrammarId, PackageId};
use crate::model::grammar::Grammar;
use crate::model::metamodel::Package;

/// Owns every grammar and package of one resource set.
///
/// The store doubles as the package registry: packages are looked up by
/// namespace URI during resolution, whether they were seeded as builtins,
/// read from metamodel files, or derived from grammars. The first package
/// registered for a namespace URI wins; later ones are stored but not
/// indexed.
#[derive(Debug, Default)]
pub struct ModelStore {
    grammars: Vec<Grammar>,
    packages: Vec<Package>,
    packages_by_ns_uri: FxHashMap<SmolStr, PackageId>,
    /// Namespace URI to code base package, fed by generator-model files.
    gen_base_packages: FxHashMap<SmolStr, SmolStr>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_grammar(&mut self, grammar: Grammar) -> GrammarId {
        let id = GrammarId::from_index(self.grammars.len());
        self.grammars.push(grammar);
        id
    }

    pub fn grammar(&self, id: GrammarId) -> &Grammar {
        &self.grammars[id.index()]
    }

    pub fn grammar_mut(&mut self, id: GrammarId) -> &mut Grammar {
        &mut self.grammars[id.index()]
    }

    pub fn grammars(&self) -> impl Iterator<Item = (GrammarId, &Grammar)> {
        self.grammars
            .iter()
            .enumerate()
            .map(|(index, grammar)| (GrammarId::from_index(index), grammar))
    }

    pub fn add_package(&mut self, package: Package) -> PackageId {
        let id = PackageId::from_index(self.packages.len());
        let ns_uri = package.ns_uri.clone();
        self.packages.push(package);
        if let Some(existing) = self.packages_by_ns_uri.get(&ns_uri) {
            debug!(
                ns_uri = %ns_uri,
                "namespace URI already registered, keeping package {:?}", existing
            );
        } else {
            self.packages_by_ns_uri.insert(ns_uri, id);
        }
        id
    }

    /// Register `package` unless its namespace URI is already taken, in
    /// which case the existing package is returned. Used by resource
    /// handlers to seed builtin packages idempotently.
    pub fn ensure_package(&mut self, package: Package) -> PackageId {
        match self.packages_by_ns_uri.get(&package.ns_uri) {
            Some(existing) => *existing,
            None => self.add_package(package),
        }
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.index()]
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(index, package)| (PackageId::from_index(index), package))
    }

    pub fn package_by_ns_uri(&self, ns_uri: &str) -> Option<PackageId> {
        self.packages_by_ns_uri.get(ns_uri).copied()
    }

    pub fn set_gen_base_package(&mut self, ns_uri: impl Into<SmolStr>, base: impl Into<SmolStr>) {
        self.gen_base_packages.insert(ns_uri.into(), base.into());
    }

    pub fn gen_base_package(&self, ns_uri: &str) -> Option<&str> {
        self.gen_base_packages.get(ns_uri).map(SmolStr::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metamodel::PackageOrigin;

    #[test]
    fn test_grammar_round_trip() {
        let mut store = ModelStore::new();
        let id = store.add_grammar(Grammar::new("org.example.A"));
        assert_eq!(store.grammar(id).name, "org.example.A");
        store.grammar_mut(id).linked = true;
        assert!(store.grammar(id).linked);
    }

    #[test]
    fn test_first_package_wins_per_ns_uri() {
        let mut store = ModelStore::new();
        let first = store.add_package(Package::new("a", "http://x", PackageOrigin::Loaded));
        let second = store.add_package(Package::new("b", "http://x", PackageOrigin::Loaded));
        assert_ne!(first, second);
        assert_eq!(store.package_by_ns_uri("http://x"), Some(first));
    }

    #[test]
    fn test_ensure_package_is_idempotent() {
        let mut store = ModelStore::new();
        let first = store.ensure_package(Package::new("e", "http://e", PackageOrigin::Builtin));
        let again = store.ensure_package(Package::new("e", "http://e", PackageOrigin::Builtin));
        assert_eq!(first, again);
        assert_eq!(store.packages().count(), 1);
    }

    #[test]
    fn test_gen_base_packages() {
        let mut store = ModelStore::new();
        store.set_gen_base_package("http://x", "org.example.x");
        assert_eq!(store.gen_base_package("http://x"), Some("org.example.x"));
        assert_eq!(store.gen_base_package("http://y"), None);
    }
}
