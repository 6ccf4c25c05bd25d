//! Reference resolution.
//!
//! Grammars come out of the parser with by-name references: the `with`
//! clause, metamodel declarations, and rule calls all carry names and an
//! unbound target slot. [`resolve_all`] binds those slots against the
//! resource set's store and index. Failures never panic and never abort
//! the pass; each unresolved reference becomes a diagnostic on the
//! resource that contains it, and later passes decide what is fatal.
//!
//! Binding order matters. Generated packages are created first so that
//! index lookups and conflict validation see them, then `with` clauses,
//! then referenced metamodels, and finally rule calls, which need the
//! `with` chain of every grammar in the set to be bound already.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{GrammarId, ResourceId, Span};
use crate::loader::resource_set::{LoadDiagnostic, ResourceSet};
use crate::model::{MetamodelKind, ModelStore, Package, RuleKind, RuleTarget};

/// Bind every unbound reference in the set's grammars.
///
/// Grammars already linked by an earlier call are left alone, so the pass
/// is safe to run after each batch of loads.
pub fn resolve_all(set: &mut ResourceSet) {
    let mut pending: Vec<(ResourceId, LoadDiagnostic)> = Vec::new();
    {
        let (store, resources, index) = set.parts_mut();
        let grammars: Vec<(ResourceId, GrammarId)> = resources
            .iter()
            .enumerate()
            .flat_map(|(position, resource)| {
                resource
                    .grammars()
                    .map(move |grammar| (ResourceId::from_index(position), grammar))
            })
            .collect();

        for &(resource, grammar) in &grammars {
            if store.grammar(grammar).linked {
                continue;
            }
            create_generated_packages(store, grammar);
            bind_used_grammar(store, index, resource, grammar, &mut pending);
            bind_referenced_metamodels(store, grammar);
        }

        // Rule calls see the whole `with` chain, so they bind after every
        // grammar's header references are in place.
        for &(resource, grammar) in &grammars {
            if store.grammar(grammar).linked {
                continue;
            }
            bind_rule_calls(store, resource, grammar, &mut pending);
            store.grammar_mut(grammar).linked = true;
        }
    }
    for (resource, diagnostic) in pending {
        set.push_diagnostic(resource, diagnostic);
    }
}

/// Materialize the packages of `generate` declarations.
///
/// A declaration whose namespace URI is already taken binds to the
/// existing package; validation reports the conflict.
fn create_generated_packages(store: &mut ModelStore, grammar: GrammarId) {
    let declared: Vec<(usize, SmolStr, SmolStr)> = store
        .grammar(grammar)
        .metamodels
        .iter()
        .enumerate()
        .filter_map(|(position, decl)| match &decl.kind {
            MetamodelKind::Generated {
                name,
                ns_uri,
                package: None,
            } => Some((position, name.clone(), ns_uri.clone())),
            _ => None,
        })
        .collect();

    for (position, name, ns_uri) in declared {
        let package = match store.package_by_ns_uri(&ns_uri) {
            Some(existing) => {
                debug!(%ns_uri, "generated package collides with an existing one");
                existing
            }
            None => {
                let derived =
                    Package::derived_from_grammar(name, ns_uri.clone(), store.grammar(grammar));
                store.add_package(derived)
            }
        };
        store.grammar_mut(grammar).metamodels[position].bind_package(package);
    }
}

fn bind_used_grammar(
    store: &mut ModelStore,
    index: &crate::loader::ResourceIndex,
    resource: ResourceId,
    grammar: GrammarId,
    pending: &mut Vec<(ResourceId, LoadDiagnostic)>,
) {
    let unbound = match &store.grammar(grammar).used_grammar {
        Some(used) if used.target.is_none() => Some((used.name.clone(), used.span)),
        _ => None,
    };
    let Some((name, span)) = unbound else {
        return;
    };
    match index.grammar_by_name(&name) {
        Some(target) => {
            if let Some(used) = &mut store.grammar_mut(grammar).used_grammar {
                used.target = Some(target);
            }
        }
        None => pending.push((
            resource,
            unresolved("grammar", &name, span),
        )),
    }
}

/// Bind `import` declarations to known packages. Unknown namespace URIs
/// stay unbound here; the language setup reports them with registration
/// advice instead of a plain resolution error.
fn bind_referenced_metamodels(store: &mut ModelStore, grammar: GrammarId) {
    let declared: Vec<(usize, SmolStr)> = store
        .grammar(grammar)
        .metamodels
        .iter()
        .enumerate()
        .filter_map(|(position, decl)| match &decl.kind {
            MetamodelKind::Referenced {
                ns_uri,
                package: None,
            } => Some((position, ns_uri.clone())),
            _ => None,
        })
        .collect();

    for (position, ns_uri) in declared {
        if let Some(package) = store.package_by_ns_uri(&ns_uri) {
            store.grammar_mut(grammar).metamodels[position].bind_package(package);
        }
    }
}

fn bind_rule_calls(
    store: &mut ModelStore,
    resource: ResourceId,
    grammar: GrammarId,
    pending: &mut Vec<(ResourceId, LoadDiagnostic)>,
) {
    let scope = rule_scope(store, grammar);
    let mut unresolved_calls: Vec<(SmolStr, Option<Span>)> = Vec::new();
    for rule in &mut store.grammar_mut(grammar).rules {
        let body = match &mut rule.kind {
            RuleKind::Parser { body } | RuleKind::Terminal { body } => body,
            RuleKind::Enum { .. } => continue,
        };
        body.for_each_call_mut(&mut |call| {
            if call.target.is_some() {
                return;
            }
            match scope.get(&call.name) {
                Some(target) => call.target = Some(*target),
                None => unresolved_calls.push((call.name.clone(), call.span)),
            }
        });
    }
    for (name, span) in unresolved_calls {
        pending.push((resource, unresolved("rule", &name, span)));
    }
}

/// Rules visible from `grammar`: its own, then the `with` chain's, nearest
/// declaration winning. A cycle in the chain terminates the walk.
fn rule_scope(store: &ModelStore, grammar: GrammarId) -> FxHashMap<SmolStr, RuleTarget> {
    let mut scope = FxHashMap::default();
    let mut seen = FxHashSet::default();
    let mut current = Some(grammar);
    while let Some(id) = current {
        if !seen.insert(id) {
            debug!("with-chain cycle detected, stopping scope walk");
            break;
        }
        let link = store.grammar(id);
        for (position, rule) in link.rules.iter().enumerate() {
            scope.entry(rule.name.clone()).or_insert(RuleTarget {
                grammar: id,
                rule: position,
            });
        }
        current = link.used_grammar.as_ref().and_then(|used| used.target);
    }
    scope
}

fn unresolved(kind: &str, name: &str, span: Option<Span>) -> LoadDiagnostic {
    let diagnostic =
        LoadDiagnostic::new(format!("Couldn't resolve reference to {kind} '{name}'."));
    match span {
        Some(span) => diagnostic.with_span(span),
        None => diagnostic,
    }
}
