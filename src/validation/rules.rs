//! Built-in grammar validators.

use rustc_hash::FxHashSet;

use crate::model::{GrammarElement, MetamodelKind, PackageOrigin, RuleKind};

use super::{codes, Diagnostic, DiagnosticChain, GrammarValidator, ValidationAbort, ValidationContext};

/// The validators every language setup runs.
pub fn standard_validators() -> Vec<Box<dyn GrammarValidator>> {
    vec![
        Box::new(UniqueRuleNames),
        Box::new(FirstRuleMustBeParserRule),
        Box::new(UniqueMetamodelAliases),
        Box::new(GeneratedPackageConflicts),
        Box::new(GrammarNameIsQualified),
    ]
}

/// Rule names must be unique within a grammar.
pub struct UniqueRuleNames;

impl GrammarValidator for UniqueRuleNames {
    fn name(&self) -> &'static str {
        "unique-rule-names"
    }

    fn check(
        &self,
        element: GrammarElement<'_>,
        _ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort> {
        let GrammarElement::Grammar(grammar) = element else {
            return Ok(());
        };
        let mut seen = FxHashSet::default();
        for rule in &grammar.rules {
            if !seen.insert(rule.name.as_str()) {
                chain.add(
                    Diagnostic::error(format!("A rule's name has to be unique ('{}')", rule.name))
                        .with_code(codes::DUPLICATE_RULE)
                        .with_span(rule.span),
                )?;
            }
        }
        Ok(())
    }
}

/// The entry rule of a grammar has to be a parser rule.
pub struct FirstRuleMustBeParserRule;

impl GrammarValidator for FirstRuleMustBeParserRule {
    fn name(&self) -> &'static str {
        "first-rule-is-parser-rule"
    }

    fn check(
        &self,
        element: GrammarElement<'_>,
        _ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort> {
        let GrammarElement::Grammar(grammar) = element else {
            return Ok(());
        };
        if let Some(first) = grammar.rules.first() {
            if !matches!(first.kind, RuleKind::Parser { .. }) {
                chain.add(
                    Diagnostic::error("The first rule must be a parser rule")
                        .with_code(codes::FIRST_RULE_NOT_PARSER)
                        .with_span(first.span),
                )?;
            }
        }
        Ok(())
    }
}

/// Metamodel aliases must be unique, and at most one declaration may go
/// without an alias.
pub struct UniqueMetamodelAliases;

impl GrammarValidator for UniqueMetamodelAliases {
    fn name(&self) -> &'static str {
        "unique-metamodel-aliases"
    }

    fn check(
        &self,
        element: GrammarElement<'_>,
        _ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort> {
        let GrammarElement::Grammar(grammar) = element else {
            return Ok(());
        };
        let mut seen = FxHashSet::default();
        for decl in &grammar.metamodels {
            let alias = decl.alias.as_deref().unwrap_or("");
            if !seen.insert(alias) {
                let message = if alias.is_empty() {
                    "Multiple metamodel declarations without alias".to_string()
                } else {
                    format!("Duplicate metamodel alias '{alias}'")
                };
                chain.add(
                    Diagnostic::error(message)
                        .with_code(codes::DUPLICATE_ALIAS)
                        .with_span(decl.span),
                )?;
            }
        }
        Ok(())
    }
}

/// A `generate` declaration must not collide with a package that already
/// exists for another reason (builtin, or loaded from a resource).
pub struct GeneratedPackageConflicts;

impl GrammarValidator for GeneratedPackageConflicts {
    fn name(&self) -> &'static str {
        "generated-package-conflicts"
    }

    fn check(
        &self,
        element: GrammarElement<'_>,
        ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort> {
        let GrammarElement::Metamodel(decl) = element else {
            return Ok(());
        };
        if let MetamodelKind::Generated {
            ns_uri,
            package: Some(package),
            ..
        } = &decl.kind
        {
            if ctx.store.package(*package).origin != PackageOrigin::Generated {
                chain.add(
                    Diagnostic::error(format!(
                        "Package '{ns_uri}' is already registered and cannot be generated"
                    ))
                    .with_code(codes::GENERATED_PACKAGE_CONFLICT)
                    .with_span(decl.span),
                )?;
            }
        }
        Ok(())
    }
}

/// Grammar names should carry a package part so generated artifacts get a
/// stable namespace.
pub struct GrammarNameIsQualified;

impl GrammarValidator for GrammarNameIsQualified {
    fn name(&self) -> &'static str {
        "grammar-name-is-qualified"
    }

    fn check(
        &self,
        element: GrammarElement<'_>,
        _ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort> {
        let GrammarElement::Grammar(grammar) = element else {
            return Ok(());
        };
        if !grammar.name.contains('.') {
            chain.add(
                Diagnostic::warning(format!(
                    "Grammar name '{}' has no package part; generated artifacts land in the default namespace",
                    grammar.name
                ))
                .with_code(codes::UNQUALIFIED_GRAMMAR_NAME)
                .with_span(grammar.name_span),
            )?;
        }
        Ok(())
    }
}
