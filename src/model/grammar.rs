//! Grammar model.
//!
//! A [`Grammar`] is the fully shaped form of a `.glot` file. Cross-references
//! (the `with` grammar, metamodel packages, rule calls) carry explicit
//! binding fields that are `None` right after parsing and are filled in by
//! the resolution pass over a resource set. Code downstream of validation
//! may rely on bindings being present: validation fails a language before
//! an unresolved reference can escape.

use smol_str::SmolStr;

use crate::base::{GrammarId, PackageId, Span};

/// A grammar with its metamodel declarations and rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Dot-separated qualified name, e.g. `org.example.Mini`.
    pub name: SmolStr,
    pub name_span: Option<Span>,
    /// The grammar named in a `with` clause, if any.
    pub used_grammar: Option<GrammarRef>,
    pub metamodels: Vec<MetamodelDecl>,
    pub rules: Vec<GrammarRule>,
    /// Set once the resolution pass has visited this grammar.
    pub(crate) linked: bool,
}

impl Grammar {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            name_span: None,
            used_grammar: None,
            metamodels: Vec::new(),
            rules: Vec::new(),
            linked: false,
        }
    }

    /// Simple name, the part after the last `.`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether the resolution pass has visited this grammar.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn rule(&self, name: &str) -> Option<(usize, &GrammarRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.name == name)
    }

    pub fn referenced_metamodels(&self) -> impl Iterator<Item = &MetamodelDecl> {
        self.metamodels
            .iter()
            .filter(|decl| matches!(decl.kind, MetamodelKind::Referenced { .. }))
    }

    pub fn generated_metamodels(&self) -> impl Iterator<Item = &MetamodelDecl> {
        self.metamodels
            .iter()
            .filter(|decl| matches!(decl.kind, MetamodelKind::Generated { .. }))
    }

    /// Visit the grammar and every contained element in declaration order,
    /// stopping at the first error.
    pub fn visit<E>(
        &self,
        f: &mut impl FnMut(GrammarElement<'_>) -> Result<(), E>,
    ) -> Result<(), E> {
        f(GrammarElement::Grammar(self))?;
        for decl in &self.metamodels {
            f(GrammarElement::Metamodel(decl))?;
        }
        for rule in &self.rules {
            f(GrammarElement::Rule(rule))?;
            match &rule.kind {
                RuleKind::Parser { body } | RuleKind::Terminal { body } => {
                    body.visit(f)?;
                }
                RuleKind::Enum { .. } => {}
            }
        }
        Ok(())
    }
}

/// One element produced by [`Grammar::visit`].
#[derive(Debug, Clone, Copy)]
pub enum GrammarElement<'a> {
    Grammar(&'a Grammar),
    Metamodel(&'a MetamodelDecl),
    Rule(&'a GrammarRule),
    Expr(&'a RuleExpr),
}

/// A by-name reference to another grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRef {
    pub name: SmolStr,
    pub span: Option<Span>,
    /// Bound by the resolution pass.
    pub target: Option<GrammarId>,
}

impl GrammarRef {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            span: None,
            target: None,
        }
    }
}

/// An `import` or `generate` declaration in a grammar header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetamodelDecl {
    pub alias: Option<SmolStr>,
    pub span: Option<Span>,
    /// The namespace URI token exactly as written in the source, quotes
    /// included. `None` for programmatically built declarations.
    pub source_text: Option<SmolStr>,
    pub kind: MetamodelKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetamodelKind {
    /// `import "<nsURI>" [as alias]` - must resolve to an existing package.
    Referenced {
        ns_uri: SmolStr,
        package: Option<PackageId>,
    },
    /// `generate <name> "<nsURI>"` - a package derived from the grammar.
    Generated {
        name: SmolStr,
        ns_uri: SmolStr,
        package: Option<PackageId>,
    },
}

impl MetamodelDecl {
    pub fn referenced(ns_uri: impl Into<SmolStr>) -> Self {
        Self {
            alias: None,
            span: None,
            source_text: None,
            kind: MetamodelKind::Referenced {
                ns_uri: ns_uri.into(),
                package: None,
            },
        }
    }

    pub fn generated(name: impl Into<SmolStr>, ns_uri: impl Into<SmolStr>) -> Self {
        Self {
            alias: None,
            span: None,
            source_text: None,
            kind: MetamodelKind::Generated {
                name: name.into(),
                ns_uri: ns_uri.into(),
                package: None,
            },
        }
    }

    pub fn with_alias(mut self, alias: impl Into<SmolStr>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn ns_uri(&self) -> &str {
        match &self.kind {
            MetamodelKind::Referenced { ns_uri, .. } | MetamodelKind::Generated { ns_uri, .. } => {
                ns_uri
            }
        }
    }

    pub fn package(&self) -> Option<PackageId> {
        match &self.kind {
            MetamodelKind::Referenced { package, .. } | MetamodelKind::Generated { package, .. } => {
                *package
            }
        }
    }

    pub(crate) fn bind_package(&mut self, id: PackageId) {
        match &mut self.kind {
            MetamodelKind::Referenced { package, .. } | MetamodelKind::Generated { package, .. } => {
                *package = Some(id);
            }
        }
    }
}

/// A rule definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    pub name: SmolStr,
    pub span: Option<Span>,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    Parser { body: RuleExpr },
    Terminal { body: RuleExpr },
    Enum { literals: Vec<EnumLiteral> },
}

impl GrammarRule {
    pub fn is_parser_rule(&self) -> bool {
        matches!(self.kind, RuleKind::Parser { .. })
    }
}

/// One literal of an enum rule, optionally with an explicit keyword form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLiteral {
    pub name: SmolStr,
    pub literal: Option<SmolStr>,
}

/// Body expression of a parser or terminal rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpr {
    /// Ordered choice, `a | b | c`.
    Alternatives(Vec<RuleExpr>),
    /// Juxtaposition, `a b c`.
    Sequence(Vec<RuleExpr>),
    /// A quoted keyword, `'end'`.
    Keyword(SmolStr),
    /// A call to another rule by name.
    RuleCall(RuleRef),
    /// `feature=..`, `feature+=..`, or `feature?=..`.
    Assignment {
        feature: SmolStr,
        operator: AssignOp,
        value: Box<RuleExpr>,
    },
    /// `expr?`, `expr*`, or `expr+`.
    Repeat {
        expr: Box<RuleExpr>,
        cardinality: Cardinality,
    },
    /// `'a'..'z'` in terminal rules.
    CharRange { from: char, to: char },
    /// The `.` wildcard in terminal rules.
    AnyChar,
}

impl RuleExpr {
    /// Depth-first visit of this expression and all nested expressions.
    pub fn visit<E>(
        &self,
        f: &mut impl FnMut(GrammarElement<'_>) -> Result<(), E>,
    ) -> Result<(), E> {
        f(GrammarElement::Expr(self))?;
        match self {
            RuleExpr::Alternatives(items) | RuleExpr::Sequence(items) => {
                for item in items {
                    item.visit(f)?;
                }
            }
            RuleExpr::Assignment { value, .. } => value.visit(f)?,
            RuleExpr::Repeat { expr, .. } => expr.visit(f)?,
            RuleExpr::Keyword(_)
            | RuleExpr::RuleCall(_)
            | RuleExpr::CharRange { .. }
            | RuleExpr::AnyChar => {}
        }
        Ok(())
    }

    /// Visit every rule call in this expression tree, mutably.
    pub fn for_each_call_mut(&mut self, f: &mut impl FnMut(&mut RuleRef)) {
        match self {
            RuleExpr::RuleCall(call) => f(call),
            RuleExpr::Alternatives(items) | RuleExpr::Sequence(items) => {
                for item in items {
                    item.for_each_call_mut(f);
                }
            }
            RuleExpr::Assignment { value, .. } => value.for_each_call_mut(f),
            RuleExpr::Repeat { expr, .. } => expr.for_each_call_mut(f),
            RuleExpr::Keyword(_) | RuleExpr::CharRange { .. } | RuleExpr::AnyChar => {}
        }
    }

    /// Visit every assigned feature name in this expression tree.
    pub fn for_each_assignment(&self, f: &mut impl FnMut(SmolStr)) {
        match self {
            RuleExpr::Assignment { feature, value, .. } => {
                f(feature.clone());
                value.for_each_assignment(f);
            }
            RuleExpr::Alternatives(items) | RuleExpr::Sequence(items) => {
                for item in items {
                    item.for_each_assignment(f);
                }
            }
            RuleExpr::Repeat { expr, .. } => expr.for_each_assignment(f),
            RuleExpr::Keyword(_)
            | RuleExpr::RuleCall(_)
            | RuleExpr::CharRange { .. }
            | RuleExpr::AnyChar => {}
        }
    }
}

/// A by-name reference to a rule, bound to a concrete rule by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    pub name: SmolStr,
    pub span: Option<Span>,
    pub target: Option<RuleTarget>,
}

impl RuleRef {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            span: None,
            target: None,
        }
    }
}

/// Resolved target of a rule call: a rule index within a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTarget {
    pub grammar: GrammarId,
    pub rule: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Single,
    /// `+=`
    Add,
    /// `?=`
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grammar() -> Grammar {
        let mut grammar = Grammar::new("org.example.Mini");
        grammar.metamodels.push(MetamodelDecl::referenced(
            "http://www.eclipse.org/emf/2002/Ecore",
        ));
        grammar.rules.push(GrammarRule {
            name: "Model".into(),
            span: None,
            kind: RuleKind::Parser {
                body: RuleExpr::Sequence(vec![
                    RuleExpr::Keyword("model".into()),
                    RuleExpr::Assignment {
                        feature: "name".into(),
                        operator: AssignOp::Single,
                        value: Box::new(RuleExpr::RuleCall(RuleRef::new("ID"))),
                    },
                ]),
            },
        });
        grammar
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(sample_grammar().simple_name(), "Mini");
        assert_eq!(Grammar::new("Flat").simple_name(), "Flat");
    }

    #[test]
    fn test_visit_order_and_abort() {
        let grammar = sample_grammar();
        let mut kinds = Vec::new();
        grammar
            .visit::<()>(&mut |element| {
                kinds.push(match element {
                    GrammarElement::Grammar(_) => "grammar",
                    GrammarElement::Metamodel(_) => "metamodel",
                    GrammarElement::Rule(_) => "rule",
                    GrammarElement::Expr(_) => "expr",
                });
                Ok(())
            })
            .unwrap();
        // grammar, metamodel, rule, then the sequence and its two children
        assert_eq!(
            kinds,
            ["grammar", "metamodel", "rule", "expr", "expr", "expr", "expr"]
        );

        let mut seen = 0;
        let aborted = grammar.visit(&mut |_| {
            seen += 1;
            if seen == 3 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(aborted, Err("stop"));
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_for_each_call_mut_reaches_nested_calls() {
        let mut expr = RuleExpr::Repeat {
            expr: Box::new(RuleExpr::Alternatives(vec![
                RuleExpr::RuleCall(RuleRef::new("A")),
                RuleExpr::Assignment {
                    feature: "x".into(),
                    operator: AssignOp::Add,
                    value: Box::new(RuleExpr::RuleCall(RuleRef::new("B"))),
                },
            ])),
            cardinality: Cardinality::OneOrMore,
        };
        let mut names = Vec::new();
        expr.for_each_call_mut(&mut |call| names.push(call.name.clone()));
        assert_eq!(names, ["A", "B"]);
    }
}
