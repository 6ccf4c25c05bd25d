//! Metamodel packages and classifiers.

use smol_str::SmolStr;

use crate::model::grammar::{Grammar, RuleKind};

/// Where a package came from. Drives validation (generated packages must
/// not collide with loaded ones) and configuration checks across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Seeded by a resource handler when its format was activated.
    Builtin,
    /// Read from a metamodel resource.
    Loaded,
    /// Derived from a grammar's `generate` declaration.
    Generated,
}

/// A named metamodel package identified by its namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: SmolStr,
    pub ns_uri: SmolStr,
    pub origin: PackageOrigin,
    pub classifiers: Vec<Classifier>,
}

impl Package {
    pub fn new(name: impl Into<SmolStr>, ns_uri: impl Into<SmolStr>, origin: PackageOrigin) -> Self {
        Self {
            name: name.into(),
            ns_uri: ns_uri.into(),
            origin,
            classifiers: Vec::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifiers.push(classifier);
        self
    }

    pub fn classifier(&self, name: &str) -> Option<&Classifier> {
        self.classifiers.iter().find(|c| c.name == name)
    }

    /// Derive the package for a grammar's `generate` declaration.
    ///
    /// Each parser rule becomes a class whose features are the rule's
    /// assigned feature names, each terminal rule a data type, and each
    /// enum rule an enumeration.
    pub fn derived_from_grammar(
        name: impl Into<SmolStr>,
        ns_uri: impl Into<SmolStr>,
        grammar: &Grammar,
    ) -> Self {
        let mut package = Package::new(name, ns_uri, PackageOrigin::Generated);
        for rule in &grammar.rules {
            let classifier = match &rule.kind {
                RuleKind::Parser { body } => {
                    let mut features = Vec::new();
                    body.for_each_assignment(&mut |feature| {
                        if !features.contains(&feature) {
                            features.push(feature);
                        }
                    });
                    Classifier {
                        name: rule.name.clone(),
                        kind: ClassifierKind::Class {
                            super_class: None,
                            features,
                        },
                    }
                }
                RuleKind::Terminal { .. } => Classifier {
                    name: rule.name.clone(),
                    kind: ClassifierKind::DataType,
                },
                RuleKind::Enum { literals } => Classifier {
                    name: rule.name.clone(),
                    kind: ClassifierKind::Enum {
                        literals: literals.iter().map(|l| l.name.clone()).collect(),
                    },
                },
            };
            package.classifiers.push(classifier);
        }
        package
    }
}

/// A named type inside a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    pub name: SmolStr,
    pub kind: ClassifierKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierKind {
    Class {
        super_class: Option<SmolStr>,
        features: Vec<SmolStr>,
    },
    DataType,
    Enum {
        literals: Vec<SmolStr>,
    },
}

impl Classifier {
    pub fn class(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: ClassifierKind::Class {
                super_class: None,
                features: Vec::new(),
            },
        }
    }

    pub fn data_type(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: ClassifierKind::DataType,
        }
    }

    pub fn enumeration(name: impl Into<SmolStr>, literals: Vec<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: ClassifierKind::Enum { literals },
        }
    }
}
