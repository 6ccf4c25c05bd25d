//! # Model
//!
//! In-memory model of grammars and metamodel packages.
//!
//! Everything the loader reads ends up here: `.glot` files become
//! [`Grammar`] values, metamodel files become [`Package`] values, and the
//! [`ModelStore`] owns both behind copyable ids. Cross-references between
//! elements are explicit binding fields (`Option<GrammarId>` and friends)
//! that start out unresolved and are filled in by a dedicated resolution
//! pass; nothing in this module resolves names lazily.

mod grammar;
mod metamodel;
mod store;

pub use grammar::{
    AssignOp, Cardinality, EnumLiteral, Grammar, GrammarElement, GrammarRef, GrammarRule,
    MetamodelDecl, MetamodelKind, RuleExpr, RuleKind, RuleRef, RuleTarget,
};
pub use metamodel::{Classifier, ClassifierKind, Package, PackageOrigin};
pub use store::ModelStore;
