//! # glotta-base
//!
//! Core library for Glot grammar loading, validation, and language
//! infrastructure generation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! workflow   → Workflow files, generator assembly
//!   ↓
//! generator  → Run driver, manifest and plugin-descriptor upkeep
//!   ↓
//! loader     → Resource sets, reference resolution, language setup
//!   ↓
//! formats    → Resource handlers (glot, ecore, genmodel, xcore)
//!   ↓
//! parser     → Pest grammars for .glot and .xcore sources
//!   ↓
//! model      → Grammars, metamodel packages, the model store
//!   ↓
//! base       → Primitives (ids, spans, resource locators)
//! ```
//!
//! `validation`, `naming`, `manifest`, and `trace` sit beside the spine:
//! validators run during language setup, naming conventions and manifest
//! merging feed the generator, and trace conversion serves tooling that
//! maps generated output back to sources.

// ============================================================================
// MODULES (dependency order: base → model → parser → formats → loader →
// generator → workflow)
// ============================================================================

/// Foundation types: arena ids, spans, resource locators
pub mod base;

/// Grammar and metamodel data model, plus the store that owns it
pub mod model;

/// Pest parsers for the .glot grammar language and .xcore metamodels
pub mod parser;

/// Resource handlers: one per loadable format
pub mod formats;

/// Resource sets, reference resolution, language setup
pub mod loader;

/// Grammar validation: validators, diagnostics, the abort chain
pub mod validation;

/// Naming conventions derived from a grammar's qualified name
pub mod naming;

/// Bundle manifest parsing and change-tracking merge
pub mod manifest;

/// Trace locator conversion for relocation-safe trace artifacts
pub mod trace;

/// Run driver: manifests, plugin descriptors, configuration checks
pub mod generator;

/// Workflow files: JSON run descriptions
pub mod workflow;

// Re-export foundation types
pub use base::{
    GrammarId, LineCol, LineIndex, PackageId, Position, ResourceId, ResourceUri, Span, TextRange,
    TextSize,
};
