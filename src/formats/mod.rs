//! Resource format handlers and the format registry.
//!
//! Which file formats a loader understands is decided by the caller: a
//! [`FormatRegistry`] maps file extensions to [`ResourceHandler`]
//! implementations and is carried in the loader context. Nothing is probed
//! from the environment; a format is supported exactly when its handler
//! was registered. Handlers for `.ecore` and `.genmodel` files are part of
//! the default table, the `.xcore` handler is opt-in.
//!
//! A handler may carry a one-time activation hook that seeds builtin
//! packages into the model store the first time a resource set touches its
//! format.

mod ecore;
mod genmodel;
mod glot;
mod xcore;

pub use ecore::EcoreHandler;
pub use genmodel::GenModelHandler;
pub use glot::GlotHandler;
pub use xcore::XcoreHandler;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::constants::{
    ECORE_EXTENSION, GENMODEL_EXTENSION, SPECIAL_EXTENSIONS, XCORE_EXTENSION,
};
use crate::base::{LineIndex, ResourceUri, Span, TextSize};
use crate::loader::{LoadDiagnostic, Resource, ResourceContent, ResourceDescription};
use crate::model::ModelStore;

/// Contents and diagnostics produced by loading one resource.
#[derive(Debug, Default)]
pub struct LoadedContents {
    pub contents: Vec<ResourceContent>,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadedContents {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(content: ResourceContent) -> Self {
        Self {
            contents: vec![content],
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(diagnostic: LoadDiagnostic) -> Self {
        Self {
            contents: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Diagnostic for a malformed XML resource, positioned at the reader's
/// byte offset.
pub(crate) fn xml_error(source: &str, offset: u64, error: &quick_xml::Error) -> LoadDiagnostic {
    let pos = LineIndex::new(source).line_col(TextSize::from(offset.min(u32::MAX as u64) as u32));
    LoadDiagnostic::new(format!("XML parse error: {error}"))
        .with_span(Span::point(pos.line, pos.col))
}

/// Reads one file format into the model store.
pub trait ResourceHandler: Send + Sync {
    /// Stable name of the format, used for logging and handler lookup.
    fn format_name(&self) -> &'static str;

    /// One-time hook run before the first resource of this format loads.
    /// Handlers seed builtin packages here.
    fn on_activate(&self, _store: &mut ModelStore) {}

    /// Read `source` and record its elements in `store`. Problems are
    /// reported through the returned diagnostics, never by panicking.
    fn load(&self, uri: &ResourceUri, source: &str, store: &mut ModelStore) -> LoadedContents;

    /// Describe what a loaded resource exports, or `None` when resources
    /// of this format export nothing.
    fn describe(&self, resource: &Resource, store: &ModelStore) -> Option<ResourceDescription>;
}

/// The caller-supplied capability table: extension to handler.
///
/// Extensions listed in [`SPECIAL_EXTENSIONS`] are only readable when a
/// handler was registered for them; every other extension falls back to
/// the grammar handler.
#[derive(Clone)]
pub struct FormatRegistry {
    handlers: FxHashMap<SmolStr, Arc<dyn ResourceHandler>>,
    default_handler: Arc<dyn ResourceHandler>,
}

impl FormatRegistry {
    /// A registry that only understands grammar files.
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            default_handler: Arc::new(GlotHandler),
        }
    }

    /// The standard table: grammar files plus `.ecore` and `.genmodel`
    /// support. `.xcore` support is heavier and must be added explicitly
    /// via [`FormatRegistry::with_xcore`].
    pub fn with_defaults() -> Self {
        Self::new()
            .with_handler(ECORE_EXTENSION, Arc::new(EcoreHandler))
            .with_handler(GENMODEL_EXTENSION, Arc::new(GenModelHandler))
    }

    pub fn with_handler(
        mut self,
        extension: impl Into<SmolStr>,
        handler: Arc<dyn ResourceHandler>,
    ) -> Self {
        self.handlers.insert(extension.into(), handler);
        self
    }

    pub fn with_xcore(self) -> Self {
        self.with_handler(XCORE_EXTENSION, Arc::new(XcoreHandler))
    }

    pub fn register(&mut self, extension: impl Into<SmolStr>, handler: Arc<dyn ResourceHandler>) {
        self.handlers.insert(extension.into(), handler);
    }

    /// Handler responsible for `extension`, if any.
    ///
    /// Returns `None` for a special extension with no registered handler;
    /// anything else falls back to the default grammar handler.
    pub fn handler_for_extension(&self, extension: &str) -> Option<Arc<dyn ResourceHandler>> {
        if let Some(handler) = self.handlers.get(extension) {
            return Some(handler.clone());
        }
        if SPECIAL_EXTENSIONS.contains(&extension) {
            return None;
        }
        Some(self.default_handler.clone())
    }

    /// Find a handler by its format name, including the default handler.
    pub fn handler_by_format(&self, format: &str) -> Option<Arc<dyn ResourceHandler>> {
        if self.default_handler.format_name() == format {
            return Some(self.default_handler.clone());
        }
        self.handlers
            .values()
            .find(|handler| handler.format_name() == format)
            .cloned()
    }

    pub fn supports_extension(&self, extension: &str) -> bool {
        self.handler_for_extension(extension).is_some()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&str> = self.handlers.keys().map(SmolStr::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("FormatRegistry")
            .field("extensions", &extensions)
            .field("default", &self.default_handler.format_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_supports_ecore_but_not_xcore() {
        let registry = FormatRegistry::with_defaults();
        assert!(registry.supports_extension("glot"));
        assert!(registry.supports_extension("ecore"));
        assert!(registry.supports_extension("genmodel"));
        assert!(!registry.supports_extension("xcore"));
        assert!(registry.with_xcore().supports_extension("xcore"));
    }

    #[test]
    fn test_unknown_extension_falls_back_to_grammar_handler() {
        let registry = FormatRegistry::with_defaults();
        let handler = registry.handler_for_extension("txt").unwrap();
        assert_eq!(handler.format_name(), "glot");
    }

    #[test]
    fn test_handler_by_format() {
        let registry = FormatRegistry::with_defaults();
        assert!(registry.handler_by_format("glot").is_some());
        assert!(registry.handler_by_format("ecore").is_some());
        assert!(registry.handler_by_format("xcore").is_none());
    }
}
