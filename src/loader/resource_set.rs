//! Resources and the resource set.
//!
//! A [`Resource`] is one loaded file: its locator, the model elements it
//! contributed, and any diagnostics produced while reading it. A
//! [`ResourceSet`] owns the resources of one language together with the
//! [`ModelStore`] their elements live in. Loading is by demand: asking for
//! a URI twice returns the same resource.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::{GrammarId, PackageId, ResourceId, ResourceUri, Span};
use crate::loader::LoaderContext;
use crate::loader::index::ResourceIndex;
use crate::model::ModelStore;
use crate::parser::ParseIssue;

/// One element held by a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    Grammar(GrammarId),
    Package(PackageId),
    /// Generator-model info: maps a package namespace URI to the base
    /// package generated code should live in.
    GenInfo {
        ns_uri: SmolStr,
        base_package: SmolStr,
    },
}

/// A problem recorded against a resource while loading or resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub message: String,
    pub span: Option<Span>,
}

impl LoadDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl From<ParseIssue> for LoadDiagnostic {
    fn from(issue: ParseIssue) -> Self {
        Self {
            message: issue.message,
            span: issue.span,
        }
    }
}

impl std::fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {}", span.start, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A loaded file and what it contributed to the model store.
#[derive(Debug)]
pub struct Resource {
    pub uri: ResourceUri,
    pub contents: Vec<ResourceContent>,
    pub diagnostics: Vec<LoadDiagnostic>,
    /// Format name of the handler that loaded this resource, empty when no
    /// handler was available.
    pub(crate) format: SmolStr,
}

impl Resource {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// The grammar ids among this resource's contents, in order.
    pub fn grammars(&self) -> impl Iterator<Item = GrammarId> + '_ {
        self.contents.iter().filter_map(|content| match content {
            ResourceContent::Grammar(id) => Some(*id),
            _ => None,
        })
    }

    /// Join all diagnostics into one newline-separated block, in order.
    pub fn joined_diagnostics(&self) -> String {
        let rendered: Vec<String> = self.diagnostics.iter().map(|d| d.to_string()).collect();
        rendered.join("\n")
    }
}

/// All resources of one language, plus the model store they populate.
#[derive(Debug, Default)]
pub struct ResourceSet {
    store: ModelStore,
    resources: Vec<Resource>,
    by_uri: FxHashMap<ResourceUri, ResourceId>,
    activated_formats: FxHashSet<SmolStr>,
    index: ResourceIndex,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ModelStore {
        &mut self.store
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.index()]
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(index, resource)| (ResourceId::from_index(index), resource))
    }

    pub fn resource_by_uri(&self, uri: &ResourceUri) -> Option<ResourceId> {
        self.by_uri.get(uri).copied()
    }

    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    /// Load the resource at `uri`, or return it if already loaded.
    ///
    /// Read and parse problems never fail the call; they are recorded as
    /// diagnostics on the returned resource. The first time an extension
    /// with a dedicated handler is seen, that handler's activation hook
    /// runs against the store.
    pub fn load(&mut self, uri: &ResourceUri, ctx: &LoaderContext) -> ResourceId {
        if let Some(existing) = self.by_uri.get(uri) {
            return *existing;
        }
        let extension = uri.file_extension().unwrap_or_default();
        let resource = match ctx.registry().handler_for_extension(extension) {
            Some(handler) => {
                if !self.activated_formats.contains(handler.format_name()) {
                    debug!(format = handler.format_name(), "activating resource handler");
                    handler.on_activate(&mut self.store);
                    self.activated_formats.insert(SmolStr::new(handler.format_name()));
                }
                match ctx.read(uri) {
                    Ok(source) => {
                        let loaded = handler.load(uri, &source, &mut self.store);
                        Resource {
                            uri: uri.clone(),
                            contents: loaded.contents,
                            diagnostics: loaded.diagnostics,
                            format: SmolStr::new(handler.format_name()),
                        }
                    }
                    Err(message) => Resource {
                        uri: uri.clone(),
                        contents: Vec::new(),
                        diagnostics: vec![LoadDiagnostic::new(message)],
                        format: SmolStr::new(handler.format_name()),
                    },
                }
            }
            None => {
                warn!(uri = %uri, "no resource handler registered for '{extension}' files");
                Resource {
                    uri: uri.clone(),
                    contents: Vec::new(),
                    diagnostics: vec![LoadDiagnostic::new(format!(
                        "No resource handler registered for '{extension}' files"
                    ))],
                    format: SmolStr::default(),
                }
            }
        };
        let id = ResourceId::from_index(self.resources.len());
        self.resources.push(resource);
        self.by_uri.insert(uri.clone(), id);
        id
    }

    /// Register an already built resource. Used by tests and by callers
    /// that synthesize content without going through a handler.
    pub fn insert_resource(&mut self, resource: Resource) -> ResourceId {
        let id = ResourceId::from_index(self.resources.len());
        self.by_uri.insert(resource.uri.clone(), id);
        self.resources.push(resource);
        id
    }

    /// Build the cross-resource index from handler descriptions.
    ///
    /// Resources whose handler yields no description are skipped.
    pub fn install_index(&mut self, ctx: &LoaderContext) {
        let mut index = ResourceIndex::default();
        for resource in &self.resources {
            let Some(handler) = ctx.registry().handler_by_format(&resource.format) else {
                debug!(uri = %resource.uri, "no handler for indexing, skipping");
                continue;
            };
            let Some(description) = handler.describe(resource, &self.store) else {
                debug!(uri = %resource.uri, "resource has no description, skipping");
                continue;
            };
            index.add_description(description);
        }
        self.index = index;
    }

    /// Split borrow used by the resolution pass: the store mutably, the
    /// resource list and index immutably.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut ModelStore, &[Resource], &ResourceIndex) {
        (&mut self.store, &self.resources, &self.index)
    }

    pub(crate) fn push_diagnostic(&mut self, id: ResourceId, diagnostic: LoadDiagnostic) {
        self.resources[id.index()].diagnostics.push(diagnostic);
    }
}
