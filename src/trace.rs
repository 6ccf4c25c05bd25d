//! Trace locator conversion.
//!
//! Trace artifacts map generated output back to its sources and may be
//! packed into archives, so the locators persisted inside them must not
//! depend on where a workspace happens to live on disk. The converter
//! rewrites absolute locators into a source-relative form and the paired
//! resolver turns them back, given the same project context.
//!
//! The two locator kinds are distinct types. An [`AbsoluteUri`] has a
//! filesystem or platform anchor; a [`SourceRelativeUri`] is what goes
//! into the trace artifact and is resolved on load.

use smol_str::SmolStr;

use crate::base::ResourceUri;
use crate::loader::Resource;

/// A fully anchored locator, as used by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsoluteUri(ResourceUri);

impl AbsoluteUri {
    pub fn new(uri: ResourceUri) -> Self {
        Self(uri)
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.0
    }
}

impl From<ResourceUri> for AbsoluteUri {
    fn from(uri: ResourceUri) -> Self {
        Self(uri)
    }
}

impl std::fmt::Display for AbsoluteUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A locator safe to persist in a trace artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRelativeUri(ResourceUri);

impl SourceRelativeUri {
    pub fn new(uri: ResourceUri) -> Self {
        Self(uri)
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.0
    }
}

impl std::fmt::Display for SourceRelativeUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One project of the workspace: a name and the locator of its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: SmolStr,
    pub root: ResourceUri,
}

impl ProjectConfig {
    pub fn new(name: impl Into<SmolStr>, root: impl Into<ResourceUri>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// The projects known to a generator run.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    projects: Vec<ProjectConfig>,
}

impl WorkspaceConfig {
    pub fn new(projects: Vec<ProjectConfig>) -> Self {
        Self { projects }
    }

    pub fn add_project(&mut self, project: ProjectConfig) {
        self.projects.push(project);
    }

    pub fn projects(&self) -> &[ProjectConfig] {
        &self.projects
    }

    /// The first project whose root is a prefix of `uri`.
    pub fn find_project_containing(&self, uri: &ResourceUri) -> Option<&ProjectConfig> {
        self.projects
            .iter()
            .find(|project| uri.deresolve(&project.root).is_some())
    }
}

/// Converts absolute locators to the relative form persisted in traces.
#[derive(Debug, Clone, Default)]
pub struct TraceUriConverter {
    workspace: Option<WorkspaceConfig>,
}

impl TraceUriConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(workspace: WorkspaceConfig) -> Self {
        Self {
            workspace: Some(workspace),
        }
    }

    /// Convert against a known project: relative to the project root when
    /// the locator lives inside it, otherwise the scheme fallback.
    pub fn uri_for_trace(&self, project: &ProjectConfig, uri: &AbsoluteUri) -> SourceRelativeUri {
        match uri.uri().deresolve(&project.root) {
            Some(relative) => SourceRelativeUri(relative),
            None => self.convert_unanchored(uri.uri()),
        }
    }

    /// Convert a loaded resource's locator, finding its project through
    /// the workspace configuration when one is present.
    pub fn uri_for_trace_resource(&self, resource: &Resource) -> SourceRelativeUri {
        if let Some(workspace) = &self.workspace {
            if let Some(project) = workspace.find_project_containing(&resource.uri) {
                return self.uri_for_trace(project, &AbsoluteUri(resource.uri.clone()));
            }
        }
        self.convert_unanchored(&resource.uri)
    }

    fn convert_unanchored(&self, uri: &ResourceUri) -> SourceRelativeUri {
        if uri.scheme() == Some(crate::base::constants::PLATFORM_SCHEME) {
            // relative to the containing project: drop the resource marker
            // and the project name
            return SourceRelativeUri(uri.trim_leading_segments(2));
        }
        SourceRelativeUri(uri.clone())
    }
}

/// Re-anchors source-relative locators when a trace artifact is loaded.
#[derive(Debug, Clone, Default)]
pub struct TraceUriResolver;

impl TraceUriResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, relative: &SourceRelativeUri, project: &ProjectConfig) -> AbsoluteUri {
        AbsoluteUri(relative.uri().resolve(&project.root))
    }
}
