//! Workflow files.
//!
//! A workflow file is a JSON document describing one generator run: which
//! grammars to load, which auxiliary resources they need, where workspace
//! projects live on disk, and which bundle files the generator maintains.
//! [`Workflow::into_parts`] turns it into a ready [`Generator`] and the
//! [`LoaderContext`] to run it with.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::formats::FormatRegistry;
use crate::generator::{BundleLayout, Generator, ManifestConfig, PluginXmlConfig, ProjectLayout};
use crate::loader::{LanguageConfig, LoaderContext};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid workflow file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct WorkflowConfig {
    /// Relative locators resolve against this directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Workspace project name to directory, for `platform:/resource`
    /// locators.
    #[serde(default)]
    pub platform_roots: HashMap<String, PathBuf>,
    /// Enable the xcore resource handler. Off by default; a workflow that
    /// loads `.xcore` resources must opt in.
    #[serde(default)]
    pub xcore: bool,
    #[serde(default)]
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub bundles: BundlesEntry,
}

#[derive(Debug, Deserialize)]
pub struct LanguageEntry {
    /// Locator of the grammar file.
    pub grammar: String,
    /// Auxiliary resources loaded before the grammar.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Comma-separated file extensions; defaults to the lowercased
    /// grammar name.
    #[serde(default)]
    pub file_extensions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BundlesEntry {
    #[serde(default)]
    pub runtime: Option<BundleEntry>,
    #[serde(default)]
    pub runtime_test: Option<BundleEntry>,
    #[serde(default)]
    pub generic_ide: Option<BundleEntry>,
    #[serde(default)]
    pub generic_ide_test: Option<BundleEntry>,
    #[serde(default)]
    pub editor_plugin: Option<BundleEntry>,
    #[serde(default)]
    pub editor_plugin_test: Option<BundleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BundleEntry {
    #[serde(default)]
    pub manifest: Option<ManifestEntry>,
    #[serde(default)]
    pub plugin_xml: Option<PluginXmlEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub bundle_name: Option<String>,
    #[serde(default = "default_merge")]
    pub merge: bool,
    #[serde(default)]
    pub required_bundles: Vec<String>,
    #[serde(default)]
    pub imported_packages: Vec<String>,
    #[serde(default)]
    pub exported_packages: Vec<String>,
}

fn default_merge() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PluginXmlEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub entries: Vec<String>,
}

/// A parsed workflow file.
#[derive(Debug)]
pub struct Workflow {
    config: WorkflowConfig,
}

impl Workflow {
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        let config: WorkflowConfig = serde_json::from_str(json)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Build the generator and loader context this workflow describes.
    pub fn into_parts(self) -> (Generator, LoaderContext) {
        let config = self.config;

        let registry = if config.xcore {
            FormatRegistry::with_defaults().with_xcore()
        } else {
            FormatRegistry::with_defaults()
        };
        let mut ctx = LoaderContext::new(registry);
        if let Some(base_dir) = config.base_dir {
            ctx = ctx.with_base_dir(base_dir);
        }
        for (project, root) in config.platform_roots {
            ctx = ctx.with_platform_root(project, root);
        }

        let project = ProjectLayout {
            runtime: bundle_layout(config.bundles.runtime),
            runtime_test: bundle_layout(config.bundles.runtime_test),
            generic_ide: bundle_layout(config.bundles.generic_ide),
            generic_ide_test: bundle_layout(config.bundles.generic_ide_test),
            editor_plugin: bundle_layout(config.bundles.editor_plugin),
            editor_plugin_test: bundle_layout(config.bundles.editor_plugin_test),
        };
        let mut generator = Generator::new(project);
        for entry in config.languages {
            let mut language = LanguageConfig::new(entry.grammar.as_str());
            for resource in entry.resources {
                language = language.with_resource(resource.as_str());
            }
            if let Some(extensions) = entry.file_extensions {
                language = language.with_file_extensions(extensions);
            }
            generator.add_language(language);
        }
        (generator, ctx)
    }
}

fn bundle_layout(entry: Option<BundleEntry>) -> BundleLayout {
    let Some(entry) = entry else {
        return BundleLayout::default();
    };
    let mut layout = BundleLayout::default();
    if let Some(manifest) = entry.manifest {
        let mut config = ManifestConfig::new(manifest.path).with_merge(manifest.merge);
        if let Some(name) = manifest.bundle_name {
            config = config.with_bundle_name(name);
        }
        config.required_bundles.extend(manifest.required_bundles);
        config.imported_packages.extend(manifest.imported_packages);
        config.exported_packages.extend(manifest.exported_packages);
        layout.manifest = Some(config);
    }
    if let Some(plugin_xml) = entry.plugin_xml {
        let mut config = PluginXmlConfig::new(plugin_xml.path);
        config.entries = plugin_xml.entries;
        layout.plugin_xml = Some(config);
    }
    layout
}
