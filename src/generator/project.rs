//! Project layout configuration.
//!
//! A generator run targets a fixed set of bundle slots, each optionally
//! carrying a manifest and a plugin descriptor. Paths are taken as given;
//! the workflow layer decides where bundles live on disk.

use std::path::PathBuf;

use indexmap::IndexSet;

/// The bundle a manifest or descriptor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleSlot {
    Runtime,
    RuntimeTest,
    GenericIde,
    GenericIdeTest,
    EditorPlugin,
    EditorPluginTest,
}

/// Manifest settings for one bundle.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub path: PathBuf,
    /// Symbolic name; inferred from a `<bundle>/META-INF/...` path when
    /// absent.
    pub bundle_name: Option<String>,
    /// Merge into an existing file instead of writing a `_gen` sibling.
    pub merge: bool,
    pub required_bundles: IndexSet<String>,
    pub imported_packages: IndexSet<String>,
    pub exported_packages: IndexSet<String>,
}

impl ManifestConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bundle_name: None,
            merge: true,
            required_bundles: IndexSet::new(),
            imported_packages: IndexSet::new(),
            exported_packages: IndexSet::new(),
        }
    }

    pub fn with_bundle_name(mut self, name: impl Into<String>) -> Self {
        self.bundle_name = Some(name.into());
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn require_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.required_bundles.insert(bundle.into());
        self
    }

    pub fn import_package(mut self, package: impl Into<String>) -> Self {
        self.imported_packages.insert(package.into());
        self
    }

    pub fn export_package(mut self, package: impl Into<String>) -> Self {
        self.exported_packages.insert(package.into());
        self
    }
}

/// Plugin descriptor settings for one bundle. Entries are XML fragments
/// placed verbatim inside the root element.
#[derive(Debug, Clone)]
pub struct PluginXmlConfig {
    pub path: PathBuf,
    pub entries: Vec<String>,
}

impl PluginXmlConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entries.push(entry.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plugin>\n");
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out.push_str("</plugin>\n");
        out
    }
}

/// One bundle slot of the project.
#[derive(Debug, Clone, Default)]
pub struct BundleLayout {
    pub manifest: Option<ManifestConfig>,
    pub plugin_xml: Option<PluginXmlConfig>,
}

impl BundleLayout {
    pub fn with_manifest(mut self, manifest: ManifestConfig) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_plugin_xml(mut self, plugin_xml: PluginXmlConfig) -> Self {
        self.plugin_xml = Some(plugin_xml);
        self
    }
}

/// All bundle slots of a generator run. Unused slots stay empty.
#[derive(Debug, Clone, Default)]
pub struct ProjectLayout {
    pub runtime: BundleLayout,
    pub runtime_test: BundleLayout,
    pub generic_ide: BundleLayout,
    pub generic_ide_test: BundleLayout,
    pub editor_plugin: BundleLayout,
    pub editor_plugin_test: BundleLayout,
}

impl ProjectLayout {
    fn slots_mut(&mut self) -> [(BundleSlot, &mut BundleLayout); 6] {
        [
            (BundleSlot::Runtime, &mut self.runtime),
            (BundleSlot::RuntimeTest, &mut self.runtime_test),
            (BundleSlot::GenericIde, &mut self.generic_ide),
            (BundleSlot::GenericIdeTest, &mut self.generic_ide_test),
            (BundleSlot::EditorPlugin, &mut self.editor_plugin),
            (BundleSlot::EditorPluginTest, &mut self.editor_plugin_test),
        ]
    }

    /// All configured manifests.
    pub fn manifests_mut(&mut self) -> Vec<(BundleSlot, &mut ManifestConfig)> {
        self.slots_mut()
            .into_iter()
            .filter_map(|(slot, bundle)| bundle.manifest.as_mut().map(|manifest| (slot, manifest)))
            .collect()
    }

    /// All configured plugin descriptors.
    pub fn plugin_xmls_mut(&mut self) -> Vec<(BundleSlot, &mut PluginXmlConfig)> {
        self.slots_mut()
            .into_iter()
            .filter_map(|(slot, bundle)| {
                bundle.plugin_xml.as_mut().map(|plugin_xml| (slot, plugin_xml))
            })
            .collect()
    }
}
