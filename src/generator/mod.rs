//! Generator driver.
//!
//! [`Generator::run`] takes configured languages through setup and then
//! produces the project-level infrastructure files: plugin descriptors
//! and bundle manifests. Language code generation itself is the job of
//! template collaborators outside this crate; what lives here is the
//! orchestration and the file-level merge rules:
//!
//! - manifests merge additively and are rewritten only on actual change
//! - a hand-authored file that must not be merged gets a `_gen` sibling
//! - missing files are created fresh

pub mod project;

pub use project::{BundleLayout, BundleSlot, ManifestConfig, PluginXmlConfig, ProjectLayout};

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::info;

use crate::loader::{LanguageConfig, LanguageError, LoaderContext};
use crate::manifest::{ManifestError, MergeableManifest, BUNDLE_ACTIVATOR};

/// Fatal problems of a generator run.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Failed to set up language '{language}'")]
    Language {
        language: String,
        #[source]
        source: LanguageError,
    },

    #[error("Invalid generator configuration:\n{message}")]
    Configuration { message: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration problems collected before generation starts.
#[derive(Debug, Default)]
pub struct Issues {
    errors: Vec<String>,
}

impl Issues {
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Drives language setup and infrastructure generation.
#[derive(Debug, Default)]
pub struct Generator {
    languages: Vec<LanguageConfig>,
    project: ProjectLayout,
}

impl Generator {
    pub fn new(project: ProjectLayout) -> Self {
        Self {
            languages: Vec::new(),
            project,
        }
    }

    /// Add a language to be included in the generation run.
    pub fn add_language(&mut self, language: LanguageConfig) {
        self.languages.push(language);
    }

    pub fn languages(&self) -> &[LanguageConfig] {
        &self.languages
    }

    pub fn project(&self) -> &ProjectLayout {
        &self.project
    }

    pub fn run(&mut self, ctx: &LoaderContext) -> Result<(), GeneratorError> {
        info!("Initializing generator");
        for language in &mut self.languages {
            let uri = language.uri().to_string();
            language
                .initialize(ctx)
                .map_err(|source| GeneratorError::Language {
                    language: uri,
                    source,
                })?;
        }

        let mut issues = Issues::default();
        self.check_configuration(&mut issues);
        if issues.has_errors() {
            return Err(GeneratorError::Configuration {
                message: issues.errors().join("\n"),
            });
        }

        for language in &self.languages {
            if let Some(grammar) = language.grammar() {
                info!("Generating {}", grammar.name);
            }
        }
        // language-independent, one round regardless of how many languages
        self.add_implicit_contributions();
        info!("Generating common infrastructure");
        self.generate_plugin_xmls()?;
        self.generate_manifests()?;
        Ok(())
    }

    /// Two languages must not generate packages with the same namespace
    /// URI; the second would silently shadow the first.
    fn check_configuration(&self, issues: &mut Issues) {
        let mut uris: FxHashMap<SmolStr, SmolStr> = FxHashMap::default();
        for language in &self.languages {
            let Some(grammar) = language.grammar() else {
                continue;
            };
            for decl in grammar.generated_metamodels() {
                let ns_uri = decl.ns_uri();
                match uris.get(ns_uri) {
                    Some(first) => issues.add_error(format!(
                        "Duplicate generated grammar with nsURI '{ns_uri}' in {first} and {}",
                        grammar.name
                    )),
                    None => {
                        uris.insert(SmolStr::new(ns_uri), grammar.name.clone());
                    }
                }
            }
        }
    }

    /// Dependencies every generated bundle needs regardless of grammar.
    fn add_implicit_contributions(&mut self) {
        if let Some(manifest) = &mut self.project.runtime.manifest {
            manifest.required_bundles.insert("glotta.runtime".to_string());
            manifest.required_bundles.insert("glotta.util".to_string());
            manifest.imported_packages.insert("glotta.logging".to_string());
        }
        if let Some(manifest) = &mut self.project.editor_plugin.manifest {
            for bundle in [
                "glotta.ui",
                "glotta.ui.shared",
                "glotta.platform.editors",
                "glotta.platform",
            ] {
                manifest.required_bundles.insert(bundle.to_string());
            }
        }
    }

    fn generate_plugin_xmls(&mut self) -> Result<(), GeneratorError> {
        let mut plugin_xmls = self.project.plugin_xmls_mut();
        plugin_xmls.sort_by(|a, b| a.1.path.cmp(&b.1.path));
        for (_, plugin_xml) in plugin_xmls {
            if plugin_xml.path.exists() {
                // never overwrite a hand-authored descriptor
                if plugin_xml.path.extension().is_some_and(|ext| ext == "xml") {
                    plugin_xml.path = append_gen(&plugin_xml.path);
                    write_text(&plugin_xml.path, &plugin_xml.render())?;
                }
            } else {
                write_text(&plugin_xml.path, &plugin_xml.render())?;
            }
        }
        Ok(())
    }

    fn generate_manifests(&mut self) -> Result<(), GeneratorError> {
        let activator = self
            .languages
            .first()
            .and_then(LanguageConfig::naming)
            .map(|naming| naming.plugin_activator());
        let mut manifests = self.project.manifests_mut();
        manifests.sort_by(|a, b| a.1.path.cmp(&b.1.path));
        for (slot, manifest) in manifests {
            if manifest.bundle_name.is_none() {
                manifest.bundle_name = infer_bundle_name(&manifest.path);
            }
            // the activator goes into the editor bundle only
            let slot_activator = if slot == BundleSlot::EditorPlugin {
                activator.as_deref()
            } else {
                None
            };
            if manifest.path.exists() {
                if manifest.merge {
                    merge_manifest(manifest, slot_activator)?;
                } else if manifest.path.extension().is_some_and(|ext| ext == "MF") {
                    manifest.path = append_gen(&manifest.path);
                    write_fresh_manifest(manifest, slot_activator)?;
                }
            } else {
                write_fresh_manifest(manifest, slot_activator)?;
            }
        }
        Ok(())
    }
}

fn merge_manifest(
    manifest: &ManifestConfig,
    activator: Option<&str>,
) -> Result<(), GeneratorError> {
    let mut merge = MergeableManifest::load(&manifest.path, manifest.bundle_name.as_deref())?;
    merge.add_exported_packages(&manifest.exported_packages);
    merge.add_required_bundles(&manifest.required_bundles);
    merge.add_imported_packages(&manifest.imported_packages);
    if let Some(activator) = activator {
        merge.put_if_absent(BUNDLE_ACTIVATOR, activator);
    }
    if merge.is_modified() {
        merge.write_to(&manifest.path)?;
    }
    Ok(())
}

fn write_fresh_manifest(
    manifest: &ManifestConfig,
    activator: Option<&str>,
) -> Result<(), GeneratorError> {
    let bundle_name = manifest.bundle_name.as_deref().unwrap_or("unnamed");
    let mut fresh = MergeableManifest::new(bundle_name);
    fresh.add_exported_packages(&manifest.exported_packages);
    fresh.add_required_bundles(&manifest.required_bundles);
    fresh.add_imported_packages(&manifest.imported_packages);
    if let Some(activator) = activator {
        fresh.put_if_absent(BUNDLE_ACTIVATOR, activator);
    }
    write_text(&manifest.path, &fresh.to_string())?;
    Ok(())
}

/// `plugin.xml` becomes `plugin.xml_gen`, `MANIFEST.MF` becomes
/// `MANIFEST.MF_gen`.
fn append_gen(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push("_gen");
    PathBuf::from(os)
}

fn write_text(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
}

fn infer_bundle_name(path: &Path) -> Option<String> {
    let segments: Vec<&OsStr> = path.iter().collect();
    if segments.len() >= 3 && segments[segments.len() - 2] == "META-INF" {
        return segments[segments.len() - 3].to_str().map(str::to_string);
    }
    None
}
