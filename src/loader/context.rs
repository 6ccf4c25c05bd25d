//! Loader context: format capabilities, validators, and filesystem access.
//!
//! Everything a load needs to know about its environment travels in a
//! [`LoaderContext`] handed in by the caller. There is no process-global
//! registry; two contexts with different format tables or platform roots
//! coexist without seeing each other.

use std::fs;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::ResourceUri;
use crate::formats::FormatRegistry;
use crate::validation::{standard_validators, GrammarValidator};

pub struct LoaderContext {
    registry: FormatRegistry,
    validators: Vec<Box<dyn GrammarValidator>>,
    /// Project name to directory, for `platform:/resource` locators.
    platform_roots: FxHashMap<SmolStr, PathBuf>,
    /// Relative `file:` and scheme-less locators resolve against this.
    base_dir: PathBuf,
}

impl LoaderContext {
    pub fn new(registry: FormatRegistry) -> Self {
        Self {
            registry,
            validators: standard_validators(),
            platform_roots: FxHashMap::default(),
            base_dir: PathBuf::from("."),
        }
    }

    /// Context with the default format table and validators.
    pub fn standard() -> Self {
        Self::new(FormatRegistry::with_defaults())
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Map a workspace project name to a directory on disk.
    pub fn with_platform_root(
        mut self,
        project: impl Into<SmolStr>,
        root: impl Into<PathBuf>,
    ) -> Self {
        self.platform_roots.insert(project.into(), root.into());
        self
    }

    pub fn with_validator(mut self, validator: Box<dyn GrammarValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn validators(&self) -> &[Box<dyn GrammarValidator>] {
        &self.validators
    }

    /// Turn a locator into a filesystem path.
    ///
    /// `platform:/resource/<project>/...` needs a registered root for the
    /// project. `file:` and scheme-less locators resolve against the base
    /// directory when relative. Any other scheme is not loadable.
    pub fn resolve_to_path(&self, uri: &ResourceUri) -> Result<PathBuf, String> {
        if uri.is_platform_resource() {
            let project = uri.platform_project().unwrap_or_default();
            let root = self
                .platform_roots
                .get(project)
                .ok_or_else(|| format!("No platform root registered for project '{project}'"))?;
            return Ok(root.join(uri.trim_leading_segments(2).to_file_path()));
        }
        match uri.scheme() {
            None | Some("file") => {
                let path = uri.to_file_path();
                if path.is_absolute() {
                    Ok(path)
                } else {
                    Ok(self.base_dir.join(path))
                }
            }
            Some(other) => Err(format!("Cannot load '{uri}': unsupported scheme '{other}'")),
        }
    }

    /// Read the resource behind `uri` into a string.
    pub fn read(&self, uri: &ResourceUri) -> Result<String, String> {
        let path = self.resolve_to_path(uri)?;
        fs::read_to_string(&path)
            .map_err(|err| format!("Couldn't read '{}': {err}", path.display()))
    }
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("registry", &self.registry)
            .field("validators", &self.validators.len())
            .field("platform_roots", &self.platform_roots)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}
