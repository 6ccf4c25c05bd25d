//! Language setup.
//!
//! A [`LanguageConfig`] owns everything one language needs at generation
//! time: the grammar locator, auxiliary resources to load alongside it,
//! and the resource set they all live in. [`LanguageConfig::initialize`]
//! performs the whole setup: load auxiliaries, index them, load the
//! grammar, resolve references, and validate. Auxiliary problems are
//! logged and tolerated; grammar problems are fatal.

use smol_str::SmolStr;
use tracing::{error, info, warn};

use crate::base::{GrammarId, ResourceUri};
use crate::loader::resolve::resolve_all;
use crate::loader::resource_set::{ResourceContent, ResourceSet};
use crate::loader::{LanguageError, LoaderContext};
use crate::model::Grammar;
use crate::naming::GrammarNaming;
use crate::validation::{run_validators, DiagnosticChain};

pub struct LanguageConfig {
    uri: ResourceUri,
    loaded_resources: Vec<ResourceUri>,
    file_extensions: Option<SmolStr>,
    resource_set: ResourceSet,
    grammar: Option<GrammarId>,
    naming: Option<GrammarNaming>,
}

impl LanguageConfig {
    pub fn new(uri: impl Into<ResourceUri>) -> Self {
        Self {
            uri: uri.into(),
            loaded_resources: Vec::new(),
            file_extensions: None,
            resource_set: ResourceSet::new(),
            grammar: None,
            naming: None,
        }
    }

    /// Add an auxiliary resource loaded before the grammar, typically a
    /// metamodel the grammar imports.
    pub fn with_resource(mut self, uri: impl Into<ResourceUri>) -> Self {
        self.loaded_resources.push(uri.into());
        self
    }

    /// Comma-separated file extensions for the language.
    pub fn with_file_extensions(mut self, extensions: impl Into<SmolStr>) -> Self {
        self.file_extensions = Some(extensions.into());
        self
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn resource_set(&self) -> &ResourceSet {
        &self.resource_set
    }

    pub fn grammar_id(&self) -> Option<GrammarId> {
        self.grammar
    }

    /// The loaded grammar. `None` before a successful [`initialize`].
    ///
    /// [`initialize`]: Self::initialize
    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.map(|id| self.resource_set.store().grammar(id))
    }

    pub fn naming(&self) -> Option<&GrammarNaming> {
        self.naming.as_ref()
    }

    /// File extensions served by the language, in configuration order.
    pub fn file_extensions(&self) -> Vec<SmolStr> {
        match &self.file_extensions {
            Some(configured) => configured
                .split(',')
                .map(str::trim)
                .filter(|extension| !extension.is_empty())
                .map(SmolStr::new)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Load and validate the language.
    ///
    /// Auxiliary resources load first and feed the index; their problems
    /// are logged but do not fail the setup. The grammar itself must load
    /// cleanly, resolve fully, and pass validation.
    pub fn initialize(&mut self, ctx: &LoaderContext) -> Result<(), LanguageError> {
        let mut auxiliaries = Vec::new();
        for uri in &self.loaded_resources {
            auxiliaries.push(self.resource_set.load(uri, ctx));
        }
        if !self.resource_set.is_empty() {
            self.resource_set.install_index(ctx);
            resolve_all(&mut self.resource_set);
        }
        for id in auxiliaries {
            let resource = self.resource_set.resource(id);
            if resource.has_errors() {
                error!(
                    "Error loading '{}':\n{}",
                    resource.uri,
                    resource.joined_diagnostics()
                );
            } else if resource.contents.is_empty() {
                error!("Error loading '{}'", resource.uri);
            }
        }

        let id = self.resource_set.load(&self.uri, ctx);
        resolve_all(&mut self.resource_set);
        let resource = self.resource_set.resource(id);
        if resource.has_errors() {
            return Err(LanguageError::ResourceErrors {
                uri: self.uri.to_string(),
                details: resource.joined_diagnostics(),
            });
        }
        let grammar = match resource.contents.first() {
            Some(ResourceContent::Grammar(grammar)) => *grammar,
            _ => {
                return Err(LanguageError::NoContent {
                    uri: self.uri.to_string(),
                })
            }
        };

        self.validate_grammar(grammar, ctx)?;

        let name = self.resource_set.store().grammar(grammar).name.clone();
        let naming = GrammarNaming::new(name);
        if self.file_extensions.is_none() {
            let extension = naming.default_file_extension();
            info!("No explicit file extensions configured. Using '*.{extension}'.");
            self.file_extensions = Some(extension);
        }
        self.naming = Some(naming);
        self.grammar = Some(grammar);
        Ok(())
    }

    fn validate_grammar(
        &self,
        grammar: GrammarId,
        ctx: &LoaderContext,
    ) -> Result<(), LanguageError> {
        let store = self.resource_set.store();
        let loaded = store.grammar(grammar);

        // An import that resolution left unbound means the package was
        // never put into the store, by a handler or a generate clause.
        for decl in loaded.referenced_metamodels() {
            if decl.package().is_none() {
                let token = decl
                    .source_text
                    .clone()
                    .unwrap_or_else(|| SmolStr::new_static("(unknown)"));
                return Err(LanguageError::UnresolvedMetamodel {
                    token: token.to_string(),
                    grammar: loaded.name.to_string(),
                });
            }
        }

        let mut chain = DiagnosticChain::new();
        run_validators(store, grammar, ctx.validators(), &mut chain).map_err(|abort| {
            LanguageError::Validation {
                message: abort.diagnostic.message,
                cause: abort.diagnostic.source,
            }
        })?;
        for diagnostic in chain.collected() {
            warn!(code = diagnostic.code, "{}", diagnostic.message);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LanguageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageConfig")
            .field("uri", &self.uri)
            .field("loaded_resources", &self.loaded_resources)
            .field("file_extensions", &self.file_extensions)
            .field("grammar", &self.grammar)
            .finish()
    }
}
