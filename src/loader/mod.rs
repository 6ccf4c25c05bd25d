//! Grammar and resource loading.
//!
//! The loader turns locators into a validated, fully resolved language:
//!
//! - [`LoaderContext`] carries the format table, validators, and
//!   filesystem mapping supplied by the caller
//! - [`ResourceSet`] loads resources on demand and records problems as
//!   diagnostics instead of failing
//! - [`resolve_all`] binds by-name references to their targets
//! - [`LanguageConfig`] drives the whole setup for one language and is
//!   the only place loading problems become hard errors

pub mod context;
pub mod index;
pub mod language;
pub mod resolve;
pub mod resource_set;

pub use context::LoaderContext;
pub use index::{ResourceDescription, ResourceIndex};
pub use language::LanguageConfig;
pub use resolve::resolve_all;
pub use resource_set::{LoadDiagnostic, Resource, ResourceContent, ResourceSet};

/// Fatal problems while setting up a language.
#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    /// The grammar resource loaded but contained nothing.
    #[error("Couldn't load grammar for '{uri}'.")]
    NoContent { uri: String },

    /// The grammar resource carried diagnostics, from parsing, reading,
    /// or resolution.
    #[error("Problem parsing '{uri}':\n{details}")]
    ResourceErrors { uri: String, details: String },

    /// An imported metamodel never made it into the store.
    #[error(
        "The package {token} in grammar {grammar} could not be found. \
         You might want to register that package in your workflow file."
    )]
    UnresolvedMetamodel { token: String, grammar: String },

    /// A validator reported an error-severity finding.
    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}
