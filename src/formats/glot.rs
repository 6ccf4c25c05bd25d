//! Handler for `.glot` grammar files.

use crate::base::ResourceUri;
use crate::base::constants::GLOT_EXTENSION;
use crate::formats::{LoadedContents, ResourceHandler};
use crate::loader::{Resource, ResourceContent, ResourceDescription};
use crate::model::ModelStore;
use crate::parser::parse_glot;

/// Loads grammar files. Also the fallback handler for extensions with no
/// dedicated format.
#[derive(Debug, Default)]
pub struct GlotHandler;

impl ResourceHandler for GlotHandler {
    fn format_name(&self) -> &'static str {
        GLOT_EXTENSION
    }

    fn load(&self, _uri: &ResourceUri, source: &str, store: &mut ModelStore) -> LoadedContents {
        // a blank file is an empty resource, not a syntax error
        if source.trim().is_empty() {
            return LoadedContents::empty();
        }
        match parse_glot(source) {
            Ok(grammar) => {
                let id = store.add_grammar(grammar);
                LoadedContents::of(ResourceContent::Grammar(id))
            }
            Err(issue) => LoadedContents::failed(issue.into()),
        }
    }

    fn describe(&self, resource: &Resource, store: &ModelStore) -> Option<ResourceDescription> {
        let mut description = ResourceDescription::for_uri(resource.uri.clone());
        for id in resource.grammars() {
            let grammar = store.grammar(id);
            if !grammar.name.is_empty() {
                description.exported_grammars.push((grammar.name.clone(), id));
            }
        }
        Some(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_yields_empty_resource() {
        let mut store = ModelStore::new();
        let loaded = GlotHandler.load(&ResourceUri::parse("a.glot"), "  \n\t\n", &mut store);
        assert!(loaded.contents.is_empty());
        assert!(loaded.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_error_becomes_diagnostic() {
        let mut store = ModelStore::new();
        let loaded = GlotHandler.load(&ResourceUri::parse("a.glot"), "grammar ???", &mut store);
        assert!(loaded.contents.is_empty());
        assert_eq!(loaded.diagnostics.len(), 1);
    }

    #[test]
    fn test_loaded_grammar_is_described() {
        let mut store = ModelStore::new();
        let uri = ResourceUri::parse("a.glot");
        let loaded = GlotHandler.load(&uri, "grammar org.example.A Model: 'a' ;", &mut store);
        assert_eq!(loaded.contents.len(), 1);

        let resource = Resource {
            uri: uri.clone(),
            contents: loaded.contents,
            diagnostics: loaded.diagnostics,
            format: "glot".into(),
        };
        let description = GlotHandler.describe(&resource, &store).unwrap();
        assert_eq!(description.exported_grammars.len(), 1);
        assert_eq!(description.exported_grammars[0].0, "org.example.A");
    }
}
