//! Handler for `.xcore` textual metamodel files.

use crate::base::ResourceUri;
use crate::base::constants::XCORE_LANG_NS_URI;
use crate::formats::{LoadedContents, ResourceHandler};
use crate::loader::{Resource, ResourceContent, ResourceDescription};
use crate::model::{Classifier, ModelStore, Package, PackageOrigin};
use crate::parser::parse_xcore;

/// Optional format support; register it with
/// [`FormatRegistry::with_xcore`](crate::formats::FormatRegistry::with_xcore).
#[derive(Debug, Default)]
pub struct XcoreHandler;

impl ResourceHandler for XcoreHandler {
    fn format_name(&self) -> &'static str {
        "xcore"
    }

    /// Seeds the library package of primitive types that textual
    /// metamodels reference implicitly.
    fn on_activate(&self, store: &mut ModelStore) {
        let mut package = Package::new("xcore.lang", XCORE_LANG_NS_URI, PackageOrigin::Builtin);
        for primitive in ["String", "Int", "Bool", "Real"] {
            package.classifiers.push(Classifier::data_type(primitive));
        }
        store.ensure_package(package);
    }

    fn load(&self, _uri: &ResourceUri, source: &str, store: &mut ModelStore) -> LoadedContents {
        match parse_xcore(source) {
            Ok(package) => {
                let id = store.add_package(package);
                LoadedContents::of(ResourceContent::Package(id))
            }
            Err(issue) => LoadedContents::failed(issue.into()),
        }
    }

    fn describe(&self, resource: &Resource, store: &ModelStore) -> Option<ResourceDescription> {
        let mut description = ResourceDescription::for_uri(resource.uri.clone());
        for content in &resource.contents {
            if let ResourceContent::Package(id) = content {
                let package = store.package(*id);
                if !package.ns_uri.is_empty() {
                    description
                        .exported_packages
                        .push((package.ns_uri.clone(), *id));
                }
            }
        }
        Some(description)
    }
}
