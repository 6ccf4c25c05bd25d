//! Handler for `.genmodel` generator-model files.
//!
//! A generator model does not define types of its own; it annotates
//! already defined packages with code generation settings. The only
//! setting carried here is the base package for generated code, read from
//! `genPackages` elements.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smol_str::SmolStr;

use crate::base::ResourceUri;
use crate::formats::{LoadedContents, ResourceHandler, xml_error};
use crate::loader::{LoadDiagnostic, Resource, ResourceContent, ResourceDescription};
use crate::model::ModelStore;

#[derive(Debug, Default)]
pub struct GenModelHandler;

impl ResourceHandler for GenModelHandler {
    fn format_name(&self) -> &'static str {
        "genmodel"
    }

    fn load(&self, _uri: &ResourceUri, source: &str, store: &mut ModelStore) -> LoadedContents {
        let mut loaded = LoadedContents::empty();
        let mut reader = Reader::from_reader(source.as_bytes());
        reader.config_mut().trim_text(true);
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.local_name().as_ref() {
                        b"GenModel" => saw_root = true,
                        b"genPackages" => {
                            if let Some(info) = read_gen_package(e) {
                                store.set_gen_base_package(
                                    info.ns_uri.clone(),
                                    info.base_package.clone(),
                                );
                                loaded.contents.push(ResourceContent::GenInfo {
                                    ns_uri: info.ns_uri,
                                    base_package: info.base_package,
                                });
                            } else {
                                loaded.diagnostics.push(LoadDiagnostic::new(
                                    "genPackages element without ecorePackage and basePackage",
                                ));
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return LoadedContents::failed(xml_error(
                        source,
                        reader.error_position(),
                        &e,
                    ));
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return LoadedContents::failed(LoadDiagnostic::new("No GenModel element found"));
        }
        loaded
    }

    /// Generator models export nothing; the index skips them.
    fn describe(&self, _resource: &Resource, _store: &ModelStore) -> Option<ResourceDescription> {
        None
    }
}

struct GenPackageInfo {
    ns_uri: SmolStr,
    base_package: SmolStr,
}

fn read_gen_package(e: &BytesStart<'_>) -> Option<GenPackageInfo> {
    let mut ns_uri = None;
    let mut base_package = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok()?;
        match attr.key.local_name().as_ref() {
            b"ecorePackage" => ns_uri = Some(SmolStr::new(&value)),
            b"basePackage" => base_package = Some(SmolStr::new(&value)),
            _ => {}
        }
    }
    Some(GenPackageInfo {
        ns_uri: ns_uri?,
        base_package: base_package?,
    })
}
