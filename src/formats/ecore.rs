//! Handler for `.ecore` structural metamodel files.
//!
//! Reads the XML interchange form: an `EPackage` root with `eClassifiers`
//! children typed via `xsi:type`, class features as `eStructuralFeatures`,
//! and enum literals as `eLiterals`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smol_str::SmolStr;

use crate::base::ResourceUri;
use crate::base::constants::ECORE_NS_URI;
use crate::formats::xml_error;
use crate::formats::{LoadedContents, ResourceHandler};
use crate::loader::{LoadDiagnostic, Resource, ResourceContent, ResourceDescription};
use crate::model::{Classifier, ClassifierKind, ModelStore, Package, PackageOrigin};
use crate::naming;

#[derive(Debug, Default)]
pub struct EcoreHandler;

impl ResourceHandler for EcoreHandler {
    fn format_name(&self) -> &'static str {
        "ecore"
    }

    /// Seeds the builtin package with the primitive data types grammars
    /// reference through `import`.
    fn on_activate(&self, store: &mut ModelStore) {
        let mut package = Package::new("ecore", ECORE_NS_URI, PackageOrigin::Builtin);
        package.classifiers.push(Classifier::class("EObject"));
        for primitive in ["EString", "EInt", "ELong", "EBoolean", "EDouble", "EDate"] {
            package.classifiers.push(Classifier::data_type(primitive));
        }
        store.ensure_package(package);
    }

    fn load(&self, _uri: &ResourceUri, source: &str, store: &mut ModelStore) -> LoadedContents {
        match read_package(source) {
            Ok((package, diagnostics)) => {
                let id = store.add_package(package);
                LoadedContents {
                    contents: vec![ResourceContent::Package(id)],
                    diagnostics,
                }
            }
            Err(diagnostic) => LoadedContents::failed(diagnostic),
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

fn read_package(source: &str) -> Result<(Package, Vec<LoadDiagnostic>), LoadDiagnostic> {
    let mut reader = Reader::from_reader(source.as_bytes());
    reader.config_mut().trim_text(true);

    let mut package: Option<Package> = None;
    let mut diagnostics = Vec::new();
    let mut current: Option<Classifier> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                handle_element(e, &mut package, &mut current, &mut diagnostics);
            }
            Ok(Event::Empty(ref e)) => {
                handle_element(e, &mut package, &mut current, &mut diagnostics);
                if e.local_name().as_ref() == b"eClassifiers" {
                    commit_classifier(&mut package, &mut current);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"eClassifiers" {
                    commit_classifier(&mut package, &mut current);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(xml_error(source, reader.error_position(), &e));
            }
            _ => {}
        }
        buf.clear();
    }

    match package {
        Some(package) => Ok((package, diagnostics)),
        None => Err(LoadDiagnostic::new("No EPackage element found")),
    }
}

fn handle_element(
    e: &BytesStart<'_>,
    package: &mut Option<Package>,
    current: &mut Option<Classifier>,
    diagnostics: &mut Vec<LoadDiagnostic>,
) {
    match e.local_name().as_ref() {
        b"EPackage" => {
            let name = attr_value(e, b"name").unwrap_or_default();
            let ns_uri = attr_value(e, b"nsURI").unwrap_or_default();
            *package = Some(Package::new(name, ns_uri, PackageOrigin::Loaded));
        }
        b"eClassifiers" => {
            // commit anything still open from a malformed nesting
            commit_classifier(package, current);
            let Some(name) = attr_value(e, b"name") else {
                diagnostics.push(LoadDiagnostic::new("Classifier without a name"));
                return;
            };
            if !naming::is_identifier(&name) {
                diagnostics.push(LoadDiagnostic::new(format!(
                    "Classifier name '{name}' is not a valid identifier"
                )));
                return;
            }
            let kind = attr_value(e, b"type").map(strip_type_prefix).unwrap_or_default();
            *current = Some(match kind.as_str() {
                "EDataType" => Classifier::data_type(name),
                "EEnum" => Classifier::enumeration(name, Vec::new()),
                _ => {
                    let super_class = attr_value(e, b"eSuperTypes")
                        .map(|href| SmolStr::new(strip_local_ref(&href)));
                    Classifier {
                        name: SmolStr::new(name),
                        kind: ClassifierKind::Class {
                            super_class,
                            features: Vec::new(),
                        },
                    }
                }
            });
        }
        b"eStructuralFeatures" => {
            if let Some(name) = attr_value(e, b"name") {
                if let Some(Classifier {
                    kind: ClassifierKind::Class { features, .. },
                    ..
                }) = current
                {
                    features.push(SmolStr::new(name));
                }
            }
        }
        b"eLiterals" => {
            if let Some(name) = attr_value(e, b"name") {
                if let Some(Classifier {
                    kind: ClassifierKind::Enum { literals },
                    ..
                }) = current
                {
                    literals.push(SmolStr::new(name));
                }
            }
        }
        _ => {}
    }
}

fn commit_classifier(package: &mut Option<Package>, current: &mut Option<Classifier>) {
    if let (Some(package), Some(classifier)) = (package.as_mut(), current.take()) {
        package.classifiers.push(classifier);
    }
}

/// Look an attribute up by local name, ignoring any namespace prefix.
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            return attr.unescape_value().ok().map(|value| value.into_owned());
        }
    }
    None
}

/// `ecore:EClass` to `EClass`.
fn strip_type_prefix(value: String) -> String {
    match value.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => value,
    }
}

/// `#//Named` to `Named`.
fn strip_local_ref(href: &str) -> &str {
    href.trim_start_matches('#').trim_start_matches('/')
}
