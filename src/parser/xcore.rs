//! Parser and model builder for `.xcore` textual metamodel files.

use pest::Parser as _;
use pest::iterators::Pair;
use smol_str::SmolStr;

use pest_derive::Parser;

use crate::model::{Classifier, ClassifierKind, Package, PackageOrigin};
use crate::parser::ParseIssue;

#[derive(Parser)]
#[grammar = "parser/xcore.pest"]
pub struct XcoreParser;

/// Parse an `.xcore` source text into a [`Package`] with origin
/// [`PackageOrigin::Loaded`]. The first syntax error aborts the parse.
pub fn parse_xcore(source: &str) -> Result<Package, ParseIssue> {
    let mut pairs = XcoreParser::parse(Rule::xcore_file, source).map_err(ParseIssue::from_pest)?;
    match pairs.next() {
        Some(file) => Ok(build_package(file)),
        None => Err(ParseIssue::new("empty parse result")),
    }
}

fn build_package(file: Pair<'_, Rule>) -> Package {
    let mut package = Package::new("", "", PackageOrigin::Loaded);
    for item in file.into_inner() {
        match item.as_rule() {
            Rule::package_decl => {
                for part in item.into_inner() {
                    match part.as_rule() {
                        Rule::qualified_name => package.name = SmolStr::new(part.as_str()),
                        Rule::string => {
                            package.ns_uri = SmolStr::new(strip_quotes(part.as_str()));
                        }
                        _ => {}
                    }
                }
            }
            Rule::classifier => {
                if let Some(classifier) = item.into_inner().next().and_then(build_classifier) {
                    package.classifiers.push(classifier);
                }
            }
            Rule::EOI => {}
            _ => {}
        }
    }
    package
}

fn build_classifier(def: Pair<'_, Rule>) -> Option<Classifier> {
    match def.as_rule() {
        Rule::class_def => {
            let mut name = None;
            let mut super_class = None;
            let mut features = Vec::new();
            for part in def.into_inner() {
                match part.as_rule() {
                    Rule::ident => name = Some(SmolStr::new(part.as_str())),
                    Rule::extends_clause => {
                        super_class = part
                            .into_inner()
                            .find(|inner| inner.as_rule() == Rule::ident)
                            .map(|i| SmolStr::new(i.as_str()));
                    }
                    Rule::class_body => {
                        for feature in part.into_inner() {
                            // feature name is the second ident, after the type
                            if let Some(named) = feature
                                .into_inner()
                                .filter(|inner| inner.as_rule() == Rule::ident)
                                .nth(1)
                            {
                                features.push(SmolStr::new(named.as_str()));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Some(Classifier {
                name: name?,
                kind: ClassifierKind::Class {
                    super_class,
                    features,
                },
            })
        }
        Rule::datatype_def => def
            .into_inner()
            .find(|inner| inner.as_rule() == Rule::ident)
            .map(|name| Classifier::data_type(SmolStr::new(name.as_str()))),
        Rule::enum_def => {
            let mut inner = def.into_inner();
            let name = inner.find(|part| part.as_rule() == Rule::ident)?;
            let literals = inner
                .filter(|part| part.as_rule() == Rule::ident)
                .map(|l| SmolStr::new(l.as_str()))
                .collect();
            Some(Classifier::enumeration(SmolStr::new(name.as_str()), literals))
        }
        _ => None,
    }
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
