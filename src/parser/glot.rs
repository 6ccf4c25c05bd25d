//! Parser and model builder for `.glot` grammar files.

use pest::Parser as _;
use pest::iterators::Pair;
use pest_derive::Parser;
use smol_str::SmolStr;

use crate::base::Span;
use crate::model::{
    AssignOp, Cardinality, EnumLiteral, Grammar, GrammarRef, GrammarRule, MetamodelDecl,
    MetamodelKind, RuleExpr, RuleKind, RuleRef,
};
use crate::parser::ParseIssue;

#[derive(Parser)]
#[grammar = "parser/glot.pest"]
pub struct GlotParser;

/// Parse a `.glot` source text into an unlinked [`Grammar`].
///
/// All cross-references (the `with` grammar, metamodel packages, rule
/// calls) come back unbound. The first syntax error aborts the parse.
pub fn parse_glot(source: &str) -> Result<Grammar, ParseIssue> {
    let mut pairs =
        GlotParser::parse(Rule::grammar_file, source).map_err(ParseIssue::from_pest)?;
    match pairs.next() {
        Some(file) => Ok(build_grammar(file)),
        None => Err(ParseIssue::new("empty parse result")),
    }
}

fn build_grammar(file: Pair<'_, Rule>) -> Grammar {
    let mut grammar = Grammar::new("");
    for item in file.into_inner() {
        match item.as_rule() {
            Rule::grammar_decl => build_grammar_decl(item, &mut grammar),
            Rule::metamodel_decl => {
                if let Some(decl) = item.into_inner().next().and_then(build_metamodel_decl) {
                    grammar.metamodels.push(decl);
                }
            }
            Rule::rule_def => {
                if let Some(rule) = item.into_inner().next().and_then(build_rule) {
                    grammar.rules.push(rule);
                }
            }
            Rule::EOI => {}
            _ => {}
        }
    }
    grammar
}

fn build_grammar_decl(decl: Pair<'_, Rule>, grammar: &mut Grammar) {
    for part in decl.into_inner() {
        match part.as_rule() {
            Rule::qualified_name => {
                grammar.name_span = Some(span_of(&part));
                grammar.name = SmolStr::new(part.as_str());
            }
            Rule::with_clause => {
                if let Some(name) = part
                    .into_inner()
                    .find(|inner| inner.as_rule() == Rule::qualified_name)
                {
                    grammar.used_grammar = Some(GrammarRef {
                        name: SmolStr::new(name.as_str()),
                        span: Some(span_of(&name)),
                        target: None,
                    });
                }
            }
            _ => {}
        }
    }
}

fn build_metamodel_decl(decl: Pair<'_, Rule>) -> Option<MetamodelDecl> {
    let span = span_of(&decl);
    match decl.as_rule() {
        Rule::import_decl => {
            let mut uri_token = None;
            let mut alias = None;
            for part in decl.into_inner() {
                match part.as_rule() {
                    Rule::string => uri_token = Some(SmolStr::new(part.as_str())),
                    Rule::alias_clause => {
                        alias = part
                            .into_inner()
                            .find(|inner| inner.as_rule() == Rule::ident)
                            .map(|i| SmolStr::new(i.as_str()));
                    }
                    _ => {}
                }
            }
            let token = uri_token?;
            Some(MetamodelDecl {
                alias,
                span: Some(span),
                source_text: Some(token.clone()),
                kind: MetamodelKind::Referenced {
                    ns_uri: SmolStr::new(strip_quotes(&token)),
                    package: None,
                },
            })
        }
        Rule::generate_decl => {
            let mut inner = decl.into_inner();
            let name = inner.find(|part| part.as_rule() == Rule::ident)?;
            let uri = inner.find(|part| part.as_rule() == Rule::string)?;
            Some(MetamodelDecl {
                alias: None,
                span: Some(span),
                source_text: Some(SmolStr::new(uri.as_str())),
                kind: MetamodelKind::Generated {
                    name: SmolStr::new(name.as_str()),
                    ns_uri: SmolStr::new(strip_quotes(uri.as_str())),
                    package: None,
                },
            })
        }
        _ => None,
    }
}

fn build_rule(rule: Pair<'_, Rule>) -> Option<GrammarRule> {
    match rule.as_rule() {
        Rule::parser_rule => {
            let mut inner = rule.into_inner();
            let name = inner.next()?;
            let body = inner.next().map(build_alternatives)?;
            Some(GrammarRule {
                name: SmolStr::new(name.as_str()),
                span: Some(span_of(&name)),
                kind: RuleKind::Parser { body },
            })
        }
        Rule::terminal_rule => {
            let mut inner = rule.into_inner();
            let name = inner.find(|part| part.as_rule() == Rule::ident)?;
            let body = inner
                .find(|part| part.as_rule() == Rule::alternatives)
                .map(build_alternatives)?;
            Some(GrammarRule {
                name: SmolStr::new(name.as_str()),
                span: Some(span_of(&name)),
                kind: RuleKind::Terminal { body },
            })
        }
        Rule::enum_rule => {
            let mut inner = rule.into_inner();
            let name = inner.find(|part| part.as_rule() == Rule::ident)?;
            let literals = inner.filter_map(build_enum_literal).collect();
            Some(GrammarRule {
                name: SmolStr::new(name.as_str()),
                span: Some(span_of(&name)),
                kind: RuleKind::Enum { literals },
            })
        }
        _ => None,
    }
}

fn build_enum_literal(literal: Pair<'_, Rule>) -> Option<EnumLiteral> {
    if literal.as_rule() != Rule::enum_literal {
        return None;
    }
    let mut inner = literal.into_inner();
    let name = inner.next()?;
    let text = inner.next().map(|l| SmolStr::new(strip_quotes(l.as_str())));
    Some(EnumLiteral {
        name: SmolStr::new(name.as_str()),
        literal: text,
    })
}

fn build_alternatives(alternatives: Pair<'_, Rule>) -> RuleExpr {
    let mut branches: Vec<RuleExpr> = alternatives.into_inner().map(build_sequence).collect();
    if branches.len() == 1 {
        branches.remove(0)
    } else {
        RuleExpr::Alternatives(branches)
    }
}

fn build_sequence(sequence: Pair<'_, Rule>) -> RuleExpr {
    let mut terms: Vec<RuleExpr> = sequence.into_inner().map(build_term).collect();
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        RuleExpr::Sequence(terms)
    }
}

fn build_term(term: Pair<'_, Rule>) -> RuleExpr {
    let mut expr = None;
    let mut cardinality = None;
    for part in term.into_inner() {
        match part.as_rule() {
            Rule::atom => expr = Some(build_atom(part)),
            Rule::cardinality => {
                cardinality = match part.as_str() {
                    "?" => Some(Cardinality::Optional),
                    "*" => Some(Cardinality::ZeroOrMore),
                    "+" => Some(Cardinality::OneOrMore),
                    _ => None,
                };
            }
            _ => {}
        }
    }
    let expr = expr.unwrap_or(RuleExpr::Sequence(Vec::new()));
    match cardinality {
        Some(cardinality) => RuleExpr::Repeat {
            expr: Box::new(expr),
            cardinality,
        },
        None => expr,
    }
}

fn build_atom(atom: Pair<'_, Rule>) -> RuleExpr {
    let Some(inner) = atom.into_inner().next() else {
        return RuleExpr::Sequence(Vec::new());
    };
    match inner.as_rule() {
        Rule::assignment => build_assignment(inner),
        Rule::char_range => build_char_range(inner),
        Rule::keyword_literal => RuleExpr::Keyword(SmolStr::new(strip_quotes(inner.as_str()))),
        Rule::group => {
            match inner.into_inner().next() {
                Some(alternatives) => build_alternatives(alternatives),
                None => RuleExpr::Sequence(Vec::new()),
            }
        }
        Rule::any_char => RuleExpr::AnyChar,
        Rule::rule_call => build_rule_call(inner),
        _ => RuleExpr::Sequence(Vec::new()),
    }
}

fn build_assignment(assignment: Pair<'_, Rule>) -> RuleExpr {
    let mut feature = SmolStr::default();
    let mut operator = AssignOp::Single;
    let mut value = RuleExpr::Sequence(Vec::new());
    for part in assignment.into_inner() {
        match part.as_rule() {
            Rule::ident => feature = SmolStr::new(part.as_str()),
            Rule::assign_op => {
                operator = match part.as_str() {
                    "+=" => AssignOp::Add,
                    "?=" => AssignOp::Bool,
                    _ => AssignOp::Single,
                };
            }
            Rule::assigned_value => {
                if let Some(inner) = part.into_inner().next() {
                    value = match inner.as_rule() {
                        Rule::keyword_literal => {
                            RuleExpr::Keyword(SmolStr::new(strip_quotes(inner.as_str())))
                        }
                        Rule::group => match inner.into_inner().next() {
                            Some(alternatives) => build_alternatives(alternatives),
                            None => RuleExpr::Sequence(Vec::new()),
                        },
                        Rule::rule_call => build_rule_call(inner),
                        _ => RuleExpr::Sequence(Vec::new()),
                    };
                }
            }
            _ => {}
        }
    }
    RuleExpr::Assignment {
        feature,
        operator,
        value: Box::new(value),
    }
}

fn build_char_range(range: Pair<'_, Rule>) -> RuleExpr {
    let mut chars = range
        .into_inner()
        .filter_map(|c| strip_quotes(c.as_str()).chars().next());
    let from = chars.next().unwrap_or('\u{0}');
    let to = chars.next().unwrap_or(from);
    RuleExpr::CharRange { from, to }
}

fn build_rule_call(call: Pair<'_, Rule>) -> RuleExpr {
    match call.into_inner().next() {
        Some(name) => RuleExpr::RuleCall(RuleRef {
            name: SmolStr::new(name.as_str()),
            span: Some(span_of(&name)),
            target: None,
        }),
        None => RuleExpr::Sequence(Vec::new()),
    }
}

fn span_of(pair: &Pair<'_, Rule>) -> Span {
    let span = pair.as_span();
    let (start_line, start_col) = span.start_pos().line_col();
    let (end_line, end_col) = span.end_pos().line_col();
    Span::from_coords(
        (start_line - 1) as u32,
        (start_col - 1) as u32,
        (end_line - 1) as u32,
        (end_col - 1) as u32,
    )
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI: &str = r#"
grammar org.example.Mini with org.example.Terminals

import "http://www.eclipse.org/emf/2002/Ecore" as ecore
generate mini "http://example.org/mini"

Model:
    'model' name=ID items+=Item* ;

Item:
    kind=Kind value=(ID | STRING) done?='done'? ;

enum Kind:
    Red='red' | Green ;

terminal ID:
    ('a'..'z' | '_')+ ;
"#;

    #[test]
    fn test_parse_full_grammar() {
        let grammar = parse_glot(MINI).unwrap();
        assert_eq!(grammar.name, "org.example.Mini");
        assert_eq!(
            grammar.used_grammar.as_ref().map(|u| u.name.as_str()),
            Some("org.example.Terminals")
        );
        assert_eq!(grammar.metamodels.len(), 2);
        assert_eq!(grammar.rules.len(), 4);
        assert!(grammar.rules[0].is_parser_rule());
        assert!(matches!(grammar.rules[2].kind, RuleKind::Enum { .. }));
        assert!(matches!(grammar.rules[3].kind, RuleKind::Terminal { .. }));
    }

    #[test]
    fn test_import_keeps_source_token() {
        let grammar = parse_glot(MINI).unwrap();
        let import = &grammar.metamodels[0];
        assert_eq!(import.alias.as_deref(), Some("ecore"));
        assert_eq!(
            import.source_text.as_deref(),
            Some("\"http://www.eclipse.org/emf/2002/Ecore\"")
        );
        assert_eq!(import.ns_uri(), "http://www.eclipse.org/emf/2002/Ecore");
    }

    #[test]
    fn test_generate_decl() {
        let grammar = parse_glot(MINI).unwrap();
        let generated = &grammar.metamodels[1];
        match &generated.kind {
            MetamodelKind::Generated { name, ns_uri, package } => {
                assert_eq!(name, "mini");
                assert_eq!(ns_uri, "http://example.org/mini");
                assert_eq!(*package, None);
            }
            other => panic!("expected generated metamodel, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_body_shapes() {
        let grammar = parse_glot(MINI).unwrap();
        let RuleKind::Parser { body } = &grammar.rules[0].kind else {
            panic!("expected parser rule");
        };
        let RuleExpr::Sequence(parts) = body else {
            panic!("expected sequence, got {body:?}");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], RuleExpr::Keyword("model".into()));
        assert!(matches!(
            &parts[1],
            RuleExpr::Assignment { feature, operator: AssignOp::Single, .. } if feature == "name"
        ));
        assert!(matches!(
            &parts[2],
            RuleExpr::Repeat { cardinality: Cardinality::ZeroOrMore, .. }
        ));
    }

    #[test]
    fn test_enum_rule_literals() {
        let grammar = parse_glot(MINI).unwrap();
        let RuleKind::Enum { literals } = &grammar.rules[2].kind else {
            panic!("expected enum rule");
        };
        assert_eq!(literals.len(), 2);
        assert_eq!(literals[0].name, "Red");
        assert_eq!(literals[0].literal.as_deref(), Some("red"));
        assert_eq!(literals[1].literal, None);
    }

    #[test]
    fn test_terminal_char_range() {
        let grammar = parse_glot(MINI).unwrap();
        let RuleKind::Terminal { body } = &grammar.rules[3].kind else {
            panic!("expected terminal rule");
        };
        let RuleExpr::Repeat { expr, cardinality } = body else {
            panic!("expected repeat, got {body:?}");
        };
        assert_eq!(*cardinality, Cardinality::OneOrMore);
        let RuleExpr::Alternatives(options) = expr.as_ref() else {
            panic!("expected alternatives");
        };
        assert_eq!(options[0], RuleExpr::CharRange { from: 'a', to: 'z' });
        assert_eq!(options[1], RuleExpr::Keyword("_".into()));
    }

    #[test]
    fn test_keywords_separated_from_names_by_whitespace() {
        // every header keyword followed by a space before its operand
        let grammar = parse_glot(
            "grammar org.a.B with org.a.Base\n\
             generate b \"http://a/b\"\n\
             Model: items+=Item* ;\n\
             Item: name=ID ;\n\
             enum Color: Red | Green ;\n\
             terminal ID: ('a'..'z')+ ;\n",
        )
        .unwrap();
        assert_eq!(grammar.name, "org.a.B");
        assert_eq!(grammar.rules[2].name, "Color");
        assert_eq!(grammar.rules[3].name, "ID");
    }

    #[test]
    fn test_keyword_prefixed_identifiers_are_not_keywords() {
        // "generated" starts with the generate keyword but is a rule name
        let grammar = parse_glot(
            "grammar org.example.Mini\n\
             generated: 'g' ;\n\
             Model: value=generated ;\n",
        )
        .unwrap();
        assert!(grammar.metamodels.is_empty());
        assert_eq!(grammar.rules[0].name, "generated");
        assert_eq!(grammar.rules[1].name, "Model");
    }

    #[test]
    fn test_parse_error_has_position() {
        let error = parse_glot("grammar org.example.Broken\nModel 'x' ;\n").unwrap_err();
        let span = error.span.unwrap();
        assert_eq!(span.start.line, 1);
        assert!(!error.message.is_empty());
    }

    #[test]
    fn test_rule_call_spans_are_recorded() {
        let grammar = parse_glot("grammar a.B Model: name=ID ;").unwrap();
        let RuleKind::Parser { body } = &grammar.rules[0].kind else {
            panic!("expected parser rule");
        };
        let RuleExpr::Assignment { value, .. } = body else {
            panic!("expected assignment, got {body:?}");
        };
        let RuleExpr::RuleCall(call) = value.as_ref() else {
            panic!("expected rule call");
        };
        assert_eq!(call.name, "ID");
        assert!(call.span.is_some());
        assert_eq!(call.target, None);
    }
}
