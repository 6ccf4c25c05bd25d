//! Pest-based parsers for the textual formats.
//!
//! Two grammars live here, each in its own submodule so their generated
//! `Rule` enums stay apart:
//! - [`glot`] parses `.glot` grammar definition files
//! - [`xcore`] parses `.xcore` textual metamodel files
//!
//! Parsers produce model values with all cross-references unbound; binding
//! happens later in the loader's resolution pass. Parse failures surface as
//! [`ParseIssue`] values carrying a position and a single-line message.

pub mod glot;
pub mod xcore;

pub use glot::{GlotParser, parse_glot};
pub use xcore::{XcoreParser, parse_xcore};

use crate::base::Span;

/// A parse failure with an optional source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub(crate) fn from_pest<R: pest::RuleType>(error: pest::error::Error<R>) -> Self {
        let (line, col) = match error.line_col {
            pest::error::LineColLocation::Pos((line, col)) => (line, col),
            pest::error::LineColLocation::Span((line, col), _) => (line, col),
        };
        Self {
            message: error.variant.message().into_owned(),
            span: Some(Span::point(
                line.saturating_sub(1) as u32,
                col.saturating_sub(1) as u32,
            )),
        }
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {}", span.start, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
