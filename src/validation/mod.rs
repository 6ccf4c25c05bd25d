//! Grammar validation.
//!
//! Validators walk a grammar and every contained element in declaration
//! order and feed findings into a [`DiagnosticChain`]. The chain collects
//! warnings and infos but aborts on the first error, so a failed grammar
//! reports exactly one error, the first in document order. Loading turns
//! that abort into a fatal language error.

pub mod rules;

pub use rules::standard_validators;

use crate::base::{GrammarId, Span};
use crate::model::{GrammarElement, ModelStore};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a validation finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A validation finding.
#[derive(Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Diagnostic code (e.g. "E0001").
    pub code: Option<&'static str>,
    pub message: String,
    pub span: Option<Span>,
    /// Underlying cause, carried into the language error on abort.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            span: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: impl Into<Option<Span>>) -> Self {
        self.span = span.into();
        self
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Raised by the chain when an error-severity finding arrives.
#[derive(Debug)]
pub struct ValidationAbort {
    pub diagnostic: Diagnostic,
}

impl std::fmt::Display for ValidationAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostic.message)
    }
}

impl std::error::Error for ValidationAbort {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.diagnostic
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Collects findings, aborting on the first error.
#[derive(Debug, Default)]
pub struct DiagnosticChain {
    collected: Vec<Diagnostic>,
}

impl DiagnosticChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding. Errors abort immediately and are not collected;
    /// everything else accumulates.
    pub fn add(&mut self, diagnostic: Diagnostic) -> Result<(), ValidationAbort> {
        if diagnostic.severity == Severity::Error {
            return Err(ValidationAbort { diagnostic });
        }
        self.collected.push(diagnostic);
        Ok(())
    }

    pub fn collected(&self) -> &[Diagnostic] {
        &self.collected
    }

    pub fn into_collected(self) -> Vec<Diagnostic> {
        self.collected
    }
}

// ============================================================================
// VALIDATORS
// ============================================================================

/// Read-only model context handed to validators.
pub struct ValidationContext<'a> {
    pub store: &'a ModelStore,
    pub grammar: GrammarId,
}

/// One validation rule, invoked for the grammar and each contained element.
pub trait GrammarValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(
        &self,
        element: GrammarElement<'_>,
        ctx: &ValidationContext<'_>,
        chain: &mut DiagnosticChain,
    ) -> Result<(), ValidationAbort>;
}

/// Run `validators` over the grammar and all its elements in declaration
/// order. The first error-severity finding aborts the walk.
pub fn run_validators(
    store: &ModelStore,
    grammar: GrammarId,
    validators: &[Box<dyn GrammarValidator>],
    chain: &mut DiagnosticChain,
) -> Result<(), ValidationAbort> {
    let ctx = ValidationContext { store, grammar };
    store.grammar(grammar).visit(&mut |element| {
        for validator in validators {
            validator.check(element, &ctx, chain)?;
        }
        Ok(())
    })
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for grammar validation.
///
/// - **E0001-E0099**: errors (abort the language setup)
/// - **W0001-W0099**: warnings (logged, setup continues)
pub mod codes {
    /// Two rules share a name.
    pub const DUPLICATE_RULE: &str = "E0001";
    /// The first rule is not a parser rule.
    pub const FIRST_RULE_NOT_PARSER: &str = "E0002";
    /// Two metamodel declarations share an alias.
    pub const DUPLICATE_ALIAS: &str = "E0003";
    /// A `generate` declaration collides with an existing package.
    pub const GENERATED_PACKAGE_CONFLICT: &str = "E0004";
    /// Grammar name has no package part.
    pub const UNQUALIFIED_GRAMMAR_NAME: &str = "W0001";
}
