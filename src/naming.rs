//! Naming conventions derived from a grammar's qualified name.
//!
//! All names the generator derives (bundle activators, module classes,
//! default file extensions) funnel through [`GrammarNaming`] so every
//! consumer agrees on them. Identifier checks follow Unicode Standard
//! Annex #31, the same rules the grammar lexer applies.

use smol_str::SmolStr;

/// Check if `text` is a valid identifier.
#[inline]
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if unicode_ident::is_xid_start(first) || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| unicode_ident::is_xid_continue(c) || c == '_')
}

/// Check if `text` is a non-empty dot-separated chain of identifiers.
pub fn is_qualified_name(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}

/// Derives the names of generated artifacts from one grammar name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarNaming {
    name: SmolStr,
}

impl GrammarNaming {
    pub fn new(grammar_name: impl Into<SmolStr>) -> Self {
        Self {
            name: grammar_name.into(),
        }
    }

    /// The full qualified grammar name.
    pub fn grammar_name(&self) -> &str {
        &self.name
    }

    /// The part after the last `.`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The part before the last `.`, empty for unqualified names.
    pub fn base_package(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((base, _)) => base,
            None => "",
        }
    }

    /// Base package of editor-facing artifacts.
    pub fn ui_base_package(&self) -> String {
        qualify(self.base_package(), "ui")
    }

    /// Lowercased simple name, used when no file extension is configured.
    pub fn default_file_extension(&self) -> SmolStr {
        SmolStr::new(self.simple_name().to_lowercase())
    }

    pub fn runtime_module(&self) -> String {
        qualify(
            self.base_package(),
            &format!("{}RuntimeModule", self.simple_name()),
        )
    }

    pub fn runtime_setup(&self) -> String {
        qualify(
            self.base_package(),
            &format!("{}StandaloneSetup", self.simple_name()),
        )
    }

    pub fn ide_module(&self) -> String {
        qualify(
            &qualify(self.base_package(), "ide"),
            &format!("{}IdeModule", self.simple_name()),
        )
    }

    /// Activator type of the editor plugin bundle.
    pub fn plugin_activator(&self) -> String {
        qualify(
            &qualify(&self.ui_base_package(), "internal"),
            &format!("{}Activator", self.simple_name()),
        )
    }
}

fn qualify(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}.{name}")
    }
}
