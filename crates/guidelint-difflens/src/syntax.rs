//! Startup check that the bundled tree-sitter grammars load.
//!
//! Context enrichment is only enabled when every grammar for the reviewed
//! languages can be installed into a parser. The check runs once and its
//! result is passed down explicitly.

use guidelint_core::{GuidelintError, Language};
use tracing::{debug, warn};
use tree_sitter::Parser;

/// Tree-sitter grammar for a reviewed language.
pub fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE.into(),
    }
}

/// Result of probing the grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxSupport {
    available: bool,
}

impl SyntaxSupport {
    /// Load the TypeScript, TSX and JavaScript grammars into a parser.
    ///
    /// A failure is logged and reported as unavailable rather than returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use guidelint_difflens::syntax::SyntaxSupport;
    ///
    /// assert!(SyntaxSupport::probe().is_available());
    /// ```
    pub fn probe() -> Self {
        match load_grammars() {
            Ok(()) => {
                debug!("tree-sitter grammars loaded");
                Self { available: true }
            }
            Err(e) => {
                warn!("context enrichment disabled: {e}");
                Self { available: false }
            }
        }
    }

    /// Support that was never probed, e.g. when enrichment is switched off.
    pub fn disabled() -> Self {
        Self { available: false }
    }

    pub fn is_available(self) -> bool {
        self.available
    }

    /// Whether enrichment should run, given the user's setting.
    pub fn enrichment_enabled(self, requested: bool) -> bool {
        requested && self.available
    }
}

fn load_grammars() -> Result<(), GuidelintError> {
    let mut parser = Parser::new();
    for language in [Language::TypeScript, Language::Tsx, Language::JavaScript] {
        parser
            .set_language(&grammar(language))
            .map_err(|e| GuidelintError::Parse(format!("failed to load {language} grammar: {e}")))?;
    }
    Ok(())
}
