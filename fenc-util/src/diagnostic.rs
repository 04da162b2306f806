//! Diagnostic reporting.
//!
//! Mirrors the text protocol compile errors are reported with:
//!
//! ```text
//! [line L] Error[ at 'LEXEME'|at end]: MESSAGE
//! ```
//!
//! The [`Handler`] tracks panic-mode/had-error state the same way the
//! reference compiler's `Parser` does: once an error has been reported, the handler enters panic
//! mode and suppresses further messages until [`Handler::resynchronize`]
//! is called at a statement boundary.

use crate::span::Span;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
        }
    }
}

/// Where, textually, a diagnostic points: a specific lexeme, end of
/// input, or nothing (for lexer errors, which carry their own message
/// and no useful lexeme to quote).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locus {
    Lexeme(String),
    End,
    None,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub span: Span,
    pub locus: Locus,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}", self.span.line, self.level)?;
        match &self.locus {
            Locus::Lexeme(text) => write!(f, " at '{}'", text)?,
            Locus::End => write!(f, " at end")?,
            Locus::None => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Collects compile diagnostics and tracks panic-mode recovery state.
///
/// A single `Handler` is shared by the scanner and compiler for the
/// lifetime of one `interpret` call.
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
    panic_mode: bool,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic unless already in panic mode — once one error
    /// has been reported, further reports are suppressed until
    /// [`Handler::resynchronize`] runs at the next statement boundary.
    pub fn report(&mut self, level: Level, span: Span, locus: Locus, message: impl Into<String>) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.diagnostics.push(Diagnostic {
            level,
            span,
            locus,
            message: message.into(),
        });
    }

    pub fn resynchronize(&mut self) {
        self.panic_mode = false;
    }

    pub fn is_panicking(&self) -> bool {
        self.panic_mode
    }

    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Emit every collected diagnostic to stderr, one per line.
    pub fn emit_to_stderr(&self) {
        for diag in &self.diagnostics {
            eprintln!("{}", diag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lexeme_locus() {
        let diag = Diagnostic {
            level: Level::Error,
            span: Span::new(0, 1, 3),
            locus: Locus::Lexeme("+".to_string()),
            message: "Expect expression.".to_string(),
        };
        assert_eq!(diag.to_string(), "[line 3] Error at '+': Expect expression.");
    }

    #[test]
    fn formats_end_locus() {
        let diag = Diagnostic {
            level: Level::Error,
            span: Span::new(0, 0, 10),
            locus: Locus::End,
            message: "Unexpected end of input.".to_string(),
        };
        assert_eq!(diag.to_string(), "[line 10] Error at end: Unexpected end of input.");
    }

    #[test]
    fn panic_mode_suppresses_followup_errors() {
        let mut handler = Handler::new();
        handler.report(Level::Error, Span::at_line(1), Locus::None, "first");
        handler.report(Level::Error, Span::at_line(2), Locus::None, "second");
        assert_eq!(handler.diagnostics().len(), 1);
        handler.resynchronize();
        handler.report(Level::Error, Span::at_line(3), Locus::None, "third");
        assert_eq!(handler.diagnostics().len(), 2);
    }
}
