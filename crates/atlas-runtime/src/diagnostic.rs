//! Diagnostic system for lex/parse/compile-time errors
//!
//! All compile-time problems flow through this single `Diagnostic` type so
//! the CLI has one formatting path regardless of which phase produced them.
//! Line/column are resolved lazily from a `Span` plus the original source
//! text rather than stored redundantly on every diagnostic.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A single lex, parse, or compile-time diagnostic.
///
/// The compiler never stops at the first error: it accumulates a `Vec` of
/// these across a whole module compile and surfaces them together at the
/// CLI boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render as `file:line:col: error[CODE]: message`, the same shape the
    /// CLI prints and `rustc`-adjacent tools favor.
    pub fn render(&self, file: &str, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        let mut out = format!(
            "{file}:{line}:{col}: {}[{}]: {}",
            self.level, self.code, self.message
        );
        for note in &self.notes {
            out.push_str(&format!("\n  note: {note}"));
        }
        out
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub mod error_codes {
    //! Stable diagnostic codes, grouped by phase.
    pub const LEX_UNEXPECTED_CHAR: &str = "AT1001";
    pub const LEX_UNTERMINATED: &str = "AT1002";

    pub const PARSE_UNEXPECTED_TOKEN: &str = "AT2001";
    pub const PARSE_EXPECTED_TYPE: &str = "AT2002";

    pub const UNDEFINED_NAME: &str = "AT3001";
    pub const REDECLARATION: &str = "AT3002";
    pub const TYPE_MISMATCH: &str = "AT3003";
    pub const ASSIGN_TO_CONST: &str = "AT3004";
    pub const ILLEGAL_OPERATOR: &str = "AT3005";
    pub const MISSING_TYPE_ANNOTATION: &str = "AT3006";
    pub const CONST_WITHOUT_VALUE: &str = "AT3007";
    pub const ARITY_MISMATCH: &str = "AT3008";
    pub const NON_BOOL_CONDITION: &str = "AT3009";
    pub const NOT_CALLABLE: &str = "AT3010";
    pub const HETEROGENEOUS_ARRAY: &str = "AT3011";
    pub const NON_INT_INDEX: &str = "AT3012";
}

/// Sort diagnostics by source position so multi-error output reads in
/// program order rather than discovery order.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_code_and_position() {
        let d = Diagnostic::error(error_codes::UNDEFINED_NAME, "variable x not found", Span::new(4, 5));
        let rendered = d.render("main.atl", "var x");
        assert!(rendered.contains("AT3001"));
        assert!(rendered.contains("variable x not found"));
    }
}
