//! Structured diagnostic messages with severity and codes.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Diagnostics are the primary mechanism for reporting progress, warnings,
/// and errors to the user. Floorplan diagnostics carry no source locations;
/// each consists of a severity, a stage-prefixed code, a message, and
/// optional explanatory notes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new report diagnostic with the given code and message.
    pub fn report(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Report,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Renders the diagnostic as a terminal line, plus one line per note.
    ///
    /// Produces output like:
    /// ```text
    /// error[P102]: placement exceeds outline 1020.0x980.0 > 1000.0x1000.0
    ///   = note: best of 10 workers after 2 restarts
    /// ```
    pub fn render(&self) -> String {
        let mut out = format!("{}[{}]: {}", self.severity, self.code, self.message);
        for note in &self.notes {
            out.push_str(&format!("\n  = note: {note}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn error_constructor() {
        let d = Diagnostic::error(DiagnosticCode::new(Category::Input, 101), "bad line");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "bad line");
        assert!(d.notes.is_empty());
    }

    #[test]
    fn warning_constructor() {
        let d = Diagnostic::warning(DiagnosticCode::new(Category::Shape, 201), "tight fit");
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn report_constructor() {
        let d = Diagnostic::report(DiagnosticCode::new(Category::Placement, 301), "done");
        assert_eq!(d.severity, Severity::Report);
    }

    #[test]
    fn render_plain() {
        let d = Diagnostic::error(DiagnosticCode::new(Category::Placement, 102), "no fit");
        assert_eq!(d.render(), "error[P102]: no fit");
    }

    #[test]
    fn render_with_notes() {
        let d = Diagnostic::warning(DiagnosticCode::new(Category::Alignment, 202), "skipped")
            .with_note("cluster has no macros");
        let rendered = d.render();
        assert!(rendered.starts_with("warning[A202]: skipped"));
        assert!(rendered.contains("= note: cluster has no macros"));
    }

    #[test]
    fn serde_roundtrip() {
        let d = Diagnostic::report(DiagnosticCode::new(Category::Shape, 203), "tiled")
            .with_note("3 footprints");
        let json = serde_json::to_string(&d).unwrap();
        let restored: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.message, "tiled");
        assert_eq!(restored.notes.len(), 1);
    }
}
