//! Diagnostic collection and management

use codespan_reporting::diagnostic::Severity;
use std::fmt;

use crate::diagnostic::RuleDiagnostic;
use crate::error_codes::ErrorCode;
use crate::source_span::SourceSpan;

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<RuleDiagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: RuleDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, code: ErrorCode, message: impl Into<String>, span: SourceSpan) {
        self.add(RuleDiagnostic::new(code, Severity::Error, message, span));
    }

    pub fn add_warning(&mut self, code: ErrorCode, message: impl Into<String>, span: SourceSpan) {
        self.add(RuleDiagnostic::new(code, Severity::Warning, message, span));
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleDiagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// The first error-severity diagnostic, if any.
    pub fn first_error(&self) -> Option<&RuleDiagnostic> {
        self.diagnostics.iter().find(|d| d.severity == Severity::Error)
    }

    /// Merge another diagnostic collection into this one.
    pub fn merge(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Drop diagnostics past `len`; used to roll back a speculative parse.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&RuleDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = RuleDiagnostic;
    type IntoIter = std::vec::IntoIter<RuleDiagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl fmt::Display for DiagnosticCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
