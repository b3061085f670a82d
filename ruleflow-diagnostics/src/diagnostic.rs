//! Diagnostic representation and reporting

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use std::fmt;

use crate::error_codes::ErrorCode;
use crate::source_span::SourceSpan;

/// A concrete fix the author could apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    pub message: String,
    pub replacement: String,
    pub span: SourceSpan,
}

impl Suggestion {
    pub fn new(message: impl Into<String>, replacement: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            replacement: replacement.into(),
            span,
        }
    }
}

/// A diagnostic produced anywhere in the rule pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleDiagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub primary_span: SourceSpan,
    pub secondary_spans: Vec<SourceSpan>,
    pub suggestions: Vec<Suggestion>,
    pub notes: Vec<String>,
}

impl RuleDiagnostic {
    pub fn new(
        code: ErrorCode,
        severity: Severity,
        message: impl Into<String>,
        primary_span: SourceSpan,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            primary_span,
            secondary_spans: Vec::new(),
            suggestions: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self::new(code, Severity::Error, message, span)
    }

    pub fn warning(code: ErrorCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self::new(code, Severity::Warning, message, span)
    }

    pub fn with_secondary_span(mut self, span: SourceSpan) -> Self {
        self.secondary_spans.push(span);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan diagnostic for terminal rendering.
    pub fn to_codespan_diagnostic(&self) -> Diagnostic<u32> {
        let mut labels = vec![Label::primary(
            self.primary_span.file_id,
            self.primary_span.start()..self.primary_span.end(),
        )];
        for span in &self.secondary_spans {
            labels.push(Label::secondary(span.file_id, span.start()..span.end()));
        }

        let mut notes = Vec::new();
        for suggestion in &self.suggestions {
            notes.push(format!("suggestion: {}", suggestion.message));
        }
        notes.extend(self.notes.iter().cloned());

        Diagnostic::new(self.severity)
            .with_code(self.code.as_str())
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(notes)
    }
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for RuleDiagnostic {}
