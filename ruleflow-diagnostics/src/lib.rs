//! Ruleflow Diagnostics System
//!
//! Provides unified error reporting with stable error codes, source spans,
//! and suggestions for the whole rule pipeline.

pub mod collection;
pub mod diagnostic;
pub mod error_codes;
pub mod source_map;
pub mod source_span;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use collection::DiagnosticCollection;
pub use diagnostic::{RuleDiagnostic, Suggestion};
pub use error_codes::ErrorCode;
pub use source_map::SourceMap;
pub use source_span::SourceSpan;

// The reporting severity is part of the public diagnostic surface.
pub use codespan_reporting::diagnostic::Severity;
