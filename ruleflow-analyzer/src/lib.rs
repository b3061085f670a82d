//! Ruleflow Analyzer
//!
//! Static validation of rule documents, independent of evaluation. Six
//! rule implementations (syntax, naming, dependencies, logic, performance,
//! best practices) run over the raw text and the assembled AST and produce
//! a structured report with stable issue codes, severities, suggestions,
//! section-path locations, an overall status and a quality score.

pub mod context;
pub mod pipeline;
pub mod report;
pub mod rules;

#[cfg(test)]
mod tests;

pub use context::ValidationContext;
pub use pipeline::ValidationPipeline;
pub use report::{
    IssueSeverity, RuleCategory, ValidationIssue, ValidationReport, ValidationStatus,
};
pub use rules::ValidationRule;

/// Validate one rule document with the default pipeline.
pub fn validate_rule(text: &str) -> ValidationReport {
    ValidationPipeline::new().validate(text)
}
