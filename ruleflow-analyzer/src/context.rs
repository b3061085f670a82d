//! Shared state handed to every validation rule

use regex::Regex;
use ruleflow_ast::Rule;
use ruleflow_diagnostics::{DiagnosticCollection, SourceMap};

/// What one validation run knows: the raw document text, the assembled rule
/// (when assembly succeeded), the front-end diagnostics with their source
/// registry, and the naming patterns in force.
pub struct ValidationContext<'a> {
    pub text: &'a str,
    pub rule: Option<&'a Rule>,
    pub parse_diagnostics: &'a DiagnosticCollection,
    pub sources: &'a SourceMap,
    pub input_pattern: &'a Regex,
    pub computed_pattern: &'a Regex,
    pub constant_pattern: &'a Regex,
}
