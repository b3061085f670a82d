//! Validation pipeline orchestrator

use once_cell::sync::Lazy;
use regex::Regex;
use ruleflow_diagnostics::{DiagnosticCollection, SourceMap};

use crate::context::ValidationContext;
use crate::report::ValidationReport;
use crate::rules::{
    BestPracticesRule, DependencyRule, LogicRule, NamingRule, PerformanceRule, SyntaxRule,
    ValidationRule,
};

static INPUT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z][a-zA-Z0-9]*$").unwrap());
static COMPUTED_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z][a-z0-9_]*$").unwrap());
static CONSTANT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z][A-Z0-9_]*$").unwrap());

/// Runs every validation rule over one document and aggregates the report.
pub struct ValidationPipeline {
    rules: Vec<Box<dyn ValidationRule>>,
    input_pattern: Regex,
    computed_pattern: Regex,
    constant_pattern: Regex,
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SyntaxRule),
                Box::new(NamingRule),
                Box::new(DependencyRule),
                Box::new(LogicRule),
                Box::new(PerformanceRule),
                Box::new(BestPracticesRule),
            ],
            input_pattern: INPUT_PATTERN.clone(),
            computed_pattern: COMPUTED_PATTERN.clone(),
            constant_pattern: CONSTANT_PATTERN.clone(),
        }
    }

    /// Override the naming patterns, matching an engine configuration.
    pub fn with_patterns(mut self, input: Regex, computed: Regex, constant: Regex) -> Self {
        self.input_pattern = input;
        self.computed_pattern = computed;
        self.constant_pattern = constant;
        self
    }

    pub fn validate(&self, text: &str) -> ValidationReport {
        let mut sources = SourceMap::new();
        let (rule, diagnostics) = match ruleflow_yaml::parse_rule_str(text, &mut sources) {
            Ok(rule) => (Some(rule), DiagnosticCollection::new()),
            Err(diagnostics) => (None, diagnostics),
        };

        let ctx = ValidationContext {
            text,
            rule: rule.as_ref(),
            parse_diagnostics: &diagnostics,
            sources: &sources,
            input_pattern: &self.input_pattern,
            computed_pattern: &self.computed_pattern,
            constant_pattern: &self.constant_pattern,
        };

        let mut issues = Vec::new();
        for rule in &self.rules {
            issues.extend(rule.analyze(&ctx));
        }
        ValidationReport::new(issues)
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new()
    }
}
