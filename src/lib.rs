//! Ruleflow
//!
//! A YAML-embedded business-rule DSL: authors write English-like conditions
//! and actions (`creditScore at_least 650`, `set tier to "PRIME"`), the
//! engine evaluates them against an input record with decimal arithmetic, a
//! circuit breaker and a bounded loop budget, and a static validator
//! reports on rule quality before anything runs.
//!
//! This crate re-exports the public surface of the member crates:
//!
//! - [`RuleEngine`] — parse, evaluate (blocking and deferred), validate
//! - [`Rule`] and the AST families in [`ast`]
//! - [`ValidationReport`] — the six-category static analysis report
//! - the collaborator traits for constants, rule definitions, HTTP, time
//!   and encryption

pub use ruleflow_ast as ast;
pub use ruleflow_cache as cache;
pub use ruleflow_diagnostics as diagnostics;

pub use ruleflow_analyzer::{
    validate_rule, IssueSeverity, RuleCategory, ValidationIssue, ValidationReport,
    ValidationStatus,
};
pub use ruleflow_ast::Rule;
pub use ruleflow_cache::{cache_key, AstCache, CacheStatsSnapshot, LocalAstCache};
pub use ruleflow_diagnostics::{DiagnosticCollection, ErrorCode, SourceMap};
pub use ruleflow_engine::{
    json_inputs, Base64SecurityProvider, CacheProvider, CancellationToken, Clock, ConstantStore,
    EngineConfig, EngineError, EvalEvent, EvaluationOptions, EvaluationResult, EventSeverity,
    FixedClock, HttpClient, InMemoryConstantStore, InMemoryRuleStore, RuleDefinitionStore,
    RuleEngine, SecurityProvider, SystemClock, Value,
};
pub use ruleflow_parser::{parse_action, parse_actions, parse_condition, parse_expression};
pub use ruleflow_yaml::parse_rule_str;
