//! Ruleflow YAML Adapter
//!
//! Assembles a whole-rule AST from a structured YAML document. Documents mix
//! simple string forms (`when: creditScore at_least 650`) with structured
//! forms (`{set: {variable: tier, value: '"PRIME"'}}`); every structured
//! action is rewritten to its canonical string and re-parsed so the crate's
//! recursive-descent parser stays the one authoritative syntax path.
//!
//! Body precedence when several shapes are present:
//! `rules` (multi-rule) > `conditions` (complex) > `when`/`then`/`else`
//! (simple) > bare `then` (unconditional).

use ruleflow_ast::{Rule, RuleBody};
use ruleflow_diagnostics::{DiagnosticCollection, ErrorCode, RuleDiagnostic, SourceMap, SourceSpan};
use serde_yaml::Value;

mod assemble;
mod scalars;

#[cfg(test)]
mod tests;

use assemble::Assembler;

/// Parse a YAML rule document into a [`Rule`].
///
/// Embedded DSL strings are registered in `sources` under their section
/// path (`when[0]`, `rules[1].then[2]`) so diagnostics render against the
/// exact fragment that failed.
pub fn parse_rule_str(text: &str, sources: &mut SourceMap) -> Result<Rule, DiagnosticCollection> {
    let doc_file = sources.add("rule", text);
    let value: Value = match serde_yaml::from_str(text) {
        Ok(value) => value,
        Err(error) => {
            let mut diagnostics = DiagnosticCollection::new();
            let span = error
                .location()
                .map(|loc| {
                    let offset = loc.index() as u32;
                    SourceSpan::new(doc_file, offset, offset)
                })
                .unwrap_or_else(|| SourceSpan::empty(doc_file));
            diagnostics.add(RuleDiagnostic::error(
                ErrorCode::ParseInvalidDocument,
                format!("not a valid YAML document: {}", error),
                span,
            ));
            return Err(diagnostics);
        }
    };
    parse_rule_value(&value, sources, doc_file)
}

/// Parse an already-deserialized YAML value into a [`Rule`].
pub fn parse_rule_value(
    value: &Value,
    sources: &mut SourceMap,
    doc_file: u32,
) -> Result<Rule, DiagnosticCollection> {
    let mut assembler = Assembler::new(sources, doc_file);
    let rule = assembler.assemble_rule(value);
    let diagnostics = assembler.into_diagnostics();
    match rule {
        Some(rule) if !diagnostics.has_errors() => Ok(rule),
        _ => Err(diagnostics),
    }
}

/// The shape discriminator of an assembled body.
pub fn body_kind(body: &RuleBody) -> &'static str {
    match body {
        RuleBody::Simple { .. } => "simple",
        RuleBody::Multi { .. } => "multi",
        RuleBody::Complex(_) => "complex",
        RuleBody::ThenOnly { .. } => "then-only",
    }
}
