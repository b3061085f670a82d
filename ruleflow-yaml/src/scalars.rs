//! YAML scalar bridging: literals and canonical DSL fragments

use bigdecimal::BigDecimal;
use ruleflow_ast::LiteralValue;
use serde_yaml::Value;
use std::str::FromStr;

/// Convert a YAML value to an AST literal. Strings become string literals;
/// used for metadata, constant defaults and assignment shorthands.
pub fn yaml_to_literal(value: &Value) -> Option<LiteralValue> {
    match value {
        Value::Null => Some(LiteralValue::Null),
        Value::Bool(b) => Some(LiteralValue::Boolean(*b)),
        Value::Number(n) => {
            BigDecimal::from_str(&n.to_string()).ok().map(LiteralValue::Number)
        }
        Value::String(s) => Some(LiteralValue::String(s.clone())),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(yaml_to_literal(item)?);
            }
            Some(LiteralValue::List(out))
        }
        Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Render a YAML value as a DSL expression fragment for the canonical-string
/// rewrite. Strings are inserted verbatim, so `creditScore` stays a variable
/// reference and `'"PRIME"'` stays a string literal.
pub fn yaml_to_dsl_fragment(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(yaml_to_dsl_fragment(item)?);
            }
            Some(format!("[{}]", parts.join(", ")))
        }
        Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// A scalar-or-list YAML value as one `; `-joined action body, the inverse
/// of the YAML folded loop form.
pub fn join_action_body(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(value_as_string(item)?);
            }
            Some(parts.join("; "))
        }
        _ => None,
    }
}

pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
