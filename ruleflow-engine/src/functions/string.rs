//! String group

use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::{number_arg, string_arg};

pub fn length(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let length = match args.first() {
        Some(Value::List(items)) => items.len(),
        Some(Value::Map(entries)) => entries.len(),
        Some(Value::Null) | None => 0,
        Some(other) => other.as_display_string().chars().count(),
    };
    Ok(Value::from(length as i64))
}

/// `substring(text, start, end?)` with character indexes; `end` defaults to
/// the end of the string. Out-of-range indexes clamp.
pub fn substring(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "substring")?;
    let chars: Vec<char> = text.chars().collect();
    let start = index_arg(args, 1, "substring")?.min(chars.len());
    let end = match args.get(2) {
        Some(_) => index_arg(args, 2, "substring")?.min(chars.len()),
        None => chars.len(),
    };
    if start >= end {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn index_arg(args: &[Value], index: usize, function: &str) -> Result<usize, EngineError> {
    let n = number_arg(args, index, function)?;
    bigdecimal::ToPrimitive::to_i64(&n)
        .filter(|i| *i >= 0)
        .map(|i| i as usize)
        .ok_or_else(|| {
            EngineError::Type(format!(
                "{} index argument {} must be a non-negative integer",
                function,
                index + 1
            ))
        })
}

pub fn upper(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(string_arg(args, 0, "upper")?.to_uppercase()))
}

pub fn lower(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(string_arg(args, 0, "lower")?.to_lowercase()))
}

pub fn trim(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(string_arg(args, 0, "trim")?.trim().to_string()))
}

pub fn contains(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let haystack = string_arg(args, 0, "contains")?;
    let needle = string_arg(args, 1, "contains")?;
    Ok(Value::Boolean(haystack.contains(&needle)))
}

pub fn starts_with(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "starts_with")?;
    let prefix = string_arg(args, 1, "starts_with")?;
    Ok(Value::Boolean(text.starts_with(&prefix)))
}

pub fn ends_with(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "ends_with")?;
    let suffix = string_arg(args, 1, "ends_with")?;
    Ok(Value::Boolean(text.ends_with(&suffix)))
}

pub fn replace(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "replace")?;
    let from = string_arg(args, 1, "replace")?;
    let to = string_arg(args, 2, "replace")?;
    Ok(Value::String(text.replace(&from, &to)))
}
