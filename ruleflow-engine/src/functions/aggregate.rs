//! Aggregate group: operations over list values

use bigdecimal::{BigDecimal, Zero};

use crate::decimal;
use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::arg;

fn numbers_of(value: &Value, function: &str) -> Result<Vec<BigDecimal>, EngineError> {
    let Some(items) = value.as_list() else {
        return Err(EngineError::Type(format!(
            "{} expects a list, got {}",
            function,
            value.type_name()
        )));
    };
    let mut numbers = Vec::with_capacity(items.len());
    for item in items {
        numbers.push(item.as_number().ok_or_else(|| {
            EngineError::Type(format!("{} list element is not numeric", function))
        })?);
    }
    Ok(numbers)
}

pub fn sum(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let numbers = numbers_of(&arg(args, 0, "sum")?, "sum")?;
    Ok(Value::Number(
        numbers.into_iter().fold(BigDecimal::zero(), |acc, n| acc + n),
    ))
}

pub fn avg(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let numbers = numbers_of(&arg(args, 0, "avg")?, "avg")?;
    if numbers.is_empty() {
        return Ok(Value::Null);
    }
    let count = BigDecimal::from(numbers.len() as i64);
    let total = numbers.into_iter().fold(BigDecimal::zero(), |acc, n| acc + n);
    Ok(decimal::div(&total, &count, services.config.decimal_div_scale)
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

pub fn first(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let value = arg(args, 0, "first")?;
    Ok(value
        .as_list()
        .and_then(|items| items.first().cloned())
        .unwrap_or(Value::Null))
}

pub fn last(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let value = arg(args, 0, "last")?;
    Ok(value
        .as_list()
        .and_then(|items| items.last().cloned())
        .unwrap_or(Value::Null))
}

/// `size`/`count`: elements of a list, entries of a map, characters of a
/// string.
pub fn size(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let length = match arg(args, 0, "size")? {
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        Value::Null => 0,
        other => other.as_display_string().chars().count(),
    };
    Ok(Value::from(length as i64))
}
