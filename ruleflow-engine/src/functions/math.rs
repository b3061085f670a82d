//! Math group

use crate::decimal;
use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::number_arg;

pub fn min(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    fold_extreme(args, true)
}

pub fn max(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    fold_extreme(args, false)
}

fn fold_extreme(args: &[Value], take_min: bool) -> Result<Value, EngineError> {
    let mut best = None;
    for (i, value) in args.iter().enumerate() {
        let n = value.as_number().ok_or_else(|| {
            EngineError::Type(format!("min/max argument {} is not numeric", i + 1))
        })?;
        best = match best {
            None => Some(n),
            Some(current) => Some(if (n < current) == take_min { n } else { current }),
        };
    }
    Ok(best.map(Value::Number).unwrap_or(Value::Null))
}

pub fn abs(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::Number(number_arg(args, 0, "abs")?.abs()))
}

pub fn round(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let value = number_arg(args, 0, "round")?;
    let scale = match args.get(1) {
        Some(scale) => scale
            .as_number()
            .and_then(|n| bigdecimal::ToPrimitive::to_i64(&n))
            .ok_or_else(|| EngineError::Type("round scale must be an integer".into()))?,
        None => 0,
    };
    Ok(Value::Number(decimal::round_half_up(&value, scale)))
}

pub fn ceil(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::Number(decimal::ceil(&number_arg(args, 0, "ceil")?)))
}

pub fn floor(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::Number(decimal::floor(&number_arg(args, 0, "floor")?)))
}

pub fn sqrt(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let value = number_arg(args, 0, "sqrt")?;
    // Negative radicand yields null
    Ok(value.sqrt().map(Value::Number).unwrap_or(Value::Null))
}

pub fn pow(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let base = number_arg(args, 0, "pow")?;
    let exponent = number_arg(args, 1, "pow")?;
    decimal::pow(&base, &exponent)
        .map(Value::Number)
        .ok_or_else(|| EngineError::Type(format!("cannot raise {} to {}", base, exponent)))
}
