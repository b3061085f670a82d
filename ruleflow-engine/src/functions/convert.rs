//! Conversion group: the explicit forms of the implicit coercions

use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::arg;

pub fn tonumber(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(arg(args, 0, "tonumber")?
        .as_number()
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

pub fn tostring(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(arg(args, 0, "tostring")?.as_display_string()))
}

pub fn toboolean(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    Ok(Value::Boolean(arg(args, 0, "toboolean")?.is_truthy()))
}
