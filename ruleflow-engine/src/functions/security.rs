//! Security utility group: thin wrappers over the injected provider

use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::string_arg;

pub fn encrypt(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let plain = string_arg(args, 0, "encrypt")?;
    Ok(Value::String(services.security.encrypt(&plain)))
}

pub fn decrypt(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let cipher = string_arg(args, 0, "decrypt")?;
    Ok(services
        .security
        .decrypt(&cipher)
        .map(Value::String)
        .unwrap_or(Value::Null))
}

pub fn mask_data(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let value = string_arg(args, 0, "mask_data")?;
    Ok(Value::String(services.security.mask(&value)))
}
