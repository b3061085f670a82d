//! Validation predicate group
//!
//! Predicates never raise: malformed input is simply `false`.

use bigdecimal::BigDecimal;
use chrono::{Datelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::{arg, number_arg, string_arg};

use crate::functions::datetime::parse_date;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());
static SSN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3}-?[0-9]{2}-?[0-9]{4}$").unwrap());

pub fn is_email(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "is_email")?;
    Ok(Value::Boolean(EMAIL.is_match(&text)))
}

pub fn is_phone(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "is_phone")?;
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    Ok(Value::Boolean(PHONE.is_match(&digits)))
}

pub fn is_ssn(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "is_ssn")?;
    Ok(Value::Boolean(SSN.is_match(&text)))
}

/// Credit scores live in the 300..=850 band.
pub fn is_credit_score(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let valid = arg(args, 0, "is_credit_score")?
        .as_number()
        .map(|n| n.is_integer() && n >= BigDecimal::from(300) && n <= BigDecimal::from(850))
        .unwrap_or(false);
    Ok(Value::Boolean(valid))
}

/// Account numbers are 8 to 17 digits.
pub fn is_account_number(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "is_account_number")?;
    let valid = (8..=17).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_digit());
    Ok(Value::Boolean(valid))
}

/// Nine digits passing the ABA checksum: sum of 3-7-1 weighted digits is a
/// multiple of 10.
pub fn is_routing_number(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let text = string_arg(args, 0, "is_routing_number")?;
    if text.len() != 9 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Value::Boolean(false));
    }
    const WEIGHTS: [u32; 9] = [3, 7, 1, 3, 7, 1, 3, 7, 1];
    let sum: u32 = text
        .bytes()
        .zip(WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    Ok(Value::Boolean(sum % 10 == 0))
}

fn date_or_today(args: &[Value], services: &Services) -> Option<chrono::NaiveDate> {
    match args.first() {
        None | Some(Value::Null) => Some(services.clock.today()),
        Some(value) => parse_date(&value.as_display_string()),
    }
}

pub fn is_business_day(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let valid = date_or_today(args, services)
        .map(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .unwrap_or(false);
    Ok(Value::Boolean(valid))
}

pub fn is_weekend(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let valid = date_or_today(args, services)
        .map(|date| matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .unwrap_or(false);
    Ok(Value::Boolean(valid))
}

/// Age in whole years as of the clock's today.
fn age_of(dob: chrono::NaiveDate, today: chrono::NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

pub fn age_at_least(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let years = number_arg(args, 1, "age_at_least")?;
    let valid = parse_date(&string_arg(args, 0, "age_at_least")?)
        .map(|dob| BigDecimal::from(age_of(dob, services.clock.today())) >= years)
        .unwrap_or(false);
    Ok(Value::Boolean(valid))
}

pub fn age_less_than(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    let years = number_arg(args, 1, "age_less_than")?;
    let valid = parse_date(&string_arg(args, 0, "age_less_than")?)
        .map(|dob| BigDecimal::from(age_of(dob, services.clock.today())) < years)
        .unwrap_or(false);
    Ok(Value::Boolean(valid))
}

fn length_of(value: &Value) -> usize {
    match value {
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        Value::Null => 0,
        other => other.as_display_string().chars().count(),
    }
}

pub fn length_equals(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let expected = number_arg(args, 1, "length_equals")?;
    let actual = BigDecimal::from(length_of(&arg(args, 0, "length_equals")?) as i64);
    Ok(Value::Boolean(actual == expected))
}

pub fn length_greater_than(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let expected = number_arg(args, 1, "length_greater_than")?;
    let actual = BigDecimal::from(length_of(&arg(args, 0, "length_greater_than")?) as i64);
    Ok(Value::Boolean(actual > expected))
}

pub fn length_less_than(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let expected = number_arg(args, 1, "length_less_than")?;
    let actual = BigDecimal::from(length_of(&arg(args, 0, "length_less_than")?) as i64);
    Ok(Value::Boolean(actual < expected))
}
