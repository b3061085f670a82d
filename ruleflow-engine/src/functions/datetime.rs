//! Date and time group
//!
//! Dates travel as strings; parsing tries ISO first, then the common
//! regional layouts. `now`/`today` read the injected clock so evaluations
//! stay deterministic under a pinned clock.

use bigdecimal::BigDecimal;
use chrono::{Datelike, Months, NaiveDate, Timelike};

use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::{number_arg, string_arg};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d %b %Y"];

/// Parse a date string, trying ISO first and the common layouts after.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Full ISO datetimes also parse as their date part
    if let Ok(datetime) = text.parse::<chrono::DateTime<chrono::Utc>>() {
        return Some(datetime.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

pub fn now(_args: &[Value], services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(services.clock.now_utc().to_rfc3339()))
}

pub fn today(_args: &[Value], services: &Services) -> Result<Value, EngineError> {
    Ok(Value::String(services.clock.today().format("%Y-%m-%d").to_string()))
}

fn unit_of(text: &str) -> Option<&'static str> {
    match text.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => Some("days"),
        "weeks" | "week" | "w" => Some("weeks"),
        "months" | "month" | "m" => Some("months"),
        "years" | "year" | "y" => Some("years"),
        _ => None,
    }
}

/// `dateadd(date, amount, unit)` — units: days, weeks, months, years (plus
/// singular and single-letter aliases).
pub fn dateadd(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let Some(date) = parse_date(&string_arg(args, 0, "dateadd")?) else {
        return Ok(Value::Null);
    };
    let amount = number_arg(args, 1, "dateadd")?;
    let Some(amount) = bigdecimal::ToPrimitive::to_i64(&amount) else {
        return Ok(Value::Null);
    };
    let Some(unit) = unit_of(&string_arg(args, 2, "dateadd")?) else {
        return Ok(Value::Null);
    };

    let result = match unit {
        "days" => date.checked_add_signed(chrono::Duration::days(amount)),
        "weeks" => date.checked_add_signed(chrono::Duration::weeks(amount)),
        "months" => add_months(date, amount),
        "years" => amount.checked_mul(12).and_then(|months| add_months(date, months)),
        _ => unreachable!(),
    };
    Ok(result
        .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null))
}

fn add_months(date: NaiveDate, amount: i64) -> Option<NaiveDate> {
    let months = u32::try_from(amount.unsigned_abs()).ok()?;
    if amount >= 0 {
        date.checked_add_months(Months::new(months))
    } else {
        date.checked_sub_months(Months::new(months))
    }
}

/// `datediff(a, b, unit?)` — `b - a`, defaulting to days.
pub fn datediff(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let (Some(from), Some(to)) = (
        parse_date(&string_arg(args, 0, "datediff")?),
        parse_date(&string_arg(args, 1, "datediff")?),
    ) else {
        return Ok(Value::Null);
    };
    let unit = match args.get(2) {
        Some(value) => match unit_of(&value.as_display_string()) {
            Some(unit) => unit,
            None => return Ok(Value::Null),
        },
        None => "days",
    };

    let days = (to - from).num_days();
    let result = match unit {
        "days" => BigDecimal::from(days),
        "weeks" => BigDecimal::from(days / 7),
        "months" => BigDecimal::from(whole_months(from, to)),
        "years" => BigDecimal::from(whole_months(from, to) / 12),
        _ => unreachable!(),
    };
    Ok(Value::Number(result))
}

/// Whole calendar months between two dates, sign following `to - from`.
fn whole_months(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -whole_months(to, from);
    }
    let mut months =
        i64::from(to.year() - from.year()) * 12 + i64::from(to.month() as i32 - from.month() as i32);
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

/// The hour (0-23) of an ISO datetime argument, or of the clock's now.
pub fn time_hour(args: &[Value], services: &Services) -> Result<Value, EngineError> {
    match args.first() {
        None | Some(Value::Null) => {
            Ok(Value::from(i64::from(services.clock.now_utc().hour())))
        }
        Some(value) => {
            let text = value.as_display_string();
            match text.parse::<chrono::DateTime<chrono::Utc>>() {
                Ok(datetime) => Ok(Value::from(i64::from(datetime.hour()))),
                Err(_) => Ok(Value::Null),
            }
        }
    }
}
