//! Financial group
//!
//! Decimal math throughout; monetary outputs round half-up to 2 decimals,
//! ratios to 4. Division-by-zero inputs return null, never raise.

use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, One, Zero};

use crate::decimal;
use crate::error::EngineError;
use crate::services::Services;
use crate::value::Value;

use super::number_arg;

/// Scale used for intermediate rate math before the final rounding.
const RATE_SCALE: i64 = 12;

fn monthly_rate(annual_rate_pct: &BigDecimal) -> Option<BigDecimal> {
    decimal::div(annual_rate_pct, &BigDecimal::from(1200), RATE_SCALE)
}

/// The fixed monthly payment for a principal at an annual percentage rate
/// over a term in months. Pure: the action-path variant performs the
/// context write, this one never does.
pub fn loan_payment(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let principal = number_arg(args, 0, "calculate_loan_payment")?;
    let annual_rate = number_arg(args, 1, "calculate_loan_payment")?;
    let term_months = number_arg(args, 2, "calculate_loan_payment")?;

    Ok(payment_of(&principal, &annual_rate, &term_months)
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

fn payment_of(
    principal: &BigDecimal,
    annual_rate: &BigDecimal,
    term_months: &BigDecimal,
) -> Option<BigDecimal> {
    if !term_months.is_integer() || term_months.is_zero() {
        return None;
    }
    let months = bigdecimal::ToPrimitive::to_i64(term_months)?;
    if months <= 0 {
        return None;
    }
    let rate = monthly_rate(annual_rate)?;
    if rate.is_zero() {
        return decimal::div(principal, term_months, 2);
    }
    // payment = P * r * (1+r)^n / ((1+r)^n - 1)
    let factor = decimal::powi(&(BigDecimal::one() + &rate), months)?;
    let numerator = principal * &rate * &factor;
    let denominator = factor - BigDecimal::one();
    decimal::div(&numerator, &denominator, 2)
}

/// `calculate_compound_interest(principal, annual_rate_pct, years,
/// compounds_per_year?)` — the accumulated amount, 2 decimals.
pub fn compound_interest(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let principal = number_arg(args, 0, "calculate_compound_interest")?;
    let annual_rate = number_arg(args, 1, "calculate_compound_interest")?;
    let years = number_arg(args, 2, "calculate_compound_interest")?;
    let per_year = match args.get(3) {
        Some(value) => match value.as_number() {
            Some(n) => n,
            None => return Ok(Value::Null),
        },
        None => BigDecimal::from(12),
    };

    let result = (|| {
        let periods = (&per_year * &years).with_scale(0);
        let n = bigdecimal::ToPrimitive::to_i64(&periods)?;
        if n < 0 {
            return None;
        }
        let rate = decimal::div(&annual_rate, &(BigDecimal::from(100) * &per_year), RATE_SCALE)?;
        let factor = decimal::powi(&(BigDecimal::one() + rate), n)?;
        Some(decimal::round_money(&(principal * factor)))
    })();
    Ok(result.map(Value::Number).unwrap_or(Value::Null))
}

/// `calculate_amortization(principal, annual_rate_pct, term_months)` — a
/// map of monthly_payment, total_paid and total_interest.
pub fn amortization(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let principal = number_arg(args, 0, "calculate_amortization")?;
    let annual_rate = number_arg(args, 1, "calculate_amortization")?;
    let term_months = number_arg(args, 2, "calculate_amortization")?;

    let Some(payment) = payment_of(&principal, &annual_rate, &term_months) else {
        return Ok(Value::Null);
    };
    let total_paid = decimal::round_money(&(&payment * &term_months));
    let total_interest = decimal::round_money(&(&total_paid - &principal));

    let mut out = BTreeMap::new();
    out.insert("monthly_payment".to_string(), Value::Number(payment));
    out.insert("total_paid".to_string(), Value::Number(total_paid));
    out.insert("total_interest".to_string(), Value::Number(total_interest));
    Ok(Value::Map(out))
}

fn ratio(numerator: &BigDecimal, denominator: &BigDecimal) -> Value {
    decimal::div(numerator, denominator, 4)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn debt_to_income_ratio(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let debt = number_arg(args, 0, "debt_to_income_ratio")?;
    let income = number_arg(args, 1, "debt_to_income_ratio")?;
    Ok(ratio(&debt, &income))
}

pub fn credit_utilization(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let balance = number_arg(args, 0, "credit_utilization")?;
    let limit = number_arg(args, 1, "credit_utilization")?;
    Ok(ratio(&balance, &limit))
}

pub fn loan_to_value(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let loan = number_arg(args, 0, "loan_to_value")?;
    let value = number_arg(args, 1, "loan_to_value")?;
    Ok(ratio(&loan, &value))
}

/// `calculate_apr(principal, total_fees, annual_rate_pct, term_months)` —
/// the nominal rate adjusted for financed fees, as an annual percentage.
pub fn apr(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let principal = number_arg(args, 0, "calculate_apr")?;
    let fees = number_arg(args, 1, "calculate_apr")?;
    let annual_rate = number_arg(args, 2, "calculate_apr")?;
    let term_months = number_arg(args, 3, "calculate_apr")?;

    let result = (|| {
        let years = decimal::div(&term_months, &BigDecimal::from(12), RATE_SCALE)?;
        if years.is_zero() {
            return None;
        }
        let interest =
            &principal * decimal::div(&annual_rate, &BigDecimal::from(100), RATE_SCALE)? * &years;
        let total_cost = interest + fees;
        let cost_ratio = decimal::div(&total_cost, &principal, RATE_SCALE)?;
        let annualized = decimal::div(&cost_ratio, &years, RATE_SCALE)?;
        Some(decimal::round_money(&(annualized * BigDecimal::from(100))))
    })();
    Ok(result.map(Value::Number).unwrap_or(Value::Null))
}

/// `payment_history_score(on_time, total)` — the on-time share as a
/// percentage, 2 decimals; null when there is no history.
pub fn payment_history_score(args: &[Value], _services: &Services) -> Result<Value, EngineError> {
    let on_time = number_arg(args, 0, "payment_history_score")?;
    let total = number_arg(args, 1, "payment_history_score")?;
    let result = decimal::div(&on_time, &total, RATE_SCALE)
        .map(|share| decimal::round_money(&(share * BigDecimal::from(100))));
    Ok(result.map(Value::Number).unwrap_or(Value::Null))
}
