//! Fixed-precision decimal helpers shared by the evaluator and the
//! financial library

use bigdecimal::rounding::RoundingMode;
use bigdecimal::{BigDecimal, FromPrimitive, One, Signed, ToPrimitive, Zero};

/// Working scale for intermediate results before the final rounding.
const GUARD_SCALE: i64 = 20;

/// Division with half-up rounding at the given scale.
pub fn div(left: &BigDecimal, right: &BigDecimal, scale: i64) -> Option<BigDecimal> {
    if right.is_zero() {
        return None;
    }
    Some((left / right).with_scale_round(scale, RoundingMode::HalfUp))
}

pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    value.with_scale_round(scale, RoundingMode::HalfUp)
}

pub fn floor(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(0, RoundingMode::Floor)
}

pub fn ceil(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(0, RoundingMode::Ceiling)
}

/// Monetary rounding: 2 decimals, half-up.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 2)
}

/// Ratio rounding: 4 decimals, half-up.
pub fn round_ratio(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 4)
}

/// Integer exponentiation by squaring, trimming intermediate scale so long
/// terms do not balloon.
pub fn powi(base: &BigDecimal, exp: i64) -> Option<BigDecimal> {
    if exp < 0 {
        let positive = powi(base, -exp)?;
        return div(&BigDecimal::one(), &positive, GUARD_SCALE);
    }
    let mut result = BigDecimal::one();
    let mut base = base.clone();
    let mut exp = exp as u64;
    while exp > 0 {
        if exp & 1 == 1 {
            result = trim(&result * &base);
        }
        base = trim(&base * &base);
        exp >>= 1;
    }
    Some(result)
}

/// General power: integer exponents stay in decimal arithmetic, fractional
/// exponents fall back to `f64`.
pub fn pow(base: &BigDecimal, exp: &BigDecimal) -> Option<BigDecimal> {
    if exp.is_integer() {
        return powi(base, exp.to_i64()?);
    }
    if base.is_negative() {
        return None;
    }
    let value = base.to_f64()?.powf(exp.to_f64()?);
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_f64(value).map(trim)
}

fn trim(value: BigDecimal) -> BigDecimal {
    if value.fractional_digit_count() > GUARD_SCALE {
        value.with_scale_round(GUARD_SCALE, RoundingMode::HalfUp)
    } else {
        value
    }
}
