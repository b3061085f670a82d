//! Built-in function library
//!
//! Pure functions resolve through [`FunctionRegistry`] from expression
//! position; side-effecting functions (logging, notification, masking, the
//! result-writing calculators) are reachable only through `call` actions.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use ruleflow_ast::{Expression, FunctionCallAction};

use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::result::EvalEvent;
use crate::services::Services;
use crate::value::Value;

pub mod aggregate;
pub mod convert;
pub mod datetime;
pub mod financial;
pub mod math;
pub mod security;
pub mod string;
pub mod validation;

#[cfg(test)]
mod tests;

/// A pure built-in: values in, value out, no context writes.
pub type PureFn = fn(&[Value], &Services) -> Result<Value, EngineError>;

/// Name-to-function table for expression-position calls.
pub struct FunctionRegistry {
    entries: HashMap<&'static str, PureFn>,
}

impl FunctionRegistry {
    /// The standard library: math, string, date, aggregate, conversion,
    /// validation, financial and security groups.
    pub fn standard() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };

        // Math
        registry.register("min", math::min);
        registry.register("max", math::max);
        registry.register("abs", math::abs);
        registry.register("round", math::round);
        registry.register("ceil", math::ceil);
        registry.register("floor", math::floor);
        registry.register("sqrt", math::sqrt);
        registry.register("pow", math::pow);

        // String
        registry.register("length", string::length);
        registry.register("substring", string::substring);
        registry.register("upper", string::upper);
        registry.register("lower", string::lower);
        registry.register("trim", string::trim);
        registry.register("contains", string::contains);
        registry.register("starts_with", string::starts_with);
        registry.register("ends_with", string::ends_with);
        registry.register("replace", string::replace);

        // Date and time
        registry.register("now", datetime::now);
        registry.register("today", datetime::today);
        registry.register("dateadd", datetime::dateadd);
        registry.register("datediff", datetime::datediff);
        registry.register("time_hour", datetime::time_hour);

        // Aggregates
        registry.register("sum", aggregate::sum);
        registry.register("avg", aggregate::avg);
        registry.register("first", aggregate::first);
        registry.register("last", aggregate::last);
        registry.register("size", aggregate::size);
        registry.register("count", aggregate::size);

        // Conversion
        registry.register("tonumber", convert::tonumber);
        registry.register("tostring", convert::tostring);
        registry.register("toboolean", convert::toboolean);

        // Validation predicates
        registry.register("is_email", validation::is_email);
        registry.register("is_phone", validation::is_phone);
        registry.register("is_ssn", validation::is_ssn);
        registry.register("is_credit_score", validation::is_credit_score);
        registry.register("is_account_number", validation::is_account_number);
        registry.register("is_routing_number", validation::is_routing_number);
        registry.register("is_valid_routing", validation::is_routing_number);
        registry.register("is_business_day", validation::is_business_day);
        registry.register("is_weekend", validation::is_weekend);
        registry.register("age_at_least", validation::age_at_least);
        registry.register("age_less_than", validation::age_less_than);
        registry.register("length_equals", validation::length_equals);
        registry.register("length_greater_than", validation::length_greater_than);
        registry.register("length_less_than", validation::length_less_than);

        // Financial
        registry.register("calculate_loan_payment", financial::loan_payment);
        registry.register("calculate_compound_interest", financial::compound_interest);
        registry.register("calculate_amortization", financial::amortization);
        registry.register("debt_to_income_ratio", financial::debt_to_income_ratio);
        registry.register("credit_utilization", financial::credit_utilization);
        registry.register("loan_to_value", financial::loan_to_value);
        registry.register("calculate_apr", financial::apr);
        registry.register("payment_history_score", financial::payment_history_score);

        // Security utilities
        registry.register("encrypt", security::encrypt);
        registry.register("decrypt", security::decrypt);
        registry.register("mask_data", security::mask_data);

        registry
    }

    pub fn register(&mut self, name: &'static str, function: PureFn) {
        self.entries.insert(name, function);
    }

    pub fn get(&self, name: &str) -> Option<PureFn> {
        self.entries.get(name).copied()
    }

    pub fn knows(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

// Argument helpers shared by the group modules.

pub(crate) fn arg(args: &[Value], index: usize, function: &str) -> Result<Value, EngineError> {
    args.get(index).cloned().ok_or_else(|| {
        EngineError::Type(format!(
            "{} expects at least {} argument(s)",
            function,
            index + 1
        ))
    })
}

pub(crate) fn number_arg(
    args: &[Value],
    index: usize,
    function: &str,
) -> Result<BigDecimal, EngineError> {
    let value = arg(args, index, function)?;
    value.as_number().ok_or_else(|| {
        EngineError::Type(format!(
            "{} argument {} must be numeric, got {}",
            function,
            index + 1,
            value.type_name()
        ))
    })
}

pub(crate) fn string_arg(args: &[Value], index: usize, function: &str) -> Result<String, EngineError> {
    Ok(arg(args, index, function)?.as_display_string())
}

/// Dispatch for side-effecting `call` actions: logging, notification,
/// masking, and the calculators that write a named result variable.
/// Unknown functions warn and continue, mirroring the tolerant runtime.
pub fn call_action_function(
    action: &FunctionCallAction,
    ctx: &mut EvaluationContext,
    services: &Services<'_>,
) -> Result<(), EngineError> {
    let mut arguments = Vec::with_capacity(action.arguments.len());
    for argument in &action.arguments {
        arguments.push(Evaluator::new(ctx, services).evaluate(argument)?);
    }

    match action.function.as_str() {
        "log" => {
            let message = arguments
                .iter()
                .map(Value::as_display_string)
                .collect::<Vec<_>>()
                .join(" ");
            ctx.add_event(EvalEvent::info("LOG", message));
            Ok(())
        }
        "notify" => {
            let target = arguments.first().map(Value::as_display_string).unwrap_or_default();
            let message = arguments.get(1).map(Value::as_display_string).unwrap_or_default();
            ctx.add_event(EvalEvent::info(
                "NOTIFY",
                format!("notification to {}: {}", target, message),
            ));
            Ok(())
        }
        "mask" => {
            // The argument names the variable to mask in place
            let variable = variable_name(action.arguments.first(), arguments.first());
            let Some(variable) = variable else {
                ctx.add_event(EvalEvent::warning(
                    "EVAL_TYPE_ERROR",
                    "mask needs a variable to operate on".to_string(),
                ));
                return Ok(());
            };
            let Some(value) = ctx.lookup(&variable).cloned() else {
                ctx.add_event(EvalEvent::warning(
                    "EVAL_UNDEFINED",
                    format!("cannot mask unbound variable '{}'", variable),
                ));
                return Ok(());
            };
            let masked = services.security.mask(&value.as_display_string());
            ctx.write_computed(
                &variable,
                Value::String(masked),
                &services.config.computed_pattern,
            )
        }
        // The action-path form of the loan calculator: three numeric
        // arguments plus the name of the result variable it writes.
        "calculate_loan_payment" if arguments.len() == 4 => {
            let payment = financial::loan_payment(&arguments[..3], services)?;
            let result_variable = arguments[3].as_display_string();
            ctx.write_computed(&result_variable, payment, &services.config.computed_pattern)
        }
        name => {
            // Pure functions invoked as actions evaluate for their events
            // only; anything unknown warns and continues
            if services.functions.get(name).is_none() {
                ctx.add_event(EvalEvent::warning(
                    "EVAL_UNKNOWN_FUNCTION",
                    format!("unknown action function '{}'", name),
                ));
            }
            Ok(())
        }
    }
}

fn variable_name(expression: Option<&Expression>, value: Option<&Value>) -> Option<String> {
    if let Some(Expression::Variable(variable)) = expression {
        if variable.property_path.is_empty() && variable.index.is_none() {
            return Some(variable.name.clone());
        }
    }
    match value {
        Some(Value::String(name)) => Some(name.clone()),
        _ => None,
    }
}
