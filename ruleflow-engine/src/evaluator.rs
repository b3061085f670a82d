//! Expression and condition evaluation
//!
//! A visitor over the expression and condition families. Lookups are
//! tolerant (missing names yield null plus a warning event); arithmetic
//! faults and type mismatches abort with structured errors.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use ruleflow_ast::*;

use crate::context::EvaluationContext;
use crate::decimal;
use crate::error::EngineError;
use crate::result::EvalEvent;
use crate::services::Services;
use crate::value::Value;

pub struct Evaluator<'a, 'b> {
    pub ctx: &'a mut EvaluationContext,
    pub services: &'a Services<'b>,
}

impl<'a, 'b> Evaluator<'a, 'b> {
    pub fn new(ctx: &'a mut EvaluationContext, services: &'a Services<'b>) -> Self {
        Self { ctx, services }
    }

    pub fn evaluate(&mut self, expression: &Expression) -> Result<Value, EngineError> {
        expression.accept(self)
    }

    pub fn evaluate_condition(&mut self, condition: &Condition) -> Result<bool, EngineError> {
        condition.accept(self)
    }

    fn number_of(&mut self, expression: &Expression) -> Result<BigDecimal, EngineError> {
        let value = self.evaluate(expression)?;
        value.as_number().ok_or_else(|| {
            EngineError::Type(format!(
                "expected a number, got {} ({})",
                value.type_name(),
                value
            ))
        })
    }

    fn regex_match(&mut self, text: &str, pattern: &str) -> bool {
        match regex::Regex::new(pattern) {
            // Find semantics: a partial match anywhere succeeds
            Ok(re) => re.is_match(text),
            Err(error) => {
                self.ctx.add_event(EvalEvent::warning(
                    "EVAL_BAD_PATTERN",
                    format!("invalid regular expression '{}': {}", pattern, error),
                ));
                false
            }
        }
    }

    fn in_list(&mut self, left: &Value, right: &Value) -> bool {
        match right.as_list() {
            Some(items) => items.iter().any(|item| item == left),
            None => {
                self.ctx.add_event(EvalEvent::warning(
                    "EVAL_TYPE_ERROR",
                    format!("in_list needs a list on the right, got {}", right.type_name()),
                ));
                false
            }
        }
    }

    fn compare_numeric(
        &mut self,
        op: &ComparisonOp,
        left: &Value,
        right: &Value,
    ) -> Result<bool, EngineError> {
        let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
            return Err(EngineError::Type(format!(
                "'{}' needs numeric operands, got {} and {}",
                op.word(),
                left.type_name(),
                right.type_name()
            )));
        };
        Ok(match op {
            ComparisonOp::GreaterThan => a > b,
            ComparisonOp::LessThan => a < b,
            ComparisonOp::AtLeast => a >= b,
            ComparisonOp::AtMost => a <= b,
            _ => unreachable!("caller dispatches numeric operators only"),
        })
    }
}

fn property_of(value: &Value, name: &str) -> Value {
    match value {
        Value::Map(entries) => entries.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn index_of(value: &Value, index: &Value) -> Value {
    let Value::List(items) = value else {
        return Value::Null;
    };
    let Some(index) = index.as_number().and_then(|n| n.to_i64()) else {
        return Value::Null;
    };
    if index < 0 {
        return Value::Null;
    }
    items.get(index as usize).cloned().unwrap_or(Value::Null)
}

/// Walk a `data.items[0].price` style path into a value.
fn walk_json_path(mut value: Value, path: &str) -> Value {
    for segment in path.split('.') {
        let (name, indexes) = split_segment(segment);
        if !name.is_empty() {
            value = property_of(&value, name);
        }
        for index in indexes {
            value = index_of(&value, &Value::from(index));
        }
    }
    value
}

fn split_segment(segment: &str) -> (&str, Vec<i64>) {
    match segment.find('[') {
        None => (segment, Vec::new()),
        Some(start) => {
            let name = &segment[..start];
            let mut indexes = Vec::new();
            for part in segment[start..].split('[').skip(1) {
                if let Some(number) = part.strip_suffix(']') {
                    if let Ok(index) = number.parse::<i64>() {
                        indexes.push(index);
                        continue;
                    }
                }
                // Malformed index: stop descending
                return (name, vec![i64::MIN]);
            }
            (name, indexes)
        }
    }
}

impl ExpressionVisitor for Evaluator<'_, '_> {
    type Output = Result<Value, EngineError>;

    fn visit_literal(&mut self, expr: &LiteralExpr) -> Self::Output {
        Ok(Value::from_literal(&expr.value))
    }

    fn visit_variable(&mut self, expr: &VariableExpr) -> Self::Output {
        let mut value = match self.ctx.lookup(&expr.name) {
            Some(value) => value.clone(),
            None => {
                self.ctx.add_event(EvalEvent::warning(
                    "EVAL_UNDEFINED",
                    format!("variable '{}' is not bound; using null", expr.name),
                ));
                return Ok(Value::Null);
            }
        };
        for part in &expr.property_path {
            value = property_of(&value, part);
        }
        if let Some(index_expr) = &expr.index {
            let index = self.evaluate(index_expr)?;
            value = index_of(&value, &index);
        }
        Ok(value)
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> Self::Output {
        match expr.op {
            UnaryOp::Negate => {
                let number = self.number_of(&expr.operand)?;
                Ok(Value::Number(-number))
            }
            UnaryOp::Not => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(!value.is_truthy()))
            }
            UnaryOp::Exists => {
                let value = match expr.operand.as_ref() {
                    // exists(name) asks about the binding, not its value
                    Expression::Variable(v) if v.property_path.is_empty() && v.index.is_none() => {
                        return Ok(Value::Boolean(self.ctx.is_bound(&v.name)));
                    }
                    other => self.evaluate(other)?,
                };
                Ok(Value::Boolean(value != Value::Null))
            }
            UnaryOp::IsNull => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(value == Value::Null))
            }
            UnaryOp::IsNumber => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(matches!(value, Value::Number(_))))
            }
            UnaryOp::IsString => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(matches!(value, Value::String(_))))
            }
            UnaryOp::IsBoolean => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(matches!(value, Value::Boolean(_))))
            }
            UnaryOp::IsList => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::Boolean(matches!(value, Value::List(_))))
            }
            UnaryOp::ToUpper => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::String(value.as_display_string().to_uppercase()))
            }
            UnaryOp::ToLower => {
                let value = self.evaluate(&expr.operand)?;
                Ok(Value::String(value.as_display_string().to_lowercase()))
            }
            UnaryOp::Length => {
                let value = self.evaluate(&expr.operand)?;
                let length = match &value {
                    Value::Null => 0,
                    Value::List(items) => items.len(),
                    Value::Map(entries) => entries.len(),
                    other => other.as_display_string().chars().count(),
                };
                Ok(Value::from(length as i64))
            }
        }
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> Self::Output {
        // Logical operators short-circuit before touching the right side
        match expr.op {
            BinaryOp::And => {
                let left = self.evaluate(&expr.left)?;
                if !left.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let right = self.evaluate(&expr.right)?;
                return Ok(Value::Boolean(right.is_truthy()));
            }
            BinaryOp::Or => {
                let left = self.evaluate(&expr.left)?;
                if left.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let right = self.evaluate(&expr.right)?;
                return Ok(Value::Boolean(right.is_truthy()));
            }
            _ => {}
        }

        let left = self.evaluate(&expr.left)?;
        let right = self.evaluate(&expr.right)?;

        match expr.op {
            BinaryOp::Add => {
                // String on either side means concatenation
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    return Ok(Value::String(format!(
                        "{}{}",
                        left.as_display_string(),
                        right.as_display_string()
                    )));
                }
                let (a, b) = self.numeric_pair("+", &left, &right)?;
                Ok(Value::Number(a + b))
            }
            BinaryOp::Subtract => {
                let (a, b) = self.numeric_pair("-", &left, &right)?;
                Ok(Value::Number(a - b))
            }
            BinaryOp::Multiply => {
                let (a, b) = self.numeric_pair("*", &left, &right)?;
                Ok(Value::Number(a * b))
            }
            BinaryOp::Divide => {
                let (a, b) = self.numeric_pair("/", &left, &right)?;
                decimal::div(&a, &b, self.services.config.decimal_div_scale)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        EngineError::DivisionByZero(format!("{} / {}", a, b))
                    })
            }
            BinaryOp::Modulo => {
                let (a, b) = self.numeric_pair("%", &left, &right)?;
                if b.is_zero() {
                    return Err(EngineError::DivisionByZero(format!("{} % {}", a, b)));
                }
                Ok(Value::Number(a % b))
            }
            BinaryOp::Power => {
                let (a, b) = self.numeric_pair("**", &left, &right)?;
                decimal::pow(&a, &b)
                    .map(Value::Number)
                    .ok_or_else(|| EngineError::Type(format!("cannot raise {} to {}", a, b)))
            }
            BinaryOp::Equals => Ok(Value::Boolean(left == right)),
            BinaryOp::NotEquals => Ok(Value::Boolean(left != right)),
            BinaryOp::GreaterThan | BinaryOp::LessThan | BinaryOp::AtLeast | BinaryOp::AtMost => {
                let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                    return Err(EngineError::Type(format!(
                        "comparison needs numeric operands, got {} and {}",
                        left.type_name(),
                        right.type_name()
                    )));
                };
                Ok(Value::Boolean(match expr.op {
                    BinaryOp::GreaterThan => a > b,
                    BinaryOp::LessThan => a < b,
                    BinaryOp::AtLeast => a >= b,
                    _ => a <= b,
                }))
            }
            BinaryOp::Contains => Ok(Value::Boolean(
                left.as_display_string().contains(&right.as_display_string()),
            )),
            BinaryOp::StartsWith => Ok(Value::Boolean(
                left.as_display_string().starts_with(&right.as_display_string()),
            )),
            BinaryOp::EndsWith => Ok(Value::Boolean(
                left.as_display_string().ends_with(&right.as_display_string()),
            )),
            BinaryOp::Matches => {
                let matched =
                    self.regex_match(&left.as_display_string(), &right.as_display_string());
                Ok(Value::Boolean(matched))
            }
            BinaryOp::InList => {
                let matched = self.in_list(&left, &right);
                Ok(Value::Boolean(matched))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn visit_arithmetic(&mut self, expr: &ArithmeticExpr) -> Self::Output {
        let scale = self.services.config.decimal_div_scale;
        match expr.op {
            ArithmeticOp::Min | ArithmeticOp::Max => {
                let numbers = self.spread_numbers(&expr.operands)?;
                let Some(first) = numbers.first().cloned() else {
                    return Ok(Value::Null);
                };
                let take_min = expr.op == ArithmeticOp::Min;
                let result = numbers.into_iter().fold(first, |acc, n| {
                    if (n < acc) == take_min {
                        n
                    } else {
                        acc
                    }
                });
                Ok(Value::Number(result))
            }
            ArithmeticOp::Sum => {
                let numbers = self.spread_numbers(&expr.operands)?;
                let total = numbers
                    .into_iter()
                    .fold(BigDecimal::zero(), |acc, n| acc + n);
                Ok(Value::Number(total))
            }
            ArithmeticOp::Average => {
                let numbers = self.spread_numbers(&expr.operands)?;
                if numbers.is_empty() {
                    return Ok(Value::Null);
                }
                let count = BigDecimal::from(numbers.len() as i64);
                let total = numbers
                    .into_iter()
                    .fold(BigDecimal::zero(), |acc, n| acc + n);
                Ok(decimal::div(&total, &count, scale)
                    .map(Value::Number)
                    .unwrap_or(Value::Null))
            }
            ArithmeticOp::Abs => {
                let number = self.number_of(&expr.operands[0])?;
                Ok(Value::Number(number.abs()))
            }
            ArithmeticOp::Round => {
                let number = self.number_of(&expr.operands[0])?;
                let digits = match expr.operands.get(1) {
                    Some(operand) => self
                        .number_of(operand)?
                        .to_i64()
                        .ok_or_else(|| EngineError::Type("round scale must be an integer".into()))?,
                    None => 0,
                };
                Ok(Value::Number(decimal::round_half_up(&number, digits)))
            }
            ArithmeticOp::Floor => {
                let number = self.number_of(&expr.operands[0])?;
                Ok(Value::Number(decimal::floor(&number)))
            }
            ArithmeticOp::Ceil => {
                let number = self.number_of(&expr.operands[0])?;
                Ok(Value::Number(decimal::ceil(&number)))
            }
            ArithmeticOp::Sqrt => {
                let number = self.number_of(&expr.operands[0])?;
                // Negative radicand yields null, not an error
                Ok(number.sqrt().map(Value::Number).unwrap_or(Value::Null))
            }
            ArithmeticOp::Add
            | ArithmeticOp::Subtract
            | ArithmeticOp::Multiply
            | ArithmeticOp::Divide
            | ArithmeticOp::Modulo
            | ArithmeticOp::Power => {
                let mut numbers = Vec::with_capacity(expr.operands.len());
                for operand in &expr.operands {
                    numbers.push(self.number_of(operand)?);
                }
                let mut iter = numbers.into_iter();
                let mut acc = iter
                    .next()
                    .ok_or_else(|| EngineError::Internal("empty arithmetic operand list".into()))?;
                for n in iter {
                    acc = match expr.op {
                        ArithmeticOp::Add => acc + n,
                        ArithmeticOp::Subtract => acc - n,
                        ArithmeticOp::Multiply => acc * n,
                        ArithmeticOp::Divide => decimal::div(&acc, &n, scale).ok_or_else(|| {
                            EngineError::DivisionByZero(format!("{} / {}", acc, n))
                        })?,
                        ArithmeticOp::Modulo => {
                            if n.is_zero() {
                                return Err(EngineError::DivisionByZero(format!(
                                    "{} % {}",
                                    acc, n
                                )));
                            }
                            acc % n
                        }
                        ArithmeticOp::Power => decimal::pow(&acc, &n).ok_or_else(|| {
                            EngineError::Type(format!("cannot raise {} to {}", acc, n))
                        })?,
                        _ => unreachable!(),
                    };
                }
                Ok(Value::Number(acc))
            }
        }
    }

    fn visit_function_call(&mut self, expr: &FunctionCallExpr) -> Self::Output {
        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in &expr.arguments {
            arguments.push(self.evaluate(argument)?);
        }
        match self.services.functions.get(&expr.name) {
            Some(function) => function(&arguments, self.services),
            None => {
                self.ctx.add_event(EvalEvent::warning(
                    "EVAL_UNKNOWN_FUNCTION",
                    format!("unknown function '{}'; returning null", expr.name),
                ));
                Ok(Value::Null)
            }
        }
    }

    fn visit_json_path(&mut self, expr: &JsonPathExpr) -> Self::Output {
        let source = self.evaluate(&expr.source)?;
        Ok(walk_json_path(source, &expr.path))
    }

    fn visit_rest_call(&mut self, expr: &RestCallExpr) -> Self::Output {
        let Some(http) = self.services.http else {
            return Err(EngineError::ExternalUnavailable(
                "no HTTP client configured for rest_call".into(),
            ));
        };
        let url = self.evaluate(&expr.url)?.as_display_string();
        let body = match &expr.body {
            Some(body) => Some(self.evaluate(body)?.to_json()),
            None => None,
        };
        let mut headers = Vec::with_capacity(expr.headers.len());
        for (name, value) in &expr.headers {
            headers.push((name.clone(), self.evaluate(value)?.as_display_string()));
        }
        let timeout = std::time::Duration::from_millis(expr.timeout_ms.unwrap_or(30_000));

        match http.request(&expr.method, &url, &headers, body.as_ref(), timeout) {
            Ok(json) => Ok(Value::from_json(&json)),
            Err(crate::collaborators::HttpError::Timeout(message)) => {
                Err(EngineError::ExternalTimeout(message))
            }
            Err(crate::collaborators::HttpError::Failed(message)) => {
                Err(EngineError::ExternalUnavailable(message))
            }
        }
    }
}

impl Evaluator<'_, '_> {
    fn numeric_pair(
        &mut self,
        op: &str,
        left: &Value,
        right: &Value,
    ) -> Result<(BigDecimal, BigDecimal), EngineError> {
        match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(EngineError::Type(format!(
                "'{}' needs numeric operands, got {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    /// Operand numbers for the n-ary operations; a single list operand
    /// spreads into its elements.
    fn spread_numbers(&mut self, operands: &[Expression]) -> Result<Vec<BigDecimal>, EngineError> {
        if operands.len() == 1 {
            let value = self.evaluate(&operands[0])?;
            if let Value::List(items) = value {
                let mut numbers = Vec::with_capacity(items.len());
                for item in items {
                    numbers.push(item.as_number().ok_or_else(|| {
                        EngineError::Type(format!(
                            "list element {} is not numeric",
                            item.type_name()
                        ))
                    })?);
                }
                return Ok(numbers);
            }
            return value
                .as_number()
                .map(|n| vec![n])
                .ok_or_else(|| EngineError::Type(format!("expected a number, got {}", value.type_name())));
        }
        let mut numbers = Vec::with_capacity(operands.len());
        for operand in operands {
            numbers.push(self.number_of(operand)?);
        }
        Ok(numbers)
    }
}

impl ConditionVisitor for Evaluator<'_, '_> {
    type Output = Result<bool, EngineError>;

    fn visit_comparison(&mut self, condition: &ComparisonCondition) -> Self::Output {
        let left = self.evaluate(&condition.left)?;
        let right = match &condition.right {
            Some(right) => self.evaluate(right)?,
            None => {
                return Err(EngineError::Internal(format!(
                    "comparison '{}' is missing its right operand",
                    condition.op.word()
                )))
            }
        };

        match condition.op {
            ComparisonOp::Equals => Ok(left == right),
            ComparisonOp::NotEquals => Ok(left != right),
            ComparisonOp::GreaterThan
            | ComparisonOp::LessThan
            | ComparisonOp::AtLeast
            | ComparisonOp::AtMost => self.compare_numeric(&condition.op, &left, &right),
            ComparisonOp::Between | ComparisonOp::NotBetween => {
                let upper = match &condition.range_end {
                    Some(upper) => self.evaluate(upper)?,
                    None => {
                        return Err(EngineError::Internal(
                            "between is missing its range end".into(),
                        ))
                    }
                };
                let (Some(v), Some(lo), Some(hi)) =
                    (left.as_number(), right.as_number(), upper.as_number())
                else {
                    return Err(EngineError::Type(
                        "between needs numeric operands".into(),
                    ));
                };
                // Inclusive on both bounds
                let inside = v >= lo && v <= hi;
                Ok(if condition.op == ComparisonOp::Between {
                    inside
                } else {
                    !inside
                })
            }
            ComparisonOp::Contains => Ok(left
                .as_display_string()
                .contains(&right.as_display_string())),
            ComparisonOp::StartsWith => Ok(left
                .as_display_string()
                .starts_with(&right.as_display_string())),
            ComparisonOp::EndsWith => Ok(left
                .as_display_string()
                .ends_with(&right.as_display_string())),
            ComparisonOp::Matches => {
                Ok(self.regex_match(&left.as_display_string(), &right.as_display_string()))
            }
            ComparisonOp::InList => Ok(self.in_list(&left, &right)),
        }
    }

    fn visit_logical(&mut self, condition: &LogicalCondition) -> Self::Output {
        match condition.op {
            LogicalOp::And => {
                for operand in &condition.operands {
                    if !self.evaluate_condition(operand)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOp::Or => {
                for operand in &condition.operands {
                    if self.evaluate_condition(operand)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalOp::Not => {
                let operand = condition.operands.first().ok_or_else(|| {
                    EngineError::Internal("'not' is missing its operand".into())
                })?;
                Ok(!self.evaluate_condition(operand)?)
            }
        }
    }

    fn visit_expression(&mut self, condition: &ExpressionCondition) -> Self::Output {
        let value = self.evaluate(&condition.expression)?;
        Ok(value.is_truthy())
    }
}
