//! Action execution
//!
//! The side-effecting half of the evaluation: a visitor that mutates the
//! context. Control flow (conditionals, loops, the circuit breaker) lives
//! here; expression work is delegated to the evaluator over the same
//! context.

use bigdecimal::{BigDecimal, Zero};
use ruleflow_ast::*;

use crate::context::EvaluationContext;
use crate::decimal;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::functions;
use crate::result::EvalEvent;
use crate::services::Services;
use crate::value::Value;

pub struct Executor<'a, 'b> {
    pub ctx: &'a mut EvaluationContext,
    pub services: &'a Services<'b>,
}

impl<'a, 'b> Executor<'a, 'b> {
    pub fn new(ctx: &'a mut EvaluationContext, services: &'a Services<'b>) -> Self {
        Self { ctx, services }
    }

    /// Execute actions in textual order, stopping at cancellation or a
    /// tripped circuit breaker.
    pub fn execute_all(&mut self, actions: &[Action]) -> Result<(), EngineError> {
        for action in actions {
            self.ctx.check_cancelled()?;
            if self.ctx.breaker_tripped() {
                return Ok(());
            }
            action.accept(self)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, expression: &Expression) -> Result<Value, EngineError> {
        Evaluator::new(self.ctx, self.services).evaluate(expression)
    }

    fn evaluate_condition(&mut self, condition: &Condition) -> Result<bool, EngineError> {
        Evaluator::new(self.ctx, self.services).evaluate_condition(condition)
    }

    fn write(&mut self, variable: &str, value: Value) -> Result<(), EngineError> {
        self.ctx
            .write_computed(variable, value, &self.services.config.computed_pattern)
    }

    /// The current numeric value of a variable; unbound and null read as
    /// zero so accumulator patterns work without a priming `set`.
    fn read_number(&mut self, variable: &str) -> Result<BigDecimal, EngineError> {
        match self.ctx.lookup(variable) {
            None | Some(Value::Null) => Ok(BigDecimal::zero()),
            Some(value) => value.as_number().ok_or_else(|| {
                EngineError::Type(format!(
                    "variable '{}' holds {} where a number is needed",
                    variable,
                    value.type_name()
                ))
            }),
        }
    }

    fn run_loop_body(&mut self, body: &[Action]) -> Result<(), EngineError> {
        self.execute_all(body)
    }
}

impl ActionVisitor for Executor<'_, '_> {
    type Output = Result<(), EngineError>;

    fn visit_set(&mut self, action: &SetAction) -> Self::Output {
        let value = self.evaluate(&action.value)?;
        self.write(&action.variable, value)
    }

    fn visit_calculate(&mut self, action: &CalculateAction) -> Self::Output {
        let value = self.evaluate(&action.expression)?;
        self.write(&action.variable, value)
    }

    fn visit_run(&mut self, action: &RunAction) -> Self::Output {
        let value = self.evaluate(&action.expression)?;
        self.write(&action.variable, value)
    }

    fn visit_assignment(&mut self, action: &AssignmentAction) -> Self::Output {
        let value = self.evaluate(&action.value)?;
        self.write(&action.variable, value)
    }

    fn visit_function_call(&mut self, action: &FunctionCallAction) -> Self::Output {
        functions::call_action_function(action, self.ctx, self.services)
    }

    fn visit_conditional(&mut self, action: &ConditionalAction) -> Self::Output {
        if self.evaluate_condition(&action.condition)? {
            self.execute_all(&action.then_actions)
        } else {
            self.execute_all(&action.else_actions)
        }
    }

    fn visit_arithmetic(&mut self, action: &ArithmeticAction) -> Self::Output {
        let current = self.read_number(&action.variable)?;
        let operand = self.evaluate(&action.value)?;
        let operand = operand.as_number().ok_or_else(|| {
            EngineError::Type(format!(
                "arithmetic on '{}' needs a numeric value, got {}",
                action.variable,
                operand.type_name()
            ))
        })?;
        let result = match action.op {
            ArithmeticActionOp::Add => current + operand,
            ArithmeticActionOp::Subtract => current - operand,
            ArithmeticActionOp::Multiply => current * operand,
            ArithmeticActionOp::Divide => {
                decimal::div(&current, &operand, self.services.config.decimal_div_scale)
                    .ok_or_else(|| {
                        EngineError::DivisionByZero(format!("{} / {}", current, operand))
                    })?
            }
        };
        self.write(&action.variable, Value::Number(result))
    }

    fn visit_list(&mut self, action: &ListAction) -> Self::Output {
        let value = self.evaluate(&action.value)?;
        // Missing or non-list targets initialize from whatever is there
        let mut items = match self.ctx.lookup(&action.list_variable) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::List(items)) => items.clone(),
            Some(existing) => vec![existing.clone()],
        };
        match action.op {
            ListActionOp::Append => items.push(value),
            ListActionOp::Prepend => items.insert(0, value),
            ListActionOp::Remove => {
                if let Some(position) = items.iter().position(|item| item == &value) {
                    items.remove(position);
                }
            }
        }
        self.write(&action.list_variable, Value::List(items))
    }

    fn visit_circuit_breaker(&mut self, action: &CircuitBreakerAction) -> Self::Output {
        self.ctx.trip_breaker(action.message.clone());
        self.ctx.add_event(EvalEvent::info(
            action.error_code.clone().unwrap_or_else(|| "CIRCUIT_BREAKER".to_string()),
            format!("circuit breaker tripped: {}", action.message),
        ));
        Ok(())
    }

    fn visit_for_each(&mut self, action: &ForEachAction) -> Self::Output {
        let iterable = self.evaluate(&action.iterable)?;
        let items = match iterable {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            other => {
                self.ctx.add_event(EvalEvent::warning(
                    "EVAL_TYPE_ERROR",
                    format!("forEach needs a list, got {}; skipping loop", other.type_name()),
                ));
                Vec::new()
            }
        };

        let saved_item = self.ctx.lookup(&action.variable).cloned();
        let saved_index = action
            .index_variable
            .as_ref()
            .map(|name| self.ctx.lookup(name).cloned());

        let mut outcome = Ok(());
        for (position, item) in items.into_iter().enumerate() {
            if let Err(error) = self.ctx.check_cancelled() {
                outcome = Err(error);
                break;
            }
            if self.ctx.breaker_tripped() {
                break;
            }
            self.ctx.bind_loop(&action.variable, item);
            if let Some(index_name) = &action.index_variable {
                self.ctx.bind_loop(index_name, Value::from(position as i64));
            }
            if let Err(error) = self.run_loop_body(&action.body) {
                outcome = Err(error);
                break;
            }
        }

        // Restore pre-loop bindings even when the body failed
        self.ctx.restore_loop(&action.variable, saved_item);
        if let Some(index_name) = &action.index_variable {
            self.ctx
                .restore_loop(index_name, saved_index.clone().flatten());
        }
        outcome
    }

    fn visit_while(&mut self, action: &WhileAction) -> Self::Output {
        let cap = self.services.config.loop_max_iterations;
        let mut iterations: u64 = 0;
        loop {
            self.ctx.check_cancelled()?;
            if self.ctx.breaker_tripped() {
                return Ok(());
            }
            if !self.evaluate_condition(&action.condition)? {
                return Ok(());
            }
            if iterations >= cap {
                let message = format!("while loop exceeded {} iterations", cap);
                self.ctx.trip_breaker(message.clone());
                return Err(EngineError::LoopLimit(message));
            }
            iterations += 1;
            self.run_loop_body(&action.body)?;
        }
    }

    fn visit_do_while(&mut self, action: &DoWhileAction) -> Self::Output {
        let cap = self.services.config.loop_max_iterations;
        let mut iterations: u64 = 0;
        loop {
            self.ctx.check_cancelled()?;
            if self.ctx.breaker_tripped() {
                return Ok(());
            }
            if iterations >= cap {
                let message = format!("do-while loop exceeded {} iterations", cap);
                self.ctx.trip_breaker(message.clone());
                return Err(EngineError::LoopLimit(message));
            }
            iterations += 1;
            self.run_loop_body(&action.body)?;
            if !self.evaluate_condition(&action.condition)? {
                return Ok(());
            }
        }
    }
}
