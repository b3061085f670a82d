//! Action nodes for the rule DSL

use ruleflow_diagnostics::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conditions::Condition;
use crate::expressions::Expression;

/// In-place arithmetic forms: `add 5 to total`, `multiply rate by 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticActionOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// List mutation forms: `append x to items`, `remove x from items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListActionOp {
    Append,
    Prepend,
    Remove,
}

/// `set <variable> to <expression>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAction {
    pub variable: String,
    pub value: Expression,
    pub span: SourceSpan,
}

/// `calculate <variable> as <expression>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateAction {
    pub variable: String,
    pub expression: Expression,
    pub span: SourceSpan,
}

/// `run <variable> as <expression>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAction {
    pub variable: String,
    pub expression: Expression,
    pub span: SourceSpan,
}

/// Direct assignment, produced by the document adapter's
/// `{variable: value}` shorthand; executes exactly like `set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentAction {
    pub variable: String,
    pub value: Expression,
    pub span: SourceSpan,
}

/// `call <function> with [<arguments>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallAction {
    pub function: String,
    pub arguments: Vec<Expression>,
    pub span: SourceSpan,
}

/// `if <condition> then <actions> else <actions>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalAction {
    pub condition: Condition,
    pub then_actions: Vec<Action>,
    pub else_actions: Vec<Action>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticAction {
    pub op: ArithmeticActionOp,
    pub variable: String,
    pub value: Expression,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListAction {
    pub op: ListActionOp,
    pub value: Expression,
    pub list_variable: String,
    pub span: SourceSpan,
}

/// `circuit_breaker "<message>"` — halts the evaluation without failing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerAction {
    pub message: String,
    pub error_code: Option<String>,
    pub span: SourceSpan,
}

/// `forEach <var>[, <index>] in <iterable>: <actions>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachAction {
    pub variable: String,
    pub index_variable: Option<String>,
    pub iterable: Expression,
    pub body: Vec<Action>,
    pub span: SourceSpan,
}

/// `while <condition>: <actions>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileAction {
    pub condition: Condition,
    pub body: Vec<Action>,
    pub span: SourceSpan,
}

/// `do: <actions> while <condition>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoWhileAction {
    pub body: Vec<Action>,
    pub condition: Condition,
    pub span: SourceSpan,
}

/// Action nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Set(SetAction),
    Calculate(CalculateAction),
    Run(RunAction),
    Assignment(AssignmentAction),
    FunctionCall(FunctionCallAction),
    Conditional(ConditionalAction),
    Arithmetic(ArithmeticAction),
    List(ListAction),
    CircuitBreaker(CircuitBreakerAction),
    ForEach(ForEachAction),
    While(WhileAction),
    DoWhile(DoWhileAction),
}

/// Visitor over action nodes.
pub trait ActionVisitor {
    type Output;

    fn visit_set(&mut self, action: &SetAction) -> Self::Output;
    fn visit_calculate(&mut self, action: &CalculateAction) -> Self::Output;
    fn visit_run(&mut self, action: &RunAction) -> Self::Output;
    fn visit_assignment(&mut self, action: &AssignmentAction) -> Self::Output;
    fn visit_function_call(&mut self, action: &FunctionCallAction) -> Self::Output;
    fn visit_conditional(&mut self, action: &ConditionalAction) -> Self::Output;
    fn visit_arithmetic(&mut self, action: &ArithmeticAction) -> Self::Output;
    fn visit_list(&mut self, action: &ListAction) -> Self::Output;
    fn visit_circuit_breaker(&mut self, action: &CircuitBreakerAction) -> Self::Output;
    fn visit_for_each(&mut self, action: &ForEachAction) -> Self::Output;
    fn visit_while(&mut self, action: &WhileAction) -> Self::Output;
    fn visit_do_while(&mut self, action: &DoWhileAction) -> Self::Output;
}

impl Action {
    pub fn accept<V: ActionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Action::Set(a) => visitor.visit_set(a),
            Action::Calculate(a) => visitor.visit_calculate(a),
            Action::Run(a) => visitor.visit_run(a),
            Action::Assignment(a) => visitor.visit_assignment(a),
            Action::FunctionCall(a) => visitor.visit_function_call(a),
            Action::Conditional(a) => visitor.visit_conditional(a),
            Action::Arithmetic(a) => visitor.visit_arithmetic(a),
            Action::List(a) => visitor.visit_list(a),
            Action::CircuitBreaker(a) => visitor.visit_circuit_breaker(a),
            Action::ForEach(a) => visitor.visit_for_each(a),
            Action::While(a) => visitor.visit_while(a),
            Action::DoWhile(a) => visitor.visit_do_while(a),
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Action::Set(a) => a.span,
            Action::Calculate(a) => a.span,
            Action::Run(a) => a.span,
            Action::Assignment(a) => a.span,
            Action::FunctionCall(a) => a.span,
            Action::Conditional(a) => a.span,
            Action::Arithmetic(a) => a.span,
            Action::List(a) => a.span,
            Action::CircuitBreaker(a) => a.span,
            Action::ForEach(a) => a.span,
            Action::While(a) => a.span,
            Action::DoWhile(a) => a.span,
        }
    }

    /// The computed variable the action writes, when statically known.
    pub fn write_target(&self) -> Option<&str> {
        match self {
            Action::Set(a) => Some(&a.variable),
            Action::Calculate(a) => Some(&a.variable),
            Action::Run(a) => Some(&a.variable),
            Action::Assignment(a) => Some(&a.variable),
            Action::Arithmetic(a) => Some(&a.variable),
            Action::List(a) => Some(&a.list_variable),
            _ => None,
        }
    }

    pub fn has_variable_references(&self) -> bool {
        match self {
            Action::Set(a) => a.value.has_variable_references(),
            Action::Calculate(a) => a.expression.has_variable_references(),
            Action::Run(a) => a.expression.has_variable_references(),
            Action::Assignment(a) => a.value.has_variable_references(),
            Action::FunctionCall(a) => {
                a.arguments.iter().any(Expression::has_variable_references)
            }
            Action::Conditional(a) => {
                a.condition.has_variable_references()
                    || a.then_actions.iter().any(Action::has_variable_references)
                    || a.else_actions.iter().any(Action::has_variable_references)
            }
            Action::Arithmetic(_) | Action::List(_) => true,
            Action::CircuitBreaker(_) => false,
            Action::ForEach(a) => {
                a.iterable.has_variable_references()
                    || a.body.iter().any(Action::has_variable_references)
            }
            Action::While(a) => {
                a.condition.has_variable_references()
                    || a.body.iter().any(Action::has_variable_references)
            }
            Action::DoWhile(a) => {
                a.condition.has_variable_references()
                    || a.body.iter().any(Action::has_variable_references)
            }
        }
    }

    pub fn complexity(&self) -> usize {
        match self {
            Action::Set(a) => 1 + a.value.complexity(),
            Action::Calculate(a) => 1 + a.expression.complexity(),
            Action::Run(a) => 1 + a.expression.complexity(),
            Action::Assignment(a) => 1 + a.value.complexity(),
            Action::FunctionCall(a) => {
                1 + a.arguments.iter().map(Expression::complexity).sum::<usize>()
            }
            Action::Conditional(a) => {
                1 + a.condition.complexity()
                    + a.then_actions.iter().map(Action::complexity).sum::<usize>()
                    + a.else_actions.iter().map(Action::complexity).sum::<usize>()
            }
            Action::Arithmetic(a) => 1 + a.value.complexity(),
            Action::List(a) => 1 + a.value.complexity(),
            Action::CircuitBreaker(_) => 1,
            Action::ForEach(a) => {
                1 + a.iterable.complexity()
                    + a.body.iter().map(Action::complexity).sum::<usize>()
            }
            Action::While(a) => {
                1 + a.condition.complexity()
                    + a.body.iter().map(Action::complexity).sum::<usize>()
            }
            Action::DoWhile(a) => {
                1 + a.condition.complexity()
                    + a.body.iter().map(Action::complexity).sum::<usize>()
            }
        }
    }

    pub fn strip_spans(&self) -> Action {
        let mut stripped = self.clone();
        stripped.reset_spans();
        stripped
    }

    pub(crate) fn reset_spans(&mut self) {
        match self {
            Action::Set(a) => {
                a.span = SourceSpan::default();
                a.value = a.value.strip_spans();
            }
            Action::Calculate(a) => {
                a.span = SourceSpan::default();
                a.expression = a.expression.strip_spans();
            }
            Action::Run(a) => {
                a.span = SourceSpan::default();
                a.expression = a.expression.strip_spans();
            }
            Action::Assignment(a) => {
                a.span = SourceSpan::default();
                a.value = a.value.strip_spans();
            }
            Action::FunctionCall(a) => {
                a.span = SourceSpan::default();
                for argument in &mut a.arguments {
                    *argument = argument.strip_spans();
                }
            }
            Action::Conditional(a) => {
                a.span = SourceSpan::default();
                a.condition.reset_spans();
                for action in &mut a.then_actions {
                    action.reset_spans();
                }
                for action in &mut a.else_actions {
                    action.reset_spans();
                }
            }
            Action::Arithmetic(a) => {
                a.span = SourceSpan::default();
                a.value = a.value.strip_spans();
            }
            Action::List(a) => {
                a.span = SourceSpan::default();
                a.value = a.value.strip_spans();
            }
            Action::CircuitBreaker(a) => a.span = SourceSpan::default(),
            Action::ForEach(a) => {
                a.span = SourceSpan::default();
                a.iterable = a.iterable.strip_spans();
                for action in &mut a.body {
                    action.reset_spans();
                }
            }
            Action::While(a) => {
                a.span = SourceSpan::default();
                a.condition.reset_spans();
                for action in &mut a.body {
                    action.reset_spans();
                }
            }
            Action::DoWhile(a) => {
                a.span = SourceSpan::default();
                a.condition.reset_spans();
                for action in &mut a.body {
                    action.reset_spans();
                }
            }
        }
    }
}

fn write_action_list(f: &mut fmt::Formatter<'_>, actions: &[Action], separator: &str) -> fmt::Result {
    for (i, action) in actions.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", action)?;
    }
    Ok(())
}

impl fmt::Display for Action {
    /// Canonical source form; re-parsing it reproduces the same structure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Set(a) => write!(f, "set {} to {}", a.variable, a.value),
            Action::Calculate(a) => write!(f, "calculate {} as {}", a.variable, a.expression),
            Action::Run(a) => write!(f, "run {} as {}", a.variable, a.expression),
            Action::Assignment(a) => write!(f, "set {} to {}", a.variable, a.value),
            Action::FunctionCall(a) => {
                write!(f, "call {} with [", a.function)?;
                for (i, argument) in a.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, "]")
            }
            Action::Conditional(a) => {
                write!(f, "if {} then ", a.condition)?;
                write_action_list(f, &a.then_actions, ", ")?;
                if !a.else_actions.is_empty() {
                    write!(f, " else ")?;
                    write_action_list(f, &a.else_actions, ", ")?;
                }
                Ok(())
            }
            Action::Arithmetic(a) => match a.op {
                ArithmeticActionOp::Add => write!(f, "add {} to {}", a.value, a.variable),
                ArithmeticActionOp::Subtract => {
                    write!(f, "subtract {} from {}", a.value, a.variable)
                }
                ArithmeticActionOp::Multiply => {
                    write!(f, "multiply {} by {}", a.variable, a.value)
                }
                ArithmeticActionOp::Divide => write!(f, "divide {} by {}", a.variable, a.value),
            },
            Action::List(a) => match a.op {
                ListActionOp::Append => write!(f, "append {} to {}", a.value, a.list_variable),
                ListActionOp::Prepend => write!(f, "prepend {} to {}", a.value, a.list_variable),
                ListActionOp::Remove => write!(f, "remove {} from {}", a.value, a.list_variable),
            },
            Action::CircuitBreaker(a) => {
                write!(f, "circuit_breaker \"{}\"", a.message.replace('"', "\\\""))
            }
            Action::ForEach(a) => {
                write!(f, "forEach {}", a.variable)?;
                if let Some(index) = &a.index_variable {
                    write!(f, ", {}", index)?;
                }
                write!(f, " in {}: ", a.iterable)?;
                write_action_list(f, &a.body, "; ")
            }
            Action::While(a) => {
                write!(f, "while {}: ", a.condition)?;
                write_action_list(f, &a.body, "; ")
            }
            Action::DoWhile(a) => {
                write!(f, "do: ")?;
                write_action_list(f, &a.body, "; ")?;
                write!(f, " while {}", a.condition)
            }
        }
    }
}
