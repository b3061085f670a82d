//! Condition nodes for the rule DSL

use ruleflow_diagnostics::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expressions::Expression;

/// Comparison operators after alias normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    AtLeast,
    AtMost,
    Between,
    NotBetween,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    InList,
}

impl ComparisonOp {
    /// The canonical word form.
    pub fn word(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "equals",
            ComparisonOp::NotEquals => "not_equals",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::AtLeast => "at_least",
            ComparisonOp::AtMost => "at_most",
            ComparisonOp::Between => "between",
            ComparisonOp::NotBetween => "not_between",
            ComparisonOp::Contains => "contains",
            ComparisonOp::StartsWith => "starts_with",
            ComparisonOp::EndsWith => "ends_with",
            ComparisonOp::Matches => "matches",
            ComparisonOp::InList => "in_list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// A comparison between expressions; `range_end` is only set for
/// `between` / `not_between`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCondition {
    pub op: ComparisonOp,
    pub left: Expression,
    pub right: Option<Expression>,
    pub range_end: Option<Expression>,
    pub span: SourceSpan,
}

/// Logical composition; `not` has one operand, `and`/`or` take two or more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalCondition {
    pub op: LogicalOp,
    pub operands: Vec<Condition>,
    pub span: SourceSpan,
}

/// A bare expression coerced to boolean through truthiness rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionCondition {
    pub expression: Expression,
    pub span: SourceSpan,
}

/// Condition nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Comparison(ComparisonCondition),
    Logical(LogicalCondition),
    Expression(ExpressionCondition),
}

/// Visitor over condition nodes.
pub trait ConditionVisitor {
    type Output;

    fn visit_comparison(&mut self, condition: &ComparisonCondition) -> Self::Output;
    fn visit_logical(&mut self, condition: &LogicalCondition) -> Self::Output;
    fn visit_expression(&mut self, condition: &ExpressionCondition) -> Self::Output;
}

impl Condition {
    pub fn accept<V: ConditionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Condition::Comparison(c) => visitor.visit_comparison(c),
            Condition::Logical(c) => visitor.visit_logical(c),
            Condition::Expression(c) => visitor.visit_expression(c),
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Condition::Comparison(c) => c.span,
            Condition::Logical(c) => c.span,
            Condition::Expression(c) => c.span,
        }
    }

    pub fn has_variable_references(&self) -> bool {
        match self {
            Condition::Comparison(c) => {
                c.left.has_variable_references()
                    || c.right.as_ref().is_some_and(Expression::has_variable_references)
                    || c.range_end.as_ref().is_some_and(Expression::has_variable_references)
            }
            Condition::Logical(c) => c.operands.iter().any(Condition::has_variable_references),
            Condition::Expression(c) => c.expression.has_variable_references(),
        }
    }

    pub fn complexity(&self) -> usize {
        match self {
            Condition::Comparison(c) => {
                1 + c.left.complexity()
                    + c.right.as_ref().map_or(0, Expression::complexity)
                    + c.range_end.as_ref().map_or(0, Expression::complexity)
            }
            Condition::Logical(c) => {
                1 + c.operands.iter().map(Condition::complexity).sum::<usize>()
            }
            Condition::Expression(c) => c.expression.complexity(),
        }
    }

    /// Count of logical operators in the tree; the performance validator
    /// flags conditions that chain too many. An n-ary `and`/`or` node
    /// counts one operator per joint.
    pub fn logical_operator_count(&self) -> usize {
        match self {
            Condition::Comparison(_) | Condition::Expression(_) => 0,
            Condition::Logical(c) => {
                let own = match c.op {
                    LogicalOp::Not => 1,
                    LogicalOp::And | LogicalOp::Or => c.operands.len().saturating_sub(1).max(1),
                };
                own + c
                    .operands
                    .iter()
                    .map(Condition::logical_operator_count)
                    .sum::<usize>()
            }
        }
    }

    pub fn strip_spans(&self) -> Condition {
        let mut stripped = self.clone();
        stripped.reset_spans();
        stripped
    }

    pub(crate) fn reset_spans(&mut self) {
        match self {
            Condition::Comparison(c) => {
                c.span = SourceSpan::default();
                c.left = c.left.strip_spans();
                if let Some(right) = &c.right {
                    c.right = Some(right.strip_spans());
                }
                if let Some(range_end) = &c.range_end {
                    c.range_end = Some(range_end.strip_spans());
                }
            }
            Condition::Logical(c) => {
                c.span = SourceSpan::default();
                for operand in &mut c.operands {
                    operand.reset_spans();
                }
            }
            Condition::Expression(c) => {
                c.span = SourceSpan::default();
                c.expression = c.expression.strip_spans();
            }
        }
    }
}

impl fmt::Display for Condition {
    /// Canonical source form; re-parsing it reproduces the same structure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison(c) => match c.op {
                ComparisonOp::Between | ComparisonOp::NotBetween => write!(
                    f,
                    "{} {} {} and {}",
                    c.left,
                    c.op.word(),
                    c.right.as_ref().expect("between requires a lower bound"),
                    c.range_end.as_ref().expect("between requires an upper bound"),
                ),
                _ => match &c.right {
                    Some(right) => write!(f, "{} {} {}", c.left, c.op.word(), right),
                    None => write!(f, "{} {}", c.left, c.op.word()),
                },
            },
            Condition::Logical(c) => match c.op {
                LogicalOp::Not => write!(f, "not ({})", c.operands[0]),
                LogicalOp::And | LogicalOp::Or => {
                    let word = if c.op == LogicalOp::And { "and" } else { "or" };
                    write!(f, "(")?;
                    for (i, operand) in c.operands.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {} ", word)?;
                        }
                        write!(f, "{}", operand)?;
                    }
                    write!(f, ")")
                }
            },
            Condition::Expression(c) => write!(f, "{}", c.expression),
        }
    }
}
