//! Ruleflow AST
//!
//! Abstract syntax tree nodes for the rule DSL: three tagged sums
//! (expressions, conditions, actions) plus the whole-rule model assembled
//! from a YAML document. Nodes are immutable after construction and cheap to
//! share behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod actions;
pub mod conditions;
pub mod expressions;

#[cfg(test)]
mod tests;

pub use actions::{
    Action, ActionVisitor, ArithmeticAction, ArithmeticActionOp, AssignmentAction,
    CalculateAction, CircuitBreakerAction, ConditionalAction, DoWhileAction, ForEachAction,
    FunctionCallAction, ListAction, ListActionOp, RunAction, SetAction, WhileAction,
};
pub use conditions::{
    ComparisonCondition, ComparisonOp, Condition, ConditionVisitor, ExpressionCondition,
    LogicalCondition, LogicalOp,
};
pub use expressions::{
    ArithmeticExpr, ArithmeticOp, BinaryExpr, BinaryOp, Expression, ExpressionType,
    ExpressionVisitor, FunctionCallExpr, JsonPathExpr, LiteralExpr, LiteralValue, RestCallExpr,
    UnaryExpr, UnaryOp, VariableExpr,
};

/// An externally resolved constant declared by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantDecl {
    /// The UPPER_SNAKE name the rule refers to.
    pub name: String,
    /// The lookup code in the constant store; defaults to the name.
    pub code: String,
    pub type_label: Option<String>,
    /// Fallback used when the store cannot provide the value.
    pub default: Option<LiteralValue>,
}

/// Circuit-breaker tuning carried on the rule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub failure_threshold: u32,
    pub timeout_ms: u64,
    pub recovery_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 3,
            timeout_ms: 30_000,
            recovery_timeout_ms: 60_000,
        }
    }
}

/// The `if`/`then`/`else` body shape with optional nesting inside each
/// branch block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexBody {
    pub condition: Condition,
    pub then_block: ActionBlock,
    pub else_block: Option<ActionBlock>,
}

/// A group of actions, optionally followed by a nested conditional body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBlock {
    pub actions: Vec<Action>,
    pub nested: Option<Box<ComplexBody>>,
}

/// One member of a multi-rule set, with its own body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub body: RuleBody,
}

/// The four body shapes a rule document can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleBody {
    /// `when` conditions (implicit conjunction) with `then`/`else` actions.
    Simple {
        when: Vec<Condition>,
        then_actions: Vec<Action>,
        else_actions: Vec<Action>,
    },
    /// A set of named sub-rules evaluated in declaration order.
    Multi { rules: Vec<SubRule> },
    /// Structured `if`/`then`/`else` with nested blocks.
    Complex(ComplexBody),
    /// Unconditional actions.
    ThenOnly { then_actions: Vec<Action> },
}

/// A whole parsed rule: metadata, declarations and one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub metadata: BTreeMap<String, LiteralValue>,
    /// Declared input names mapped to type labels (`any` when undeclared).
    pub input_decl: BTreeMap<String, String>,
    pub output_decl: BTreeMap<String, String>,
    pub constants: Vec<ConstantDecl>,
    pub body: RuleBody,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Rule {
    /// All conditions in the body, paired with a section path such as
    /// `when[0]` or `rules[1].when[0]`.
    pub fn conditions_with_paths(&self) -> Vec<(String, &Condition)> {
        let mut out = Vec::new();
        collect_body_conditions(&self.body, "", &mut out);
        out
    }

    /// All actions in the body, paired with a section path such as
    /// `then[2]` or `rules[0].else[1]`.
    pub fn actions_with_paths(&self) -> Vec<(String, &Action)> {
        let mut out = Vec::new();
        collect_body_actions(&self.body, "", &mut out);
        out
    }
}

fn collect_body_conditions<'a>(
    body: &'a RuleBody,
    prefix: &str,
    out: &mut Vec<(String, &'a Condition)>,
) {
    match body {
        RuleBody::Simple { when, .. } => {
            for (i, condition) in when.iter().enumerate() {
                out.push((format!("{}when[{}]", prefix, i), condition));
            }
        }
        RuleBody::Multi { rules } => {
            for (i, sub) in rules.iter().enumerate() {
                collect_body_conditions(&sub.body, &format!("{}rules[{}].", prefix, i), out);
            }
        }
        RuleBody::Complex(complex) => collect_complex_conditions(complex, prefix, out),
        RuleBody::ThenOnly { .. } => {}
    }
}

fn collect_complex_conditions<'a>(
    complex: &'a ComplexBody,
    prefix: &str,
    out: &mut Vec<(String, &'a Condition)>,
) {
    out.push((format!("{}if", prefix), &complex.condition));
    if let Some(nested) = &complex.then_block.nested {
        collect_complex_conditions(nested, &format!("{}then.", prefix), out);
    }
    if let Some(else_block) = &complex.else_block {
        if let Some(nested) = &else_block.nested {
            collect_complex_conditions(nested, &format!("{}else.", prefix), out);
        }
    }
}

fn collect_body_actions<'a>(
    body: &'a RuleBody,
    prefix: &str,
    out: &mut Vec<(String, &'a Action)>,
) {
    match body {
        RuleBody::Simple {
            then_actions,
            else_actions,
            ..
        } => {
            for (i, action) in then_actions.iter().enumerate() {
                out.push((format!("{}then[{}]", prefix, i), action));
            }
            for (i, action) in else_actions.iter().enumerate() {
                out.push((format!("{}else[{}]", prefix, i), action));
            }
        }
        RuleBody::Multi { rules } => {
            for (i, sub) in rules.iter().enumerate() {
                collect_body_actions(&sub.body, &format!("{}rules[{}].", prefix, i), out);
            }
        }
        RuleBody::Complex(complex) => collect_complex_actions(complex, prefix, out),
        RuleBody::ThenOnly { then_actions } => {
            for (i, action) in then_actions.iter().enumerate() {
                out.push((format!("{}then[{}]", prefix, i), action));
            }
        }
    }
}

fn collect_complex_actions<'a>(
    complex: &'a ComplexBody,
    prefix: &str,
    out: &mut Vec<(String, &'a Action)>,
) {
    for (i, action) in complex.then_block.actions.iter().enumerate() {
        out.push((format!("{}then[{}]", prefix, i), action));
    }
    if let Some(nested) = &complex.then_block.nested {
        collect_complex_actions(nested, &format!("{}then.", prefix), out);
    }
    if let Some(else_block) = &complex.else_block {
        for (i, action) in else_block.actions.iter().enumerate() {
            out.push((format!("{}else[{}]", prefix, i), action));
        }
        if let Some(nested) = &else_block.nested {
            collect_complex_actions(nested, &format!("{}else.", prefix), out);
        }
    }
}
