//! Constant auto-detection
//!
//! UPPER_SNAKE variable references anywhere in a rule body are constant
//! reads; they are collected before evaluation so the store sees one
//! `get_many` batch per evaluation.

use std::collections::BTreeSet;

use regex::Regex;
use ruleflow_ast::*;

pub fn referenced_constants(rule: &Rule, pattern: &Regex) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for (_, condition) in rule.conditions_with_paths() {
        collect_condition(condition, pattern, &mut names);
    }
    for (_, action) in rule.actions_with_paths() {
        collect_action(action, pattern, &mut names);
    }
    names
}

fn collect_action(action: &Action, pattern: &Regex, names: &mut BTreeSet<String>) {
    match action {
        Action::Set(a) => collect_expression(&a.value, pattern, names),
        Action::Calculate(a) => collect_expression(&a.expression, pattern, names),
        Action::Run(a) => collect_expression(&a.expression, pattern, names),
        Action::Assignment(a) => collect_expression(&a.value, pattern, names),
        Action::FunctionCall(a) => {
            for argument in &a.arguments {
                collect_expression(argument, pattern, names);
            }
        }
        Action::Conditional(a) => {
            collect_condition(&a.condition, pattern, names);
            for action in a.then_actions.iter().chain(&a.else_actions) {
                collect_action(action, pattern, names);
            }
        }
        Action::Arithmetic(a) => collect_expression(&a.value, pattern, names),
        Action::List(a) => collect_expression(&a.value, pattern, names),
        Action::CircuitBreaker(_) => {}
        Action::ForEach(a) => {
            collect_expression(&a.iterable, pattern, names);
            for action in &a.body {
                collect_action(action, pattern, names);
            }
        }
        Action::While(a) => {
            collect_condition(&a.condition, pattern, names);
            for action in &a.body {
                collect_action(action, pattern, names);
            }
        }
        Action::DoWhile(a) => {
            collect_condition(&a.condition, pattern, names);
            for action in &a.body {
                collect_action(action, pattern, names);
            }
        }
    }
}

fn collect_condition(condition: &Condition, pattern: &Regex, names: &mut BTreeSet<String>) {
    match condition {
        Condition::Comparison(c) => {
            collect_expression(&c.left, pattern, names);
            if let Some(right) = &c.right {
                collect_expression(right, pattern, names);
            }
            if let Some(range_end) = &c.range_end {
                collect_expression(range_end, pattern, names);
            }
        }
        Condition::Logical(c) => {
            for operand in &c.operands {
                collect_condition(operand, pattern, names);
            }
        }
        Condition::Expression(c) => collect_expression(&c.expression, pattern, names),
    }
}

fn collect_expression(expression: &Expression, pattern: &Regex, names: &mut BTreeSet<String>) {
    match expression {
        Expression::Literal(_) => {}
        Expression::Variable(e) => {
            if pattern.is_match(&e.name) {
                names.insert(e.name.clone());
            }
            if let Some(index) = &e.index {
                collect_expression(index, pattern, names);
            }
        }
        Expression::Unary(e) => collect_expression(&e.operand, pattern, names),
        Expression::Binary(e) => {
            collect_expression(&e.left, pattern, names);
            collect_expression(&e.right, pattern, names);
        }
        Expression::Arithmetic(e) => {
            for operand in &e.operands {
                collect_expression(operand, pattern, names);
            }
        }
        Expression::FunctionCall(e) => {
            for argument in &e.arguments {
                collect_expression(argument, pattern, names);
            }
        }
        Expression::JsonPath(e) => collect_expression(&e.source, pattern, names),
        Expression::RestCall(e) => {
            collect_expression(&e.url, pattern, names);
            if let Some(body) = &e.body {
                collect_expression(body, pattern, names);
            }
            for (_, value) in &e.headers {
                collect_expression(value, pattern, names);
            }
        }
    }
}
