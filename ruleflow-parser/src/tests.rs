use bigdecimal::BigDecimal;
use ruleflow_ast::*;
use ruleflow_diagnostics::ErrorCode;
use std::str::FromStr;

use crate::{parse_action, parse_actions, parse_condition, parse_expression};

fn expr(source: &str) -> Expression {
    parse_expression(source, 0).unwrap_or_else(|d| panic!("parse failed for {:?}: {}", source, d))
}

fn cond(source: &str) -> Condition {
    parse_condition(source, 0).unwrap_or_else(|d| panic!("parse failed for {:?}: {}", source, d))
}

fn action(source: &str) -> Action {
    parse_action(source, 0).unwrap_or_else(|d| panic!("parse failed for {:?}: {}", source, d))
}

#[test]
fn parses_arithmetic_precedence() {
    let parsed = expr("1 + 2 * 3");
    let Expression::Binary(add) = &parsed else {
        panic!("expected binary, got {:?}", parsed)
    };
    assert_eq!(add.op, BinaryOp::Add);
    let Expression::Binary(mul) = add.right.as_ref() else {
        panic!("expected nested multiply")
    };
    assert_eq!(mul.op, BinaryOp::Multiply);
}

#[test]
fn power_is_right_associative_and_binds_tighter_than_unary() {
    let parsed = expr("2 ** 3 ** 2");
    let Expression::Binary(outer) = &parsed else { panic!() };
    assert_eq!(outer.op, BinaryOp::Power);
    let Expression::Binary(inner) = outer.right.as_ref() else {
        panic!("expected right-nested power")
    };
    assert_eq!(inner.op, BinaryOp::Power);
}

#[test]
fn word_and_symbol_comparisons_normalize() {
    let word = expr("creditScore at_least 650");
    let symbol = expr("creditScore >= 650");
    assert_eq!(word.strip_spans(), symbol.strip_spans());

    let word = expr("a equals b");
    let symbol = expr("a == b");
    assert_eq!(word.strip_spans(), symbol.strip_spans());
}

#[test]
fn parses_variables_with_paths_and_indexes() {
    let parsed = expr("user.profile.age");
    let Expression::Variable(variable) = &parsed else { panic!() };
    assert_eq!(variable.name, "user");
    assert_eq!(variable.property_path, vec!["profile", "age"]);
    assert!(variable.index.is_none());

    let parsed = expr("items[2]");
    let Expression::Variable(variable) = &parsed else { panic!() };
    assert_eq!(variable.name, "items");
    assert!(variable.index.is_some());
}

#[test]
fn lowers_known_calls() {
    assert!(matches!(
        expr("min(a, 10)"),
        Expression::Arithmetic(ArithmeticExpr {
            op: ArithmeticOp::Min,
            ..
        })
    ));
    assert!(matches!(
        expr("round(ratio, 2)"),
        Expression::Arithmetic(ArithmeticExpr {
            op: ArithmeticOp::Round,
            ..
        })
    ));
    assert!(matches!(
        expr("exists(middleName)"),
        Expression::Unary(UnaryExpr {
            op: UnaryOp::Exists,
            ..
        })
    ));
    assert!(matches!(
        expr("json_path(payload, \"items[0].price\")"),
        Expression::JsonPath(_)
    ));
    assert!(matches!(
        expr("rest_call(\"get\", scoreUrl)"),
        Expression::RestCall(RestCallExpr { ref method, .. }) if method == "GET"
    ));
    // Unknown names stay generic calls
    assert!(matches!(
        expr("calculate_loan_payment(principal, rate, term)"),
        Expression::FunctionCall(_)
    ));
}

#[test]
fn list_literals_hold_constants_only() {
    let parsed = expr("[\"A\", \"B\"]");
    let Expression::Literal(literal) = &parsed else { panic!() };
    assert!(matches!(literal.value, LiteralValue::List(ref items) if items.len() == 2));

    let err = parse_expression("[a, b]", 0).unwrap_err();
    assert!(err.has_errors());
}

#[test]
fn parses_simple_condition() {
    let parsed = cond("creditScore at_least 650");
    let Condition::Comparison(comparison) = &parsed else { panic!() };
    assert_eq!(comparison.op, ComparisonOp::AtLeast);
    assert!(comparison.range_end.is_none());
}

#[test]
fn parses_between_with_range_end() {
    let parsed = cond("age between 18 and 65");
    let Condition::Comparison(comparison) = &parsed else { panic!() };
    assert_eq!(comparison.op, ComparisonOp::Between);
    assert!(comparison.right.is_some());
    assert!(comparison.range_end.is_some());
}

#[test]
fn logical_conditions_are_n_ary() {
    let parsed = cond("a equals 1 and b equals 2 and c equals 3");
    let Condition::Logical(logical) = &parsed else { panic!() };
    assert_eq!(logical.op, LogicalOp::And);
    assert_eq!(logical.operands.len(), 3);
}

#[test]
fn between_binds_its_and_before_logical_and() {
    let parsed = cond("age between 18 and 65 and status equals \"ACTIVE\"");
    let Condition::Logical(logical) = &parsed else {
        panic!("expected logical and, got {:?}", parsed)
    };
    assert_eq!(logical.operands.len(), 2);
    assert!(matches!(
        &logical.operands[0],
        Condition::Comparison(c) if c.op == ComparisonOp::Between
    ));
}

#[test]
fn grouped_conditions_and_grouped_operands() {
    let parsed = cond("(a equals 1 or b equals 2) and c equals 3");
    let Condition::Logical(outer) = &parsed else { panic!() };
    assert_eq!(outer.op, LogicalOp::And);
    assert!(matches!(
        &outer.operands[0],
        Condition::Logical(inner) if inner.op == LogicalOp::Or
    ));

    // Parenthesized arithmetic still reaches the comparison
    let parsed = cond("(a + b) greater_than 10");
    assert!(matches!(
        &parsed,
        Condition::Comparison(c) if c.op == ComparisonOp::GreaterThan
    ));
}

#[test]
fn bare_expressions_become_expression_conditions() {
    assert!(matches!(cond("approved"), Condition::Expression(_)));
}

#[test]
fn parses_set_and_calculate() {
    let parsed = action("set tier to \"PRIME\"");
    let Action::Set(set) = &parsed else { panic!() };
    assert_eq!(set.variable, "tier");

    let parsed = action("calculate dti as existingDebt / annualIncome");
    let Action::Calculate(calculate) = &parsed else { panic!() };
    assert_eq!(calculate.variable, "dti");
    assert!(matches!(
        &calculate.expression,
        Expression::Binary(b) if b.op == BinaryOp::Divide
    ));
}

#[test]
fn parses_call_action() {
    let parsed = action("call log_decision with [tier, approved]");
    let Action::FunctionCall(call) = &parsed else { panic!() };
    assert_eq!(call.function, "log_decision");
    assert_eq!(call.arguments.len(), 2);
}

#[test]
fn parses_conditional_action_with_else() {
    let parsed = action("if creditScore at_least 700 then set tier to \"PRIME\" else set tier to \"STANDARD\", set approved to false");
    let Action::Conditional(conditional) = &parsed else { panic!() };
    assert_eq!(conditional.then_actions.len(), 1);
    assert_eq!(conditional.else_actions.len(), 2);
}

#[test]
fn parses_arithmetic_actions() {
    assert!(matches!(
        action("add 5 to total"),
        Action::Arithmetic(ArithmeticAction {
            op: ArithmeticActionOp::Add,
            ..
        })
    ));
    assert!(matches!(
        action("subtract fee from balance"),
        Action::Arithmetic(ArithmeticAction {
            op: ArithmeticActionOp::Subtract,
            ..
        })
    ));
    let parsed = action("multiply rate by 2");
    let Action::Arithmetic(arithmetic) = &parsed else { panic!() };
    assert_eq!(arithmetic.op, ArithmeticActionOp::Multiply);
    assert_eq!(arithmetic.variable, "rate");
}

#[test]
fn parses_list_actions() {
    assert!(matches!(
        action("append code to reasons"),
        Action::List(ListAction {
            op: ListActionOp::Append,
            ..
        })
    ));
    assert!(matches!(
        action("remove code from reasons"),
        Action::List(ListAction {
            op: ListActionOp::Remove,
            ..
        })
    ));
}

#[test]
fn parses_circuit_breaker() {
    let parsed = action("circuit_breaker \"Score too low\"");
    let Action::CircuitBreaker(breaker) = &parsed else { panic!() };
    assert_eq!(breaker.message, "Score too low");
}

#[test]
fn parses_for_each_with_index() {
    let parsed = action("forEach item, idx in items: add item to total; append idx to seen");
    let Action::ForEach(for_each) = &parsed else { panic!() };
    assert_eq!(for_each.variable, "item");
    assert_eq!(for_each.index_variable.as_deref(), Some("idx"));
    assert_eq!(for_each.body.len(), 2);
}

#[test]
fn parses_while_and_do_while() {
    let parsed = action("while counter less_than 10: add 1 to counter");
    let Action::While(while_action) = &parsed else { panic!() };
    assert_eq!(while_action.body.len(), 1);

    let parsed = action("do: add 1 to counter; set seen to true while counter less_than 10");
    let Action::DoWhile(do_while) = &parsed else { panic!() };
    assert_eq!(do_while.body.len(), 2);
}

#[test]
fn display_round_trips_structurally() {
    let sources = [
        "set tier to \"PRIME\"",
        "calculate dti as (existingDebt / annualIncome)",
        "if creditScore at_least 700 then set tier to \"PRIME\" else set tier to \"STANDARD\"",
        "forEach item in items: add item to total",
        "while counter less_than 10: add 1 to counter",
        "do: add 1 to counter while counter less_than 10",
        "append code to reasons",
        "circuit_breaker \"halt\"",
        "call log_decision with [tier]",
    ];
    for source in sources {
        let first = action(source);
        let reparsed = parse_action(&first.to_string(), 0)
            .unwrap_or_else(|d| panic!("re-parse failed for {:?}: {}", first.to_string(), d));
        assert_eq!(first.strip_spans(), reparsed.strip_spans(), "source: {}", source);
    }
}

#[test]
fn condition_display_round_trips() {
    let sources = [
        "creditScore at_least 650",
        "age between 18 and 65",
        "a equals 1 and b equals 2",
        "not (a equals 1 or b equals 2)",
        "status in_list [\"A\", \"B\"]",
        "(a + b) greater_than 10",
    ];
    for source in sources {
        let first = cond(source);
        let reparsed = parse_condition(&first.to_string(), 0)
            .unwrap_or_else(|d| panic!("re-parse failed for {:?}: {}", first.to_string(), d));
        assert_eq!(first.strip_spans(), reparsed.strip_spans(), "source: {}", source);
    }
}

#[test]
fn expression_display_round_trips() {
    let sources = [
        "1 + 2 * 3",
        "min(a, 10)",
        "round(existingDebt / annualIncome, 4)",
        "-x",
        "not approved",
        "user.profile.age",
        "items[2]",
        "json_path(payload, \"items[0].price\")",
        "\"a\" + \"b\"",
    ];
    for source in sources {
        let first = expr(source);
        let reparsed = parse_expression(&first.to_string(), 0)
            .unwrap_or_else(|d| panic!("re-parse failed for {:?}: {}", first.to_string(), d));
        assert_eq!(first.strip_spans(), reparsed.strip_spans(), "source: {}", source);
    }
}

#[test]
fn errors_carry_stable_codes_and_suggestions() {
    let err = parse_action("set tier \"PRIME\"", 0).unwrap_err();
    let first = err.first_error().unwrap();
    assert_eq!(first.code, ErrorCode::ParseExpectedToken);
    assert!(!first.suggestions.is_empty());

    let err = parse_action("jump to conclusions", 0).unwrap_err();
    assert_eq!(err.first_error().unwrap().code, ErrorCode::ParseInvalidAction);

    let err = parse_expression("1 +", 0).unwrap_err();
    assert_eq!(err.first_error().unwrap().code, ErrorCode::ParseUnexpectedEof);
}

#[test]
fn batch_mode_recovers_and_collects_all_diagnostics() {
    let err = parse_actions(
        "set tier \"PRIME\", bogus action here, set approved to true",
        0,
    )
    .unwrap_err();
    // Both broken statements reported, not just the first
    assert!(err.len() >= 2, "expected multiple diagnostics, got {}", err.len());
}

#[test]
fn batch_mode_parses_clean_lists() {
    let actions = parse_actions("set tier to \"PRIME\", set approved to true", 0).unwrap();
    assert_eq!(actions.len(), 2);
    assert!(matches!(actions[0], Action::Set(_)));
    assert!(matches!(actions[1], Action::Set(_)));
}

#[test]
fn number_literals_stay_decimal() {
    let parsed = expr("0.1 + 0.2");
    let Expression::Binary(add) = &parsed else { panic!() };
    let Expression::Literal(left) = add.left.as_ref() else { panic!() };
    assert_eq!(
        left.value,
        LiteralValue::Number(BigDecimal::from_str("0.1").unwrap())
    );
}
