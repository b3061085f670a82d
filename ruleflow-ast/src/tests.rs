use bigdecimal::BigDecimal;
use ruleflow_diagnostics::SourceSpan;

use crate::*;

fn num(n: i64) -> Expression {
    Expression::Literal(LiteralExpr {
        value: LiteralValue::Number(BigDecimal::from(n)),
        span: SourceSpan::new(0, 1, 2),
    })
}

fn var(name: &str) -> Expression {
    Expression::Variable(VariableExpr {
        name: name.to_string(),
        property_path: Vec::new(),
        index: None,
        span: SourceSpan::new(0, 3, 4),
    })
}

#[test]
fn literal_display_forms() {
    assert_eq!(LiteralValue::String("PRIME".into()).to_string(), "\"PRIME\"");
    assert_eq!(LiteralValue::Boolean(true).to_string(), "true");
    assert_eq!(LiteralValue::Null.to_string(), "null");
    assert_eq!(
        LiteralValue::List(vec![
            LiteralValue::Number(BigDecimal::from(1)),
            LiteralValue::Number(BigDecimal::from(2)),
        ])
        .to_string(),
        "[1, 2]"
    );
    // Escapes survive the canonical form
    assert_eq!(
        LiteralValue::String("a\"b\n".into()).to_string(),
        "\"a\\\"b\\n\""
    );
}

#[test]
fn expression_display_is_canonical() {
    let expr = Expression::Binary(BinaryExpr {
        op: BinaryOp::Divide,
        left: Box::new(var("existingDebt")),
        right: Box::new(var("annualIncome")),
        span: SourceSpan::default(),
    });
    assert_eq!(expr.to_string(), "(existingDebt / annualIncome)");

    let call = Expression::Arithmetic(ArithmeticExpr {
        op: ArithmeticOp::Min,
        operands: vec![var("a"), num(10)],
        span: SourceSpan::default(),
    });
    assert_eq!(call.to_string(), "min(a, 10)");
}

#[test]
fn variable_display_with_path_and_index() {
    let expr = Expression::Variable(VariableExpr {
        name: "user".into(),
        property_path: vec!["profile".into(), "age".into()],
        index: None,
        span: SourceSpan::default(),
    });
    assert_eq!(expr.to_string(), "user.profile.age");

    let indexed = Expression::Variable(VariableExpr {
        name: "items".into(),
        property_path: Vec::new(),
        index: Some(Box::new(num(2))),
        span: SourceSpan::default(),
    });
    assert_eq!(indexed.to_string(), "items[2]");
}

#[test]
fn condition_display_between() {
    let condition = Condition::Comparison(ComparisonCondition {
        op: ComparisonOp::Between,
        left: var("age"),
        right: Some(num(18)),
        range_end: Some(num(65)),
        span: SourceSpan::default(),
    });
    assert_eq!(condition.to_string(), "age between 18 and 65");
}

#[test]
fn action_display_forms() {
    let set = Action::Set(SetAction {
        variable: "tier".into(),
        value: Expression::Literal(LiteralExpr {
            value: LiteralValue::String("PRIME".into()),
            span: SourceSpan::default(),
        }),
        span: SourceSpan::default(),
    });
    assert_eq!(set.to_string(), "set tier to \"PRIME\"");

    let foreach = Action::ForEach(ForEachAction {
        variable: "item".into(),
        index_variable: Some("idx".into()),
        iterable: var("items"),
        body: vec![Action::Arithmetic(ArithmeticAction {
            op: ArithmeticActionOp::Add,
            variable: "total".into(),
            value: var("item"),
            span: SourceSpan::default(),
        })],
        span: SourceSpan::default(),
    });
    assert_eq!(foreach.to_string(), "forEach item, idx in items: add item to total");
}

#[test]
fn is_constant_and_variable_references() {
    assert!(num(1).is_constant());
    assert!(!var("x").is_constant());
    assert!(!num(1).has_variable_references());
    assert!(var("x").has_variable_references());

    let mixed = Expression::Binary(BinaryExpr {
        op: BinaryOp::Add,
        left: Box::new(num(1)),
        right: Box::new(var("x")),
        span: SourceSpan::default(),
    });
    assert!(!mixed.is_constant());
    assert!(mixed.has_variable_references());
}

#[test]
fn complexity_counts_nodes() {
    let expr = Expression::Binary(BinaryExpr {
        op: BinaryOp::Add,
        left: Box::new(num(1)),
        right: Box::new(var("x")),
        span: SourceSpan::default(),
    });
    assert_eq!(expr.complexity(), 3);
}

#[test]
fn expression_types() {
    assert_eq!(num(1).expression_type(), ExpressionType::Number);
    assert_eq!(var("x").expression_type(), ExpressionType::Any);

    let comparison = Expression::Binary(BinaryExpr {
        op: BinaryOp::AtLeast,
        left: Box::new(var("creditScore")),
        right: Box::new(num(650)),
        span: SourceSpan::default(),
    });
    assert_eq!(comparison.expression_type(), ExpressionType::Boolean);

    let concat = Expression::Binary(BinaryExpr {
        op: BinaryOp::Add,
        left: Box::new(Expression::Literal(LiteralExpr {
            value: LiteralValue::String("a".into()),
            span: SourceSpan::default(),
        })),
        right: Box::new(var("x")),
        span: SourceSpan::default(),
    });
    assert_eq!(concat.expression_type(), ExpressionType::String);
}

#[test]
fn strip_spans_enables_structural_equality() {
    let with_spans = Expression::Binary(BinaryExpr {
        op: BinaryOp::Add,
        left: Box::new(num(1)),
        right: Box::new(var("x")),
        span: SourceSpan::new(3, 10, 20),
    });
    let without = Expression::Binary(BinaryExpr {
        op: BinaryOp::Add,
        left: Box::new(num(1).strip_spans()),
        right: Box::new(var("x").strip_spans()),
        span: SourceSpan::default(),
    });
    assert_ne!(with_spans, without);
    assert_eq!(with_spans.strip_spans(), without);
}

#[test]
fn rule_collects_section_paths() {
    let rule = Rule {
        name: "credit tiering".into(),
        description: None,
        version: None,
        metadata: Default::default(),
        input_decl: Default::default(),
        output_decl: Default::default(),
        constants: Vec::new(),
        body: RuleBody::Simple {
            when: vec![Condition::Expression(ExpressionCondition {
                expression: var("approved"),
                span: SourceSpan::default(),
            })],
            then_actions: vec![Action::Set(SetAction {
                variable: "tier".into(),
                value: num(1),
                span: SourceSpan::default(),
            })],
            else_actions: vec![Action::Set(SetAction {
                variable: "tier".into(),
                value: num(2),
                span: SourceSpan::default(),
            })],
        },
        circuit_breaker: None,
    };

    let conditions = rule.conditions_with_paths();
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].0, "when[0]");

    let actions = rule.actions_with_paths();
    let paths: Vec<_> = actions.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["then[0]", "else[0]"]);
}

#[test]
fn rule_serializes_round_trip() {
    let rule = Rule {
        name: "r".into(),
        description: Some("a rule".into()),
        version: Some("1.0".into()),
        metadata: Default::default(),
        input_decl: [("creditScore".to_string(), "number".to_string())].into(),
        output_decl: Default::default(),
        constants: vec![ConstantDecl {
            name: "MIN_CREDIT_SCORE".into(),
            code: "MIN_CREDIT_SCORE".into(),
            type_label: None,
            default: Some(LiteralValue::Number(BigDecimal::from(650))),
        }],
        body: RuleBody::ThenOnly {
            then_actions: vec![Action::CircuitBreaker(CircuitBreakerAction {
                message: "halt".into(),
                error_code: None,
                span: SourceSpan::default(),
            })],
        },
        circuit_breaker: Some(CircuitBreakerConfig::default()),
    };

    let bytes = serde_json::to_vec(&rule).unwrap();
    let back: Rule = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(rule, back);
}
