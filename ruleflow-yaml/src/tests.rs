use ruleflow_ast::*;
use ruleflow_diagnostics::SourceMap;

use crate::{body_kind, parse_rule_str};

fn parse(text: &str) -> Rule {
    let mut sources = SourceMap::new();
    parse_rule_str(text, &mut sources).unwrap_or_else(|d| panic!("parse failed: {}", d))
}

#[test]
fn parses_simple_rule_with_string_forms() {
    let rule = parse(
        r#"
name: credit tiering
description: Assigns a pricing tier from the credit score
version: "1.2"
inputs:
  creditScore: number
when:
  - creditScore at_least 700
then:
  - set tier to "PRIME"
  - set approved to true
else:
  - set tier to "STANDARD"
  - set approved to false
"#,
    );

    assert_eq!(rule.name, "credit tiering");
    assert_eq!(rule.version.as_deref(), Some("1.2"));
    assert_eq!(rule.input_decl.get("creditScore").map(String::as_str), Some("number"));

    let RuleBody::Simple {
        when,
        then_actions,
        else_actions,
    } = &rule.body
    else {
        panic!("expected simple body, got {}", body_kind(&rule.body));
    };
    assert_eq!(when.len(), 1);
    assert_eq!(then_actions.len(), 2);
    assert_eq!(else_actions.len(), 2);
}

#[test]
fn scalar_when_and_then() {
    let rule = parse(
        r#"
name: dti check
when: existingDebt / annualIncome at_most 0.43
then: set approved to true, set reviewed to false
"#,
    );
    let RuleBody::Simple {
        when, then_actions, ..
    } = &rule.body
    else {
        panic!()
    };
    assert_eq!(when.len(), 1);
    assert_eq!(then_actions.len(), 2);
}

#[test]
fn inputs_as_sequence_default_to_any() {
    let rule = parse(
        r#"
name: seq inputs
inputs: [creditScore, annualIncome]
then: set approved to true
"#,
    );
    assert_eq!(rule.input_decl.get("creditScore").map(String::as_str), Some("any"));
    assert_eq!(rule.input_decl.len(), 2);
}

#[test]
fn unconditional_then_only_body() {
    let rule = parse(
        r#"
name: fixed outcome
then:
  - set approved to true
"#,
    );
    assert!(matches!(rule.body, RuleBody::ThenOnly { .. }));
}

#[test]
fn typed_set_and_calculate_shapes_reparse() {
    let rule = parse(
        r#"
name: structured actions
then:
  - set:
      variable: tier
      value: '"PRIME"'
  - calculate:
      variable: dti
      expression: existingDebt / annualIncome
  - call:
      function: log_decision
      parameters: [tier, dti]
"#,
    );
    let RuleBody::ThenOnly { then_actions } = &rule.body else { panic!() };
    assert!(matches!(&then_actions[0], Action::Set(s) if s.variable == "tier"));
    assert!(matches!(&then_actions[1], Action::Calculate(c) if c.variable == "dti"));
    assert!(matches!(&then_actions[2], Action::FunctionCall(c) if c.arguments.len() == 2));
}

#[test]
fn folded_loop_form_reconstructs() {
    let rule = parse(
        r#"
name: folded loop
then:
  - forEach item in items:
      - add item to total
      - append item to seen
"#,
    );
    let RuleBody::ThenOnly { then_actions } = &rule.body else { panic!() };
    let Action::ForEach(for_each) = &then_actions[0] else {
        panic!("expected forEach, got {:?}", then_actions[0]);
    };
    assert_eq!(for_each.variable, "item");
    assert_eq!(for_each.body.len(), 2);
}

#[test]
fn typed_loop_shapes() {
    let rule = parse(
        r#"
name: typed loops
then:
  - forEach:
      variable: item
      index: idx
      in: items
      do:
        - add item to total
  - while:
      condition: counter less_than 3
      do: add 1 to counter
  - do:
      actions:
        - add 1 to counter
      while: counter less_than 3
"#,
    );
    let RuleBody::ThenOnly { then_actions } = &rule.body else { panic!() };
    assert!(matches!(
        &then_actions[0],
        Action::ForEach(f) if f.index_variable.as_deref() == Some("idx")
    ));
    assert!(matches!(&then_actions[1], Action::While(_)));
    assert!(matches!(&then_actions[2], Action::DoWhile(_)));
}

#[test]
fn assignment_shorthand_builds_assignment_nodes() {
    let rule = parse(
        r#"
name: shorthand
then:
  - tier: PRIME
  - max_rate: 4.5
"#,
    );
    let RuleBody::ThenOnly { then_actions } = &rule.body else { panic!() };
    let Action::Assignment(assignment) = &then_actions[0] else {
        panic!("expected assignment, got {:?}", then_actions[0]);
    };
    assert_eq!(assignment.variable, "tier");
    assert!(matches!(
        &assignment.value,
        Expression::Literal(l) if l.value == LiteralValue::String("PRIME".into())
    ));
}

#[test]
fn structured_conditional_item() {
    let rule = parse(
        r#"
name: nested conditional
then:
  - if: creditScore at_least 700
    then:
      - set tier to "PRIME"
    else:
      - set tier to "STANDARD"
"#,
    );
    let RuleBody::ThenOnly { then_actions } = &rule.body else { panic!() };
    let Action::Conditional(conditional) = &then_actions[0] else {
        panic!("expected conditional, got {:?}", then_actions[0]);
    };
    assert_eq!(conditional.then_actions.len(), 1);
    assert_eq!(conditional.else_actions.len(), 1);
}

#[test]
fn complex_body_with_nesting() {
    let rule = parse(
        r#"
name: complex
conditions:
  if: creditScore at_least 650
  then:
    actions:
      - set eligible to true
    conditions:
      if: creditScore at_least 750
      then:
        - set tier to "PREFERRED"
  else:
    - set eligible to false
"#,
    );
    let RuleBody::Complex(complex) = &rule.body else {
        panic!("expected complex body, got {}", body_kind(&rule.body));
    };
    assert_eq!(complex.then_block.actions.len(), 1);
    assert!(complex.then_block.nested.is_some());
    assert!(complex.else_block.is_some());
}

#[test]
fn multi_rule_body_and_precedence() {
    let rule = parse(
        r#"
name: rule set
rules:
  - name: tiering
    when: [creditScore at_least 700]
    then: [set tier to "PRIME"]
  - name: approval
    then: [set approved to true]
when: [ignored equals 1]
then: [set ignored to 2]
"#,
    );
    // `rules` wins over `when`/`then`
    let RuleBody::Multi { rules } = &rule.body else {
        panic!("expected multi body, got {}", body_kind(&rule.body));
    };
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].name.as_deref(), Some("tiering"));
    assert!(matches!(rules[1].body, RuleBody::ThenOnly { .. }));
}

#[test]
fn constants_in_both_forms() {
    let rule = parse(
        r#"
name: constants
constants:
  - MIN_CREDIT_SCORE
  - name: MAX_DTI
    code: RATIO_MAX_DTI
    type: number
    default: 0.43
then: [set checked to true]
"#,
    );
    assert_eq!(rule.constants.len(), 2);
    assert_eq!(rule.constants[0].name, "MIN_CREDIT_SCORE");
    assert_eq!(rule.constants[0].code, "MIN_CREDIT_SCORE");
    assert_eq!(rule.constants[1].code, "RATIO_MAX_DTI");
    assert!(rule.constants[1].default.is_some());
}

#[test]
fn circuit_breaker_config() {
    let rule = parse(
        r#"
name: breaker config
circuit_breaker:
  enabled: true
  failure_threshold: 5
  timeout: 10000
then: [set x to 1]
"#,
    );
    let config = rule.circuit_breaker.expect("config present");
    assert!(config.enabled);
    assert_eq!(config.failure_threshold, 5);
    assert_eq!(config.timeout_ms, 10_000);
}

#[test]
fn invalid_yaml_reports_document_error() {
    let mut sources = SourceMap::new();
    let err = parse_rule_str("name: [unclosed", &mut sources).unwrap_err();
    assert!(err.has_errors());
}

#[test]
fn missing_body_reports_document_error() {
    let mut sources = SourceMap::new();
    let err = parse_rule_str("name: nothing here", &mut sources).unwrap_err();
    assert!(err.has_errors());
}

#[test]
fn embedded_parse_errors_surface_with_section_files() {
    let mut sources = SourceMap::new();
    let err = parse_rule_str(
        r#"
name: broken
when:
  - creditScore at_least
then:
  - set tier "PRIME"
"#,
        &mut sources,
    )
    .unwrap_err();
    // Both the condition and the action failures are reported
    assert!(err.len() >= 2, "expected at least 2 diagnostics, got {}", err.len());
    // The embedded fragments were registered for rendering
    let first = err.first_error().unwrap();
    assert!(sources.source(first.primary_span.file_id).is_some());
}
