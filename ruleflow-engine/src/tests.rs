use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::TimeZone;

use crate::collaborators::{FixedClock, InMemoryConstantStore, InMemoryRuleStore};
use crate::config::EngineConfig;
use crate::engine::{EvaluationOptions, RuleEngine};
use crate::cancel::CancellationToken;
use crate::value::Value;

fn inputs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn num(text: &str) -> Value {
    Value::Number(BigDecimal::from_str(text).unwrap())
}

#[test]
fn credit_tiering_simple_syntax() {
    let engine = RuleEngine::default();
    let rule = r#"
name: credit tiering
when: [creditScore at_least 700]
then: [set tier to "PRIME", set approved to true]
else: [set tier to "STANDARD", set approved to false]
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(720))]));

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.condition_result);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("PRIME")));
    assert_eq!(result.outputs.get("approved"), Some(&Value::Boolean(true)));
    assert_eq!(
        result.outputs.get("conditionResult"),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn credit_tiering_else_branch() {
    let engine = RuleEngine::default();
    let rule = r#"
when: [creditScore at_least 700]
then: [set tier to "PRIME"]
else: [set tier to "STANDARD"]
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(640))]));
    assert!(result.success);
    assert!(!result.condition_result);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("STANDARD")));
}

#[test]
fn debt_to_income_division_scale() {
    let engine = RuleEngine::default();
    let result = engine.evaluate(
        "calculate dti as existingDebt / annualIncome",
        inputs(&[
            ("existingDebt", Value::from(30_000)),
            ("annualIncome", Value::from(90_000)),
        ]),
    );

    assert!(result.success, "error: {:?}", result.error);
    // 10 decimals, half-up
    assert_eq!(result.outputs.get("dti"), Some(&num("0.3333333333")));
}

#[test]
fn division_by_zero_aborts() {
    let engine = RuleEngine::default();
    let result = engine.evaluate(
        "calculate x as a / b",
        inputs(&[("a", Value::from(1)), ("b", Value::from(0))]),
    );

    assert!(!result.success);
    let error = result.error.expect("error populated");
    assert!(error.contains("EVAL_DIV_BY_ZERO"), "error was: {}", error);
}

#[test]
fn circuit_breaker_halts_following_actions() {
    let engine = RuleEngine::default();
    let rule = r#"
when: [creditScore less_than 500]
then: [circuit_breaker "Score too low", set approved to true]
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(450))]));

    assert!(result.success);
    assert!(result.circuit_breaker_triggered);
    assert_eq!(result.circuit_breaker_message.as_deref(), Some("Score too low"));
    // The write after the trip never happened
    assert!(!result.outputs.contains_key("approved"));
}

#[test]
fn constants_auto_detected_and_fetched() {
    let store = Arc::new(InMemoryConstantStore::new());
    store.insert("MIN_CREDIT_SCORE", Value::from(650));
    let engine = RuleEngine::default().with_constant_store(store);

    let rule = r#"
when: [creditScore at_least MIN_CREDIT_SCORE]
then: [set approved to true]
else: [set approved to false]
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(640))]));
    assert!(result.success);
    assert!(!result.condition_result);
    assert_eq!(result.outputs.get("approved"), Some(&Value::Boolean(false)));
}

#[test]
fn declared_constant_defaults_survive_missing_store_values() {
    let engine = RuleEngine::default();
    let rule = r#"
constants:
  - name: MAX_DTI
    default: 0.43
when: [dtiInput at_most MAX_DTI]
then: [set ok to true]
else: [set ok to false]
"#;
    let result = engine.evaluate(rule, inputs(&[("dtiInput", num("0.4"))]));
    assert!(result.success, "error: {:?}", result.error);
    assert!(result.condition_result);
}

#[test]
fn aba_routing_checksum() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set good to is_valid_routing("011000015")
  - set bad to is_valid_routing("011000016")
"#;
    let result = engine.evaluate(rule, HashMap::new());
    assert!(result.success);
    assert_eq!(result.outputs.get("good"), Some(&Value::Boolean(true)));
    assert_eq!(result.outputs.get("bad"), Some(&Value::Boolean(false)));
}

#[test]
fn namespace_precedence_computed_shadows_inputs() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set score to 100
  - calculate doubled as score * 2
"#;
    // The input `score` is shadowed by the computed write
    let result = engine.evaluate(rule, inputs(&[("score", Value::from(5))]));
    assert!(result.success);
    assert_eq!(result.outputs.get("doubled"), Some(&num("200")));
}

#[test]
fn naming_violation_aborts() {
    let engine = RuleEngine::default();
    let result = engine.evaluate("set BadName to 1", HashMap::new());
    assert!(!result.success);
    assert!(result.error.unwrap().contains("NAMING_WRITE"));
}

#[test]
fn truthiness_double_negation() {
    let engine = RuleEngine::default();
    for (literal, expected) in [
        ("0", false),
        ("1", true),
        ("\"\"", false),
        ("\"x\"", true),
        ("null", false),
        ("true", true),
        ("false", false),
    ] {
        let rule = format!("set out to not not {}", literal);
        let result = engine.evaluate(&rule, HashMap::new());
        assert!(result.success, "{}: {:?}", literal, result.error);
        assert_eq!(
            result.outputs.get("out"),
            Some(&Value::Boolean(expected)),
            "literal {}",
            literal
        );
    }
}

#[test]
fn while_loop_cap_trips_breaker() {
    let mut config = EngineConfig::default();
    config.loop_max_iterations = 50;
    let engine = RuleEngine::new(config);

    let result = engine.evaluate("then:\n  - while 1 equals 1: add 1 to counter\n", HashMap::new());
    assert!(!result.success);
    assert!(result.circuit_breaker_triggered);
    assert!(result.error.unwrap().contains("LOOP_MAX_ITERATIONS"));
}

#[test]
fn for_each_binds_and_restores() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set item to "outer"
  - forEach item, idx in values: add item to total; set last_index to idx
  - set witness to item
"#;
    let result = engine.evaluate(
        rule,
        inputs(&[(
            "values",
            Value::List(vec![Value::from(1), Value::from(2), Value::from(3)]),
        )]),
    );
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("total"), Some(&num("6")));
    assert_eq!(result.outputs.get("last_index"), Some(&num("2")));
    // The loop binding was restored before the final set
    assert_eq!(result.outputs.get("witness"), Some(&Value::from("outer")));
}

#[test]
fn do_while_runs_at_least_once() {
    let engine = RuleEngine::default();
    let result = engine.evaluate(
        "then:\n  - do: add 1 to counter while counter less_than 0\n",
        HashMap::new(),
    );
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("counter"), Some(&num("1")));
}

#[test]
fn conditional_action_with_else() {
    let engine = RuleEngine::default();
    let rule = "if creditScore at_least 700 then set tier to \"PRIME\" else set tier to \"STANDARD\"";
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(650))]));
    assert!(result.success);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("STANDARD")));
}

#[test]
fn string_concatenation_and_comparison_operators() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set greeting to "Hello, " + firstName
  - set flagged to status starts_with "DEL"
  - set found to code in_list ["A", "B", "C"]
"#;
    let result = engine.evaluate(
        rule,
        inputs(&[
            ("firstName", Value::from("Ada")),
            ("status", Value::from("DELINQUENT")),
            ("code", Value::from("B")),
        ]),
    );
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("greeting"), Some(&Value::from("Hello, Ada")));
    assert_eq!(result.outputs.get("flagged"), Some(&Value::Boolean(true)));
    assert_eq!(result.outputs.get("found"), Some(&Value::Boolean(true)));
}

#[test]
fn matches_uses_find_semantics_and_tolerates_bad_patterns() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set hit to name matches "ohn"
  - set miss to name matches "^xyz"
  - set bad to name matches "[unclosed"
"#;
    let result = engine.evaluate(rule, inputs(&[("name", Value::from("John Doe"))]));
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("hit"), Some(&Value::Boolean(true)));
    assert_eq!(result.outputs.get("miss"), Some(&Value::Boolean(false)));
    // Invalid patterns warn and yield false, never raise
    assert_eq!(result.outputs.get("bad"), Some(&Value::Boolean(false)));
    assert!(result.events.iter().any(|e| e.code == "EVAL_BAD_PATTERN"));
}

#[test]
fn unknown_function_and_unbound_variable_warn() {
    let engine = RuleEngine::default();
    let result = engine.evaluate("set x to frobnicate(missingVar)", HashMap::new());
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("x"), Some(&Value::Null));
    assert!(result.events.iter().any(|e| e.code == "EVAL_UNDEFINED"));
    assert!(result.events.iter().any(|e| e.code == "EVAL_UNKNOWN_FUNCTION"));
}

#[test]
fn multi_rule_outcomes_and_overall_conjunction() {
    let engine = RuleEngine::default();
    let rule = r#"
name: underwriting
rules:
  - name: tiering
    when: [creditScore at_least 700]
    then: [set tier to "PRIME"]
  - name: income check
    when: [annualIncome at_least 50000]
    then: [set income_ok to true]
    else: [set income_ok to false]
"#;
    let result = engine.evaluate(
        rule,
        inputs(&[
            ("creditScore", Value::from(720)),
            ("annualIncome", Value::from(40_000)),
        ]),
    );
    assert!(result.success, "error: {:?}", result.error);
    assert!(!result.condition_result); // second sub-rule failed
    assert_eq!(result.outputs.get("tiering_result"), Some(&Value::Boolean(true)));
    assert_eq!(result.outputs.get("income_check_result"), Some(&Value::Boolean(false)));
}

#[test]
fn complex_body_nested_conditions() {
    let engine = RuleEngine::default();
    let rule = r#"
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
        - set tier to "STANDARD"
  else:
    - set eligible to false
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(760))]));
    assert!(result.success, "error: {:?}", result.error);
    assert!(result.condition_result);
    assert_eq!(result.outputs.get("eligible"), Some(&Value::Boolean(true)));
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("PREFERRED")));
}

#[test]
fn financial_functions_round_as_specified() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set payment to calculate_loan_payment(200000, 6, 360)
  - set ratio to debt_to_income_ratio(30000, 90000)
  - set undefined_ratio to debt_to_income_ratio(1, 0)
"#;
    let result = engine.evaluate(rule, HashMap::new());
    assert!(result.success, "error: {:?}", result.error);
    // Standard 30-year amortization at 6%: 1199.10/month
    assert_eq!(result.outputs.get("payment"), Some(&num("1199.10")));
    assert_eq!(result.outputs.get("ratio"), Some(&num("0.3333")));
    assert_eq!(result.outputs.get("undefined_ratio"), Some(&Value::Null));
}

#[test]
fn loan_payment_action_form_writes_result_variable() {
    let engine = RuleEngine::default();
    let rule = "call calculate_loan_payment with [200000, 6, 360, \"monthly_payment\"]";
    let result = engine.evaluate(rule, HashMap::new());
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("monthly_payment"), Some(&num("1199.10")));
}

#[test]
fn determinism_with_fixed_clock() {
    let clock = FixedClock(chrono::Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
    let engine = RuleEngine::default().with_clock(Arc::new(clock));
    let rule = r#"
then:
  - set stamp to today()
  - set adult to age_at_least(dateOfBirth, 18)
"#;
    let record = inputs(&[("dateOfBirth", Value::from("2000-03-16"))]);

    let first = engine.evaluate(rule, record.clone());
    let second = engine.evaluate(rule, record);
    assert!(first.success);
    assert_eq!(first.outputs, second.outputs);
    assert_eq!(first.outputs.get("stamp"), Some(&Value::from("2024-03-15")));
    // Turns 24 tomorrow; still at least 18
    assert_eq!(first.outputs.get("adult"), Some(&Value::Boolean(true)));
}

#[test]
fn cache_idempotence_counts_hits() {
    let engine = RuleEngine::default();
    let text = "set x to 1";

    let first = engine.parse(text).unwrap();
    for _ in 0..4 {
        let again = engine.parse(text).unwrap();
        assert_eq!(first.as_ref(), again.as_ref());
    }

    let stats = engine.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);

    engine.invalidate_cached(text);
    engine.parse(text).unwrap();
    assert_eq!(engine.cache_stats().misses, 2);
}

#[test]
fn evaluate_by_code_resolves_rule_store() {
    let store = Arc::new(InMemoryRuleStore::new());
    store.insert("CREDIT_TIER_V1", "set tier to \"PRIME\"");
    let engine = RuleEngine::default().with_rule_store(store);

    let result = engine.evaluate_by_code("CREDIT_TIER_V1", HashMap::new());
    assert!(result.success);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("PRIME")));

    let missing = engine.evaluate_by_code("NOPE", HashMap::new());
    assert!(!missing.success);
    assert!(missing.error.unwrap().contains("EXT_UNAVAILABLE"));
}

#[test]
fn cancellation_halts_with_structured_error() {
    let engine = RuleEngine::default();
    let token = CancellationToken::new();
    token.cancel();
    let options = EvaluationOptions {
        operation_id: Some("op-test".into()),
        cancellation: token,
    };
    let result = engine.evaluate_with("set x to 1", HashMap::new(), options);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("EVAL_CANCELLED"));
}

#[test]
fn parse_failure_reports_first_error() {
    let engine = RuleEngine::default();
    let result = engine.evaluate("when: [creditScore at_least]", HashMap::new());
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("PARSE_"));
}

#[test]
fn declared_outputs_default_to_null() {
    let engine = RuleEngine::default();
    let rule = r#"
outputs: [tier, reviewedBy]
then: [set tier to "PRIME"]
"#;
    let result = engine.evaluate(rule, HashMap::new());
    assert!(result.success);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("PRIME")));
    assert_eq!(result.outputs.get("reviewedBy"), Some(&Value::Null));
}

#[test]
fn mask_action_preserves_last_four() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set card_tail to mask_data(cardNumber)
"#;
    let result = engine.evaluate(rule, inputs(&[("cardNumber", Value::from("4111111111111111"))]));
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(
        result.outputs.get("card_tail"),
        Some(&Value::from("************1111"))
    );
}

#[tokio::test]
async fn deferred_surface_matches_blocking() {
    let engine = Arc::new(RuleEngine::default());
    let result = engine
        .evaluate_deferred(
            "set tier to \"PRIME\"".to_string(),
            HashMap::new(),
        )
        .await;
    assert!(result.success);
    assert_eq!(result.outputs.get("tier"), Some(&Value::from("PRIME")));
}

#[test]
fn json_path_and_property_access() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set price to json_path(payload, "items[0].price")
  - set city to customer.address.city
"#;
    let payload = Value::from_json(&serde_json::json!({
        "items": [{"price": 9.99}, {"price": 5.00}]
    }));
    let customer = Value::from_json(&serde_json::json!({
        "address": {"city": "Springfield"}
    }));
    let result = engine.evaluate(
        rule,
        inputs(&[("payload", payload), ("customer", customer)]),
    );
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outputs.get("price"), Some(&num("9.99")));
    assert_eq!(result.outputs.get("city"), Some(&Value::from("Springfield")));
}
