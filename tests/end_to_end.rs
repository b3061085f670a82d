//! End-to-end scenarios through the public facade: rule text in, decisions
//! out, exactly as an embedding service would drive the engine.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use ruleflow::{
    validate_rule, InMemoryConstantStore, RuleEngine, ValidationStatus, Value,
};

fn inputs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn credit_tiering_decision() {
    let engine = RuleEngine::default();
    let rule = r#"
name: credit tiering
description: Assigns a pricing tier and approval flag from the credit score
version: "1.0"
inputs:
  creditScore: number
when: [creditScore at_least 700]
then: [set tier to "PRIME", set approved to true]
else: [set tier to "STANDARD", set approved to false]
"#;

    let approved = engine.evaluate(rule, inputs(&[("creditScore", Value::from(720))]));
    assert!(approved.success);
    assert!(approved.condition_result);
    assert_eq!(approved.outputs.get("tier"), Some(&Value::from("PRIME")));
    assert_eq!(approved.outputs.get("approved"), Some(&Value::Boolean(true)));
    assert_eq!(
        approved.outputs.get("conditionResult"),
        Some(&Value::Boolean(true))
    );

    let declined = engine.evaluate(rule, inputs(&[("creditScore", Value::from(500))]));
    assert!(!declined.condition_result);
    assert_eq!(declined.outputs.get("tier"), Some(&Value::from("STANDARD")));
}

#[test]
fn debt_to_income_is_decimal_exact() {
    let engine = RuleEngine::default();
    let result = engine.evaluate(
        "calculate dti as existingDebt / annualIncome",
        inputs(&[
            ("existingDebt", Value::from(30_000)),
            ("annualIncome", Value::from(90_000)),
        ]),
    );
    assert!(result.success);
    assert_eq!(
        result.outputs.get("dti"),
        Some(&Value::Number(BigDecimal::from_str("0.3333333333").unwrap()))
    );
}

#[test]
fn division_by_zero_surfaces_the_code() {
    let engine = RuleEngine::default();
    let result = engine.evaluate(
        "calculate x as a / b",
        inputs(&[("a", Value::from(1)), ("b", Value::from(0))]),
    );
    assert!(!result.success);
    assert!(result.error.unwrap().contains("EVAL_DIV_BY_ZERO"));
}

#[test]
fn circuit_breaker_leaves_later_writes_unset() {
    let engine = RuleEngine::default();
    let rule = r#"
when: [creditScore less_than 500]
then: [circuit_breaker "Score too low", set approved to true]
"#;
    let result = engine.evaluate(rule, inputs(&[("creditScore", Value::from(450))]));
    assert!(result.success);
    assert!(result.circuit_breaker_triggered);
    assert_eq!(result.circuit_breaker_message.as_deref(), Some("Score too low"));
    assert!(!result.outputs.contains_key("approved"));
}

#[test]
fn constants_resolve_through_the_store() {
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
}

#[test]
fn routing_number_checksum_scenario() {
    let engine = RuleEngine::default();
    let rule = r#"
then:
  - set valid to is_valid_routing(routingNumber)
"#;
    let good = engine.evaluate(rule, inputs(&[("routingNumber", Value::from("011000015"))]));
    assert_eq!(good.outputs.get("valid"), Some(&Value::Boolean(true)));

    let bad = engine.evaluate(rule, inputs(&[("routingNumber", Value::from("011000016"))]));
    assert_eq!(bad.outputs.get("valid"), Some(&Value::Boolean(false)));
}

#[test]
fn validation_and_evaluation_agree() {
    let rule = r#"
name: underwriting gate
description: Declines applications whose debt ratio exceeds the threshold
version: "2.1"
inputs:
  monthlyDebt: number
  monthlyIncome: number
when:
  - monthlyDebt / monthlyIncome at_most 0.43
then:
  - set approved to true
else:
  - set approved to false
  - append "DTI_TOO_HIGH" to decline_reasons
"#;

    let report = validate_rule(rule);
    assert!(report.is_valid(), "issues: {:?}", report.issues);

    let engine = RuleEngine::default();
    let result = engine.evaluate(
        rule,
        inputs(&[
            ("monthlyDebt", Value::from(1_500)),
            ("monthlyIncome", Value::from(4_000)),
        ]),
    );
    assert!(result.success);
    assert!(result.condition_result);
    assert_eq!(result.outputs.get("approved"), Some(&Value::Boolean(true)));

    let declined = engine.evaluate(
        rule,
        inputs(&[
            ("monthlyDebt", Value::from(3_000)),
            ("monthlyIncome", Value::from(4_000)),
        ]),
    );
    assert!(!declined.condition_result);
    assert_eq!(
        declined.outputs.get("decline_reasons"),
        Some(&Value::List(vec![Value::from("DTI_TOO_HIGH")]))
    );
}

#[test]
fn broken_rules_fail_validation_not_evaluation() {
    let report = validate_rule("when: [creditScore at_least]\nthen: [set x to 1]");
    assert_eq!(report.status(), ValidationStatus::Error);
    assert!(report.quality_score() < 100);
}

#[test]
fn parse_is_cached_across_calls() {
    let engine = RuleEngine::default();
    let rule = "set tier to \"PRIME\"";
    for _ in 0..3 {
        let result = engine.evaluate(rule, HashMap::new());
        assert!(result.success);
    }
    let stats = engine.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[tokio::test]
async fn deferred_evaluation_round_trip() {
    let engine = Arc::new(RuleEngine::default());
    let result = engine
        .evaluate_deferred(
            "when: [amount greater_than 1000]\nthen: [set review to true]".to_string(),
            inputs(&[("amount", Value::from(5_000))]),
        )
        .await;
    assert!(result.success);
    assert_eq!(result.outputs.get("review"), Some(&Value::Boolean(true)));
}
