use crate::report::{IssueSeverity, RuleCategory, ValidationStatus};
use crate::validate_rule;

#[test]
fn clean_rule_is_valid() {
    let report = validate_rule(
        r#"
name: credit tiering
description: Assigns a pricing tier from the applicant credit score
version: "1.0"
inputs:
  creditScore: number
when:
  - creditScore at_least MIN_CREDIT_SCORE
then:
  - set tier to "PRIME"
else:
  - set tier to "STANDARD"
"#,
    );
    assert!(report.is_valid(), "issues: {:?}", report.issues);
    assert_eq!(report.status(), ValidationStatus::Valid);
    assert_eq!(report.quality_score(), 100);
}

#[test]
fn parse_errors_land_in_syntax_with_section_paths() {
    let report = validate_rule(
        r#"
name: broken rule
description: A rule whose condition fragment does not parse
when:
  - creditScore at_least
then:
  - set tier to "PRIME"
"#,
    );
    assert_eq!(report.status(), ValidationStatus::Error);
    let syntax = report.in_category(RuleCategory::Syntax);
    assert!(!syntax.is_empty());
    assert!(syntax.iter().any(|i| i.code.starts_with("PARSE_")));
    assert!(syntax
        .iter()
        .any(|i| i.location.as_deref() == Some("when[0]")));
}

#[test]
fn invalid_yaml_is_critical() {
    let report = validate_rule("name: [unclosed");
    assert_eq!(report.status(), ValidationStatus::CriticalError);
    assert!(report.quality_score() <= 75);
}

#[test]
fn naming_violations_per_namespace() {
    let report = validate_rule(
        r#"
name: naming check
description: Exercises every naming convention at once for the tests
inputs:
  credit_score: number
constants:
  - name: minScore
then:
  - set BadTarget to 1
"#,
    );

    let naming = report.in_category(RuleCategory::Naming);
    assert!(naming.iter().any(|i| i.code == "NAMING_001"), "input case");
    assert!(naming.iter().any(|i| i.code == "NAMING_002"), "write case");
    assert!(naming.iter().any(|i| i.code == "NAMING_003"), "constant case");
    // The write violation is what aborts at runtime
    assert_eq!(report.status(), ValidationStatus::Error);
}

#[test]
fn dependency_rule_is_order_sensitive() {
    let report = validate_rule(
        r#"
name: dependency order
description: The first read has no writer yet, the second one does
inputs:
  creditScore: number
then:
  - set early to missing_value
  - set base_rate to 5
  - set late to base_rate
"#,
    );
    let dependencies = report.in_category(RuleCategory::Dependencies);
    assert_eq!(dependencies.len(), 1, "issues: {:?}", dependencies);
    assert_eq!(dependencies[0].code, "DEP_001");
    assert!(dependencies[0].message.contains("missing_value"));
    assert_eq!(dependencies[0].location.as_deref(), Some("then[0]"));
}

#[test]
fn constant_references_are_not_dependencies() {
    let report = validate_rule(
        r#"
name: constant reads
description: UPPER_SNAKE references resolve through the constant store
when:
  - creditScore at_least MIN_CREDIT_SCORE
then:
  - set ok to true
inputs:
  creditScore: number
"#,
    );
    assert!(report.in_category(RuleCategory::Dependencies).is_empty());
}

#[test]
fn logic_contradiction_and_redundancy() {
    let report = validate_rule(
        r#"
name: logic checks
description: Contradictory and redundant comparisons on one variable
inputs:
  status: string
  creditScore: number
when:
  - status equals "OPEN" and status not_equals "OPEN"
  - creditScore at_least 650 and creditScore greater_than 650
then:
  - set ok to true
"#,
    );
    let logic = report.in_category(RuleCategory::Logic);
    assert!(logic.iter().any(|i| i.code == "LOGIC_001"), "contradiction");
    assert!(logic.iter().any(|i| i.code == "LOGIC_002"), "redundancy");
}

#[test]
fn logic_impossible_between_and_zero_divisor() {
    let report = validate_rule(
        r#"
name: logic faults
description: An empty between range and a division by literal zero
inputs:
  age: number
  income: number
when:
  - age between 65 and 18
then:
  - calculate broken as income / 0
"#,
    );
    let logic = report.in_category(RuleCategory::Logic);
    assert!(logic.iter().any(|i| i.code == "LOGIC_003"), "between");
    assert!(logic.iter().any(|i| i.code == "LOGIC_005"), "zero divisor");
}

#[test]
fn logic_float_equality_and_self_assignment() {
    let report = validate_rule(
        r#"
name: logic hygiene
description: Floating point equality and a self assignment in one rule
inputs:
  ratio: number
when:
  - ratio equals 0.35
then:
  - set ratio_copy to ratio_copy
"#,
    );
    let logic = report.in_category(RuleCategory::Logic);
    assert!(logic.iter().any(|i| i.code == "LOGIC_004"), "float equality");
    assert!(logic.iter().any(|i| i.code == "LOGIC_006"), "self assignment");
}

#[test]
fn performance_flags_wide_conditions_and_long_blocks() {
    let long_condition =
        "a equals 1 and b equals 2 and c equals 3 and d equals 4 and veryLongVariableName equals 5";
    let actions: Vec<String> = (0..12).map(|i| format!("  - set v{} to {}", i, i)).collect();
    let text = format!(
        "name: performance check\ndescription: A condition with many operators and a long block\nwhen:\n  - {}\nthen:\n{}\n",
        long_condition,
        actions.join("\n")
    );

    let report = validate_rule(&text);
    let performance = report.in_category(RuleCategory::Performance);
    assert!(performance.iter().any(|i| i.code == "PERF_001"), "operators");
    assert!(performance.iter().any(|i| i.code == "PERF_003"), "block size");
}

#[test]
fn best_practices_metadata_checks() {
    let report = validate_rule(
        r#"
name: x_y
then:
  - set rate to 42
"#,
    );
    let best = report.in_category(RuleCategory::BestPractices);
    assert!(best.iter().any(|i| i.code == "BP_001"), "missing description");
    assert!(best.iter().any(|i| i.code == "BP_003"), "missing version");
    assert!(best.iter().any(|i| i.code == "BP_004"), "name length");
    assert!(best.iter().any(|i| i.code == "BP_005"), "underscores");
    assert!(best.iter().any(|i| i.code == "BP_006"), "magic number");
}

#[test]
fn magic_numbers_exclude_zero_one_hundred() {
    let report = validate_rule(
        r#"
name: thresholds
description: Zero, one and one hundred are not magic in this language
then:
  - set a to 0
  - set b to 1
  - set c to 100
"#,
    );
    assert!(!report
        .in_category(RuleCategory::BestPractices)
        .iter()
        .any(|i| i.code == "BP_006"));
}

#[test]
fn quality_score_penalties() {
    // One error (10) and at least one warning (3) push the score down
    let report = validate_rule(
        r#"
name: scored rule
description: A rule with a known set of validation findings for scoring
inputs:
  credit_score: number
then:
  - set ok to true
"#,
    );
    let errors = report.count(IssueSeverity::Error);
    let warnings = report.count(IssueSeverity::Warning);
    let infos = report.count(IssueSeverity::Info);
    let expected = 100u32
        .saturating_sub((10 * errors + 3 * warnings + infos) as u32);
    assert_eq!(report.quality_score(), expected);
}

#[test]
fn tab_indentation_is_flagged() {
    let report = validate_rule("name: tabbed\n\tdescription: nope\nthen: [set x to 1]");
    assert!(report
        .in_category(RuleCategory::Syntax)
        .iter()
        .any(|i| i.code == "SYNTAX_002"));
}
