//! The six validation rules

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use ruleflow_ast::*;

use crate::context::ValidationContext;
use crate::report::{IssueSeverity, RuleCategory, ValidationIssue};

/// Base trait for all validation rules.
pub trait ValidationRule {
    fn name(&self) -> &str;
    fn category(&self) -> RuleCategory;
    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue>;
}

// ============================================================================
// Syntax
// ============================================================================

/// Structural problems in the raw document plus every diagnostic the
/// lexer/parser front end produced.
pub struct SyntaxRule;

impl ValidationRule for SyntaxRule {
    fn name(&self) -> &str {
        "SyntaxRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Syntax
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        // Pre-parse structural checks on the raw text; brackets inside
        // string literals and comments do not count
        let mut bracket_balance: i64 = 0;
        let mut brace_balance: i64 = 0;
        for (line_no, line) in ctx.text.lines().enumerate() {
            if line.starts_with('\t') {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Syntax,
                        "SYNTAX_002",
                        IssueSeverity::Warning,
                        format!("line {} is indented with a tab", line_no + 1),
                    )
                    .with_suggestion("YAML indentation must use spaces"),
                );
            }
            let mut in_string = false;
            for c in line.chars() {
                match c {
                    '"' => in_string = !in_string,
                    '#' if !in_string => break,
                    '[' if !in_string => bracket_balance += 1,
                    ']' if !in_string => bracket_balance -= 1,
                    '{' if !in_string => brace_balance += 1,
                    '}' if !in_string => brace_balance -= 1,
                    _ => {}
                }
            }
            if in_string {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Syntax,
                        "SYNTAX_003",
                        IssueSeverity::Warning,
                        format!("line {} has an unmatched double quote", line_no + 1),
                    )
                    .with_suggestion("close the string literal"),
                );
            }
        }
        if bracket_balance != 0 {
            issues.push(
                ValidationIssue::new(
                    RuleCategory::Syntax,
                    "SYNTAX_001",
                    IssueSeverity::Error,
                    "unmatched square brackets in the document",
                )
                .with_suggestion("balance every '[' with a ']'"),
            );
        }
        if brace_balance != 0 {
            issues.push(
                ValidationIssue::new(
                    RuleCategory::Syntax,
                    "SYNTAX_001",
                    IssueSeverity::Error,
                    "unmatched curly braces in the document",
                )
                .with_suggestion("balance every '{' with a '}'"),
            );
        }

        // Front-end diagnostics carry their section path as the pseudo-file
        // name they were parsed under
        for diagnostic in ctx.parse_diagnostics.iter() {
            let severity = match diagnostic.code {
                ruleflow_diagnostics::ErrorCode::ParseInvalidDocument => IssueSeverity::Critical,
                _ => IssueSeverity::Error,
            };
            let mut issue = ValidationIssue::new(
                RuleCategory::Syntax,
                diagnostic.code.as_str(),
                severity,
                diagnostic.message.clone(),
            );
            if let Some(suggestion) = diagnostic.suggestions.first() {
                issue = issue.with_suggestion(suggestion.message.clone());
            }
            if let Some(section) = ctx.sources.name(diagnostic.primary_span.file_id) {
                if section != "rule" {
                    issue = issue.at(section.to_string());
                }
            }
            issues.push(issue);
        }

        issues
    }
}

// ============================================================================
// Naming
// ============================================================================

/// Inputs are camelCase, computed write targets are snake_case, constants
/// are UPPER_SNAKE.
pub struct NamingRule;

impl ValidationRule for NamingRule {
    fn name(&self) -> &str {
        "NamingRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let Some(rule) = ctx.rule else {
            return issues;
        };

        for name in rule.input_decl.keys() {
            if !ctx.input_pattern.is_match(name) {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Naming,
                        "NAMING_001",
                        IssueSeverity::Warning,
                        format!("input '{}' is not camelCase", name),
                    )
                    .with_suggestion(format!(
                        "input names match {} — e.g. 'creditScore'",
                        ctx.input_pattern
                    ))
                    .at("inputs"),
                );
            }
        }

        for (path, action) in rule.actions_with_paths() {
            for target in write_targets(action) {
                if !ctx.computed_pattern.is_match(&target) {
                    issues.push(
                        ValidationIssue::new(
                            RuleCategory::Naming,
                            "NAMING_002",
                            IssueSeverity::Error,
                            format!("computed variable '{}' is not snake_case", target),
                        )
                        .with_suggestion(format!(
                            "computed names match {} — e.g. 'monthly_payment'; this write aborts at evaluation time",
                            ctx.computed_pattern
                        ))
                        .at(path.clone()),
                    );
                }
            }
        }

        for declared in &rule.constants {
            if !ctx.constant_pattern.is_match(&declared.name) {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Naming,
                        "NAMING_003",
                        IssueSeverity::Warning,
                        format!("constant '{}' is not UPPER_SNAKE", declared.name),
                    )
                    .with_suggestion(format!(
                        "constant names match {} — e.g. 'MIN_CREDIT_SCORE'; other spellings are never auto-detected",
                        ctx.constant_pattern
                    ))
                    .at("constants"),
                );
            }
        }

        issues
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// Order-sensitive detection of reads that no input, constant or preceding
/// write can satisfy.
pub struct DependencyRule;

impl ValidationRule for DependencyRule {
    fn name(&self) -> &str {
        "DependencyRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dependencies
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let Some(rule) = ctx.rule else {
            return issues;
        };

        let mut defined: BTreeSet<String> = rule.input_decl.keys().cloned().collect();
        defined.extend(rule.constants.iter().map(|c| c.name.clone()));
        self.walk_body(&rule.body, &mut defined, ctx, "", &mut issues);
        issues
    }
}

impl DependencyRule {
    fn walk_body(
        &self,
        body: &RuleBody,
        defined: &mut BTreeSet<String>,
        ctx: &ValidationContext<'_>,
        prefix: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        match body {
            RuleBody::Simple {
                when,
                then_actions,
                else_actions,
            } => {
                for (i, condition) in when.iter().enumerate() {
                    self.check_reads(
                        &condition_reads(condition),
                        defined,
                        ctx,
                        &format!("{}when[{}]", prefix, i),
                        issues,
                    );
                }
                let mut then_defined = defined.clone();
                self.walk_actions(then_actions, &mut then_defined, ctx, &format!("{}then", prefix), issues);
                let mut else_defined = defined.clone();
                self.walk_actions(else_actions, &mut else_defined, ctx, &format!("{}else", prefix), issues);
                defined.extend(then_defined);
                defined.extend(else_defined);
            }
            RuleBody::ThenOnly { then_actions } => {
                self.walk_actions(then_actions, defined, ctx, &format!("{}then", prefix), issues);
            }
            RuleBody::Complex(complex) => {
                self.walk_complex(complex, defined, ctx, prefix, issues);
            }
            RuleBody::Multi { rules } => {
                // Sub-rules share the computed namespace in declaration order
                for (i, sub) in rules.iter().enumerate() {
                    self.walk_body(
                        &sub.body,
                        defined,
                        ctx,
                        &format!("{}rules[{}].", prefix, i),
                        issues,
                    );
                }
            }
        }
    }

    fn walk_complex(
        &self,
        complex: &ComplexBody,
        defined: &mut BTreeSet<String>,
        ctx: &ValidationContext<'_>,
        prefix: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        self.check_reads(
            &condition_reads(&complex.condition),
            defined,
            ctx,
            &format!("{}if", prefix),
            issues,
        );
        let mut then_defined = defined.clone();
        self.walk_actions(
            &complex.then_block.actions,
            &mut then_defined,
            ctx,
            &format!("{}then", prefix),
            issues,
        );
        if let Some(nested) = &complex.then_block.nested {
            self.walk_complex(nested, &mut then_defined, ctx, &format!("{}then.", prefix), issues);
        }
        let mut else_defined = defined.clone();
        if let Some(else_block) = &complex.else_block {
            self.walk_actions(
                &else_block.actions,
                &mut else_defined,
                ctx,
                &format!("{}else", prefix),
                issues,
            );
            if let Some(nested) = &else_block.nested {
                self.walk_complex(nested, &mut else_defined, ctx, &format!("{}else.", prefix), issues);
            }
        }
        defined.extend(then_defined);
        defined.extend(else_defined);
    }

    fn walk_actions(
        &self,
        actions: &[Action],
        defined: &mut BTreeSet<String>,
        ctx: &ValidationContext<'_>,
        base: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for (i, action) in actions.iter().enumerate() {
            let path = format!("{}[{}]", base, i);
            match action {
                Action::Conditional(conditional) => {
                    self.check_reads(
                        &condition_reads(&conditional.condition),
                        defined,
                        ctx,
                        &path,
                        issues,
                    );
                    let mut then_defined = defined.clone();
                    self.walk_actions(
                        &conditional.then_actions,
                        &mut then_defined,
                        ctx,
                        &format!("{}.then", path),
                        issues,
                    );
                    let mut else_defined = defined.clone();
                    self.walk_actions(
                        &conditional.else_actions,
                        &mut else_defined,
                        ctx,
                        &format!("{}.else", path),
                        issues,
                    );
                    defined.extend(then_defined);
                    defined.extend(else_defined);
                }
                Action::ForEach(for_each) => {
                    self.check_reads(
                        &expression_reads(&for_each.iterable),
                        defined,
                        ctx,
                        &path,
                        issues,
                    );
                    let mut body_defined = defined.clone();
                    body_defined.insert(for_each.variable.clone());
                    if let Some(index) = &for_each.index_variable {
                        body_defined.insert(index.clone());
                    }
                    self.walk_actions(&for_each.body, &mut body_defined, ctx, &format!("{}.do", path), issues);
                    defined.extend(collect_writes(&for_each.body));
                }
                Action::While(while_action) => {
                    // The condition usually reads what the body writes
                    let mut body_defined = defined.clone();
                    body_defined.extend(collect_writes(&while_action.body));
                    self.check_reads(
                        &condition_reads(&while_action.condition),
                        &body_defined,
                        ctx,
                        &path,
                        issues,
                    );
                    self.walk_actions(&while_action.body, &mut body_defined, ctx, &format!("{}.do", path), issues);
                    defined.extend(collect_writes(&while_action.body));
                }
                Action::DoWhile(do_while) => {
                    let mut body_defined = defined.clone();
                    body_defined.extend(collect_writes(&do_while.body));
                    self.walk_actions(&do_while.body, &mut body_defined, ctx, &format!("{}.do", path), issues);
                    self.check_reads(
                        &condition_reads(&do_while.condition),
                        &body_defined,
                        ctx,
                        &path,
                        issues,
                    );
                    defined.extend(collect_writes(&do_while.body));
                }
                other => {
                    self.check_reads(&action_reads(other), defined, ctx, &path, issues);
                }
            }
            if let Some(target) = action.write_target() {
                defined.insert(target.to_string());
            }
        }
    }

    fn check_reads(
        &self,
        reads: &BTreeSet<String>,
        defined: &BTreeSet<String>,
        ctx: &ValidationContext<'_>,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for name in reads {
            // UPPER_SNAKE references resolve through the constant store
            if ctx.constant_pattern.is_match(name) || defined.contains(name) {
                continue;
            }
            issues.push(
                ValidationIssue::new(
                    RuleCategory::Dependencies,
                    "DEP_001",
                    IssueSeverity::Warning,
                    format!(
                        "'{}' is read but is neither a declared input, a constant, nor written earlier",
                        name
                    ),
                )
                .with_suggestion(format!("declare '{}' as an input or set it before this point", name))
                .at(path.to_string()),
            );
        }
    }
}

// ============================================================================
// Logic
// ============================================================================

/// Contradictions, redundancies and latent runtime faults visible
/// statically.
pub struct LogicRule;

impl ValidationRule for LogicRule {
    fn name(&self) -> &str {
        "LogicRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Logic
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let Some(rule) = ctx.rule else {
            return issues;
        };

        for (path, condition) in rule.conditions_with_paths() {
            self.analyze_condition(condition, &path, &mut issues);
        }
        for (path, action) in rule.actions_with_paths() {
            self.analyze_action(action, &path, &mut issues);
        }
        issues
    }
}

impl LogicRule {
    fn analyze_condition(&self, condition: &Condition, path: &str, issues: &mut Vec<ValidationIssue>) {
        let mut comparisons = Vec::new();
        collect_comparisons(condition, &mut comparisons);

        for window in comparisons.iter().enumerate() {
            let (i, a) = window;
            for b in &comparisons[i + 1..] {
                if a.left != b.left {
                    continue;
                }
                let pair = (a.op, b.op);
                let contradicts = (pair == (ComparisonOp::Equals, ComparisonOp::NotEquals)
                    || pair == (ComparisonOp::NotEquals, ComparisonOp::Equals))
                    && a.right == b.right;
                if contradicts {
                    issues.push(
                        ValidationIssue::new(
                            RuleCategory::Logic,
                            "LOGIC_001",
                            IssueSeverity::Error,
                            format!(
                                "'{}' is required to both equal and not equal {}",
                                a.left,
                                a.right.as_deref().unwrap_or("the same value")
                            ),
                        )
                        .with_suggestion("remove one of the contradictory comparisons")
                        .at(path.to_string()),
                    );
                }
                let redundant = matches!(
                    pair,
                    (ComparisonOp::AtLeast, ComparisonOp::GreaterThan)
                        | (ComparisonOp::GreaterThan, ComparisonOp::AtLeast)
                        | (ComparisonOp::AtMost, ComparisonOp::LessThan)
                        | (ComparisonOp::LessThan, ComparisonOp::AtMost)
                );
                if redundant {
                    issues.push(
                        ValidationIssue::new(
                            RuleCategory::Logic,
                            "LOGIC_002",
                            IssueSeverity::Warning,
                            format!("'{}' is bounded by overlapping operators", a.left),
                        )
                        .with_suggestion("keep the tighter of the two comparisons")
                        .at(path.to_string()),
                    );
                }
            }
        }

        for comparison in &comparisons {
            if let (ComparisonOp::Between | ComparisonOp::NotBetween, Some(lower), Some(upper)) =
                (comparison.op, &comparison.lower_literal, &comparison.upper_literal)
            {
                if lower > upper {
                    issues.push(
                        ValidationIssue::new(
                            RuleCategory::Logic,
                            "LOGIC_003",
                            IssueSeverity::Error,
                            format!("between range is empty: {} > {}", lower, upper),
                        )
                        .with_suggestion("swap the bounds")
                        .at(path.to_string()),
                    );
                }
            }
            if matches!(comparison.op, ComparisonOp::Equals | ComparisonOp::NotEquals)
                && comparison.fractional_literal
            {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Logic,
                        "LOGIC_004",
                        IssueSeverity::Warning,
                        format!("'{}' is equality-compared against a fractional literal", comparison.left),
                    )
                    .with_suggestion("compare against a rounded value or use a range")
                    .at(path.to_string()),
                );
            }
        }
    }

    fn analyze_action(&self, action: &Action, path: &str, issues: &mut Vec<ValidationIssue>) {
        if let Action::Set(set) = action {
            if let Expression::Variable(variable) = &set.value {
                if variable.name == set.variable
                    && variable.property_path.is_empty()
                    && variable.index.is_none()
                {
                    issues.push(
                        ValidationIssue::new(
                            RuleCategory::Logic,
                            "LOGIC_006",
                            IssueSeverity::Warning,
                            format!("'{}' is assigned to itself", set.variable),
                        )
                        .with_suggestion("remove the no-op assignment")
                        .at(path.to_string()),
                    );
                }
            }
        }

        for expression in action_expressions(action) {
            flag_zero_divisors(expression, path, issues);
        }
    }
}

fn flag_zero_divisors(expression: &Expression, path: &str, issues: &mut Vec<ValidationIssue>) {
    let mut stack = vec![expression];
    while let Some(current) = stack.pop() {
        match current {
            Expression::Binary(binary) => {
                if matches!(binary.op, BinaryOp::Divide | BinaryOp::Modulo) {
                    if let Expression::Literal(literal) = binary.right.as_ref() {
                        if literal.value == LiteralValue::Number(BigDecimal::from(0)) {
                            issues.push(
                                ValidationIssue::new(
                                    RuleCategory::Logic,
                                    "LOGIC_005",
                                    IssueSeverity::Error,
                                    "division by a literal zero always fails",
                                )
                                .with_suggestion("guard the division or fix the divisor")
                                .at(path.to_string()),
                            );
                        }
                    }
                }
                stack.push(&binary.left);
                stack.push(&binary.right);
            }
            Expression::Unary(unary) => stack.push(&unary.operand),
            Expression::Arithmetic(arithmetic) => stack.extend(arithmetic.operands.iter()),
            Expression::FunctionCall(call) => stack.extend(call.arguments.iter()),
            Expression::JsonPath(json_path) => stack.push(&json_path.source),
            Expression::RestCall(rest) => {
                stack.push(&rest.url);
                if let Some(body) = &rest.body {
                    stack.push(body);
                }
            }
            Expression::Literal(_) | Expression::Variable(_) => {}
        }
    }
}

// ============================================================================
// Performance
// ============================================================================

/// Conditions and blocks that will be slow to evaluate or hard to read.
pub struct PerformanceRule;

impl ValidationRule for PerformanceRule {
    fn name(&self) -> &str {
        "PerformanceRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let Some(rule) = ctx.rule else {
            return issues;
        };

        for (path, condition) in rule.conditions_with_paths() {
            let operators = condition.logical_operator_count();
            if operators > 2 {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Performance,
                        "PERF_001",
                        IssueSeverity::Warning,
                        format!("condition chains {} logical operators", operators),
                    )
                    .with_suggestion("split the condition across several `when` entries")
                    .at(path.clone()),
                );
            }
            let rendered = condition.to_string();
            if rendered.len() > 100 {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Performance,
                        "PERF_002",
                        IssueSeverity::Warning,
                        format!("condition is {} characters long", rendered.len()),
                    )
                    .with_suggestion("extract parts into calculated variables")
                    .at(path),
                );
            }
        }

        for (path, count) in action_list_sizes(&rule.body) {
            if count > 10 {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::Performance,
                        "PERF_003",
                        IssueSeverity::Warning,
                        format!("action block has {} actions", count),
                    )
                    .with_suggestion("split the block into focused sub-rules")
                    .at(path),
                );
            }
        }

        issues
    }
}

// ============================================================================
// Best practices
// ============================================================================

/// Metadata hygiene and magic numbers.
pub struct BestPracticesRule;

impl ValidationRule for BestPracticesRule {
    fn name(&self) -> &str {
        "BestPracticesRule"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::BestPractices
    }

    fn analyze(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let Some(rule) = ctx.rule else {
            return issues;
        };

        match &rule.description {
            None => issues.push(
                ValidationIssue::new(
                    RuleCategory::BestPractices,
                    "BP_001",
                    IssueSeverity::Warning,
                    "rule has no description",
                )
                .with_suggestion("describe what the rule decides and why"),
            ),
            Some(description) if description.len() < 20 => issues.push(
                ValidationIssue::new(
                    RuleCategory::BestPractices,
                    "BP_002",
                    IssueSeverity::Info,
                    format!("description is only {} characters", description.len()),
                )
                .with_suggestion("a sentence of at least 20 characters helps reviewers"),
            ),
            Some(_) => {}
        }

        if rule.version.is_none() {
            issues.push(
                ValidationIssue::new(
                    RuleCategory::BestPractices,
                    "BP_003",
                    IssueSeverity::Info,
                    "rule has no version",
                )
                .with_suggestion("version rules so audits can pin behavior"),
            );
        }

        let name_length = rule.name.chars().count();
        if !(5..=100).contains(&name_length) {
            issues.push(
                ValidationIssue::new(
                    RuleCategory::BestPractices,
                    "BP_004",
                    IssueSeverity::Warning,
                    format!("rule name is {} characters; expected 5 to 100", name_length),
                )
                .with_suggestion("use a short descriptive phrase"),
            );
        }
        if rule.name.contains('_') || rule.name.contains('-') {
            issues.push(
                ValidationIssue::new(
                    RuleCategory::BestPractices,
                    "BP_005",
                    IssueSeverity::Info,
                    "rule name contains underscores or hyphens",
                )
                .with_suggestion("rule names read best as plain words"),
            );
        }

        let mut magic = Vec::new();
        for (path, condition) in rule.conditions_with_paths() {
            let mut numbers = Vec::new();
            collect_condition_numbers(condition, &mut numbers);
            magic.extend(numbers.into_iter().map(|n| (path.clone(), n)));
        }
        for (path, action) in rule.actions_with_paths() {
            for expression in action_expressions(action) {
                let mut numbers = Vec::new();
                collect_expression_numbers(expression, &mut numbers);
                magic.extend(numbers.into_iter().map(|n| (path.clone(), n)));
            }
        }
        for (path, number) in magic {
            if is_magic(&number) {
                issues.push(
                    ValidationIssue::new(
                        RuleCategory::BestPractices,
                        "BP_006",
                        IssueSeverity::Info,
                        format!("magic number {}", number),
                    )
                    .with_suggestion("name the threshold as a constant")
                    .at(path),
                );
            }
        }

        issues
    }
}

fn is_magic(number: &BigDecimal) -> bool {
    number != &BigDecimal::from(0)
        && number != &BigDecimal::from(1)
        && number != &BigDecimal::from(100)
}

// ============================================================================
// Shared AST walkers
// ============================================================================

struct FlatComparison {
    op: ComparisonOp,
    left: String,
    right: Option<String>,
    lower_literal: Option<BigDecimal>,
    upper_literal: Option<BigDecimal>,
    fractional_literal: bool,
}

fn collect_comparisons(condition: &Condition, out: &mut Vec<FlatComparison>) {
    match condition {
        Condition::Comparison(c) => {
            let literal_number = |e: &Expression| match e {
                Expression::Literal(LiteralExpr {
                    value: LiteralValue::Number(n),
                    ..
                }) => Some(n.clone()),
                _ => None,
            };
            let fractional = [Some(&c.left), c.right.as_ref(), c.range_end.as_ref()]
                .into_iter()
                .flatten()
                .filter_map(|e| literal_number(e))
                .any(|n| !n.is_integer());
            out.push(FlatComparison {
                op: c.op,
                left: c.left.to_string(),
                right: c.right.as_ref().map(|e| e.to_string()),
                lower_literal: c.right.as_ref().and_then(|e| literal_number(e)),
                upper_literal: c.range_end.as_ref().and_then(|e| literal_number(e)),
                fractional_literal: fractional,
            });
        }
        Condition::Logical(c) => {
            for operand in &c.operands {
                collect_comparisons(operand, out);
            }
        }
        Condition::Expression(_) => {}
    }
}

fn write_targets(action: &Action) -> Vec<String> {
    let mut targets = Vec::new();
    collect_write_targets(action, &mut targets);
    targets
}

fn collect_write_targets(action: &Action, out: &mut Vec<String>) {
    if let Some(target) = action.write_target() {
        out.push(target.to_string());
    }
    match action {
        Action::Conditional(a) => {
            for action in a.then_actions.iter().chain(&a.else_actions) {
                collect_write_targets(action, out);
            }
        }
        Action::ForEach(a) => {
            for action in &a.body {
                collect_write_targets(action, out);
            }
        }
        Action::While(a) => {
            for action in &a.body {
                collect_write_targets(action, out);
            }
        }
        Action::DoWhile(a) => {
            for action in &a.body {
                collect_write_targets(action, out);
            }
        }
        _ => {}
    }
}

fn collect_writes(actions: &[Action]) -> BTreeSet<String> {
    let mut out = Vec::new();
    for action in actions {
        collect_write_targets(action, &mut out);
    }
    out.into_iter().collect()
}

/// Root variable names an expression reads.
fn expression_reads(expression: &Expression) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_expression_names(expression, &mut out);
    out
}

fn collect_expression_names(expression: &Expression, out: &mut BTreeSet<String>) {
    match expression {
        Expression::Literal(_) => {}
        Expression::Variable(e) => {
            out.insert(e.name.clone());
            if let Some(index) = &e.index {
                collect_expression_names(index, out);
            }
        }
        Expression::Unary(e) => collect_expression_names(&e.operand, out),
        Expression::Binary(e) => {
            collect_expression_names(&e.left, out);
            collect_expression_names(&e.right, out);
        }
        Expression::Arithmetic(e) => {
            for operand in &e.operands {
                collect_expression_names(operand, out);
            }
        }
        Expression::FunctionCall(e) => {
            for argument in &e.arguments {
                collect_expression_names(argument, out);
            }
        }
        Expression::JsonPath(e) => collect_expression_names(&e.source, out),
        Expression::RestCall(e) => {
            collect_expression_names(&e.url, out);
            if let Some(body) = &e.body {
                collect_expression_names(body, out);
            }
            for (_, value) in &e.headers {
                collect_expression_names(value, out);
            }
        }
    }
}

fn condition_reads(condition: &Condition) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_condition_names(condition, &mut out);
    out
}

fn collect_condition_names(condition: &Condition, out: &mut BTreeSet<String>) {
    match condition {
        Condition::Comparison(c) => {
            collect_expression_names(&c.left, out);
            if let Some(right) = &c.right {
                collect_expression_names(right, out);
            }
            if let Some(range_end) = &c.range_end {
                collect_expression_names(range_end, out);
            }
        }
        Condition::Logical(c) => {
            for operand in &c.operands {
                collect_condition_names(operand, out);
            }
        }
        Condition::Expression(c) => collect_expression_names(&c.expression, out),
    }
}

/// Names a non-control-flow action reads, including the arithmetic and
/// list forms' read-modify-write of their own target.
fn action_reads(action: &Action) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match action {
        Action::Set(a) => collect_expression_names(&a.value, &mut out),
        Action::Calculate(a) => collect_expression_names(&a.expression, &mut out),
        Action::Run(a) => collect_expression_names(&a.expression, &mut out),
        Action::Assignment(a) => collect_expression_names(&a.value, &mut out),
        Action::FunctionCall(a) => {
            for argument in &a.arguments {
                collect_expression_names(argument, &mut out);
            }
        }
        // Their own target reads as zero / empty when unbound, so it is
        // not a dependency
        Action::Arithmetic(a) => collect_expression_names(&a.value, &mut out),
        Action::List(a) => collect_expression_names(&a.value, &mut out),
        Action::CircuitBreaker(_) => {}
        Action::Conditional(_) | Action::ForEach(_) | Action::While(_) | Action::DoWhile(_) => {}
    }
    out
}

/// Every expression embedded in an action, without descending into nested
/// action lists (callers walk those separately).
fn action_expressions(action: &Action) -> Vec<&Expression> {
    match action {
        Action::Set(a) => vec![&a.value],
        Action::Calculate(a) => vec![&a.expression],
        Action::Run(a) => vec![&a.expression],
        Action::Assignment(a) => vec![&a.value],
        Action::FunctionCall(a) => a.arguments.iter().collect(),
        Action::Arithmetic(a) => vec![&a.value],
        Action::List(a) => vec![&a.value],
        Action::ForEach(a) => vec![&a.iterable],
        Action::Conditional(_)
        | Action::CircuitBreaker(_)
        | Action::While(_)
        | Action::DoWhile(_) => Vec::new(),
    }
}

fn collect_condition_numbers(condition: &Condition, out: &mut Vec<BigDecimal>) {
    match condition {
        Condition::Comparison(c) => {
            collect_expression_numbers(&c.left, out);
            if let Some(right) = &c.right {
                collect_expression_numbers(right, out);
            }
            if let Some(range_end) = &c.range_end {
                collect_expression_numbers(range_end, out);
            }
        }
        Condition::Logical(c) => {
            for operand in &c.operands {
                collect_condition_numbers(operand, out);
            }
        }
        Condition::Expression(c) => collect_expression_numbers(&c.expression, out),
    }
}

fn collect_expression_numbers(expression: &Expression, out: &mut Vec<BigDecimal>) {
    match expression {
        Expression::Literal(literal) => {
            if let LiteralValue::Number(n) = &literal.value {
                out.push(n.clone());
            }
        }
        Expression::Variable(e) => {
            if let Some(index) = &e.index {
                collect_expression_numbers(index, out);
            }
        }
        Expression::Unary(e) => collect_expression_numbers(&e.operand, out),
        Expression::Binary(e) => {
            collect_expression_numbers(&e.left, out);
            collect_expression_numbers(&e.right, out);
        }
        Expression::Arithmetic(e) => {
            for operand in &e.operands {
                collect_expression_numbers(operand, out);
            }
        }
        Expression::FunctionCall(e) => {
            for argument in &e.arguments {
                collect_expression_numbers(argument, out);
            }
        }
        Expression::JsonPath(e) => collect_expression_numbers(&e.source, out),
        Expression::RestCall(_) => {}
    }
}

fn action_list_sizes(body: &RuleBody) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    collect_list_sizes(body, "", &mut out);
    out
}

fn collect_list_sizes(body: &RuleBody, prefix: &str, out: &mut Vec<(String, usize)>) {
    match body {
        RuleBody::Simple {
            then_actions,
            else_actions,
            ..
        } => {
            out.push((format!("{}then", prefix), then_actions.len()));
            out.push((format!("{}else", prefix), else_actions.len()));
        }
        RuleBody::ThenOnly { then_actions } => {
            out.push((format!("{}then", prefix), then_actions.len()));
        }
        RuleBody::Complex(complex) => collect_block_sizes(complex, prefix, out),
        RuleBody::Multi { rules } => {
            for (i, sub) in rules.iter().enumerate() {
                collect_list_sizes(&sub.body, &format!("{}rules[{}].", prefix, i), out);
            }
        }
    }
}

fn collect_block_sizes(complex: &ComplexBody, prefix: &str, out: &mut Vec<(String, usize)>) {
    out.push((format!("{}then", prefix), complex.then_block.actions.len()));
    if let Some(nested) = &complex.then_block.nested {
        collect_block_sizes(nested, &format!("{}then.", prefix), out);
    }
    if let Some(else_block) = &complex.else_block {
        out.push((format!("{}else", prefix), else_block.actions.len()));
        if let Some(nested) = &else_block.nested {
            collect_block_sizes(nested, &format!("{}else.", prefix), out);
        }
    }
}
