//! Document-to-AST assembly

use std::collections::BTreeMap;

use ruleflow_ast::{
    Action, ActionBlock, AssignmentAction, CircuitBreakerConfig, ComplexBody, Condition,
    ConditionalAction, ConstantDecl, Expression, LiteralExpr, Rule, RuleBody, SubRule,
};
use ruleflow_diagnostics::{DiagnosticCollection, ErrorCode, RuleDiagnostic, SourceMap, SourceSpan};
use serde_yaml::Value;

use crate::scalars::{join_action_body, yaml_to_dsl_fragment, yaml_to_literal};

/// Keys that select a typed structured action shape.
const TYPED_ACTION_KEYS: &[&str] = &["set", "calculate", "run", "call", "forEach", "while", "do", "if"];

pub(crate) struct Assembler<'a> {
    sources: &'a mut SourceMap,
    doc_file: u32,
    diagnostics: DiagnosticCollection,
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(sources: &'a mut SourceMap, doc_file: u32) -> Self {
        Self {
            sources,
            doc_file,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub(crate) fn into_diagnostics(self) -> DiagnosticCollection {
        self.diagnostics
    }

    fn doc_span(&self) -> SourceSpan {
        SourceSpan::empty(self.doc_file)
    }

    fn doc_error(&mut self, message: impl Into<String>) {
        self.diagnostics.add(RuleDiagnostic::error(
            ErrorCode::ParseInvalidDocument,
            message,
            self.doc_span(),
        ));
    }

    /// Parse an embedded condition string, registered under its section path.
    fn condition_str(&mut self, text: &str, path: &str) -> Option<Condition> {
        let file_id = self.sources.add(path.to_string(), text.to_string());
        match ruleflow_parser::parse_condition(text, file_id) {
            Ok(condition) => Some(condition),
            Err(diagnostics) => {
                self.diagnostics.merge(diagnostics);
                None
            }
        }
    }

    /// Parse an embedded action string (a single statement).
    fn action_str(&mut self, text: &str, path: &str) -> Option<Action> {
        let file_id = self.sources.add(path.to_string(), text.to_string());
        match ruleflow_parser::parse_action(text, file_id) {
            Ok(action) => Some(action),
            Err(diagnostics) => {
                self.diagnostics.merge(diagnostics);
                None
            }
        }
    }

    /// Parse an embedded comma-separated action list string.
    fn action_list_str(&mut self, text: &str, path: &str) -> Vec<Action> {
        let file_id = self.sources.add(path.to_string(), text.to_string());
        match ruleflow_parser::parse_actions(text, file_id) {
            Ok(actions) => actions,
            Err(diagnostics) => {
                self.diagnostics.merge(diagnostics);
                Vec::new()
            }
        }
    }

    pub(crate) fn assemble_rule(&mut self, value: &Value) -> Option<Rule> {
        // A bare scalar document is a naked action list: an unconditional
        // `then` with no metadata
        if let Value::String(text) = value {
            let then_actions = self.action_list_str(text, "then");
            return Some(Rule {
                name: String::new(),
                description: None,
                version: None,
                metadata: BTreeMap::new(),
                input_decl: BTreeMap::new(),
                output_decl: BTreeMap::new(),
                constants: Vec::new(),
                body: RuleBody::ThenOnly { then_actions },
                circuit_breaker: None,
            });
        }
        if value.as_mapping().is_none() {
            self.doc_error("rule document must be a mapping");
            return None;
        }

        let name = string_field(value, "name").unwrap_or_default();
        let description = string_field(value, "description");
        let version = string_field(value, "version");
        let metadata = self.assemble_metadata(value.get("metadata"));

        let input_decl = self.assemble_decls(value.get("inputs").or_else(|| value.get("input")));
        let output_decl = self.assemble_decls(value.get("outputs").or_else(|| value.get("output")));
        let constants = self.assemble_constants(value.get("constants"));
        let circuit_breaker = self.assemble_circuit_breaker(value.get("circuit_breaker"));

        let body = self.assemble_body(value, "")?;

        Some(Rule {
            name,
            description,
            version,
            metadata,
            input_decl,
            output_decl,
            constants,
            body,
            circuit_breaker,
        })
    }

    fn assemble_metadata(&mut self, value: Option<&Value>) -> BTreeMap<String, ruleflow_ast::LiteralValue> {
        let mut out = BTreeMap::new();
        let Some(Value::Mapping(mapping)) = value else {
            return out;
        };
        for (key, entry) in mapping {
            let Some(key) = key.as_str() else { continue };
            match yaml_to_literal(entry) {
                Some(literal) => {
                    out.insert(key.to_string(), literal);
                }
                None => self.doc_error(format!("metadata entry '{}' is not a literal value", key)),
            }
        }
        out
    }

    /// `inputs`/`outputs`: either a `{name: type}` mapping or a `[name]`
    /// sequence, where types default to `any`.
    fn assemble_decls(&mut self, value: Option<&Value>) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        match value {
            None => {}
            Some(Value::Mapping(mapping)) => {
                for (key, entry) in mapping {
                    let Some(key) = key.as_str() else {
                        self.doc_error("declaration names must be strings");
                        continue;
                    };
                    let type_label = entry
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| "any".to_string());
                    out.insert(key.to_string(), type_label);
                }
            }
            Some(Value::Sequence(items)) => {
                for item in items {
                    match item.as_str() {
                        Some(name) => {
                            out.insert(name.to_string(), "any".to_string());
                        }
                        None => self.doc_error("declaration names must be strings"),
                    }
                }
            }
            Some(_) => self.doc_error("inputs/outputs must be a mapping or a sequence"),
        }
        out
    }

    fn assemble_constants(&mut self, value: Option<&Value>) -> Vec<ConstantDecl> {
        let mut out = Vec::new();
        let Some(value) = value else { return out };
        let Some(items) = value.as_sequence() else {
            self.doc_error("constants must be a sequence");
            return out;
        };
        for item in items {
            match item {
                Value::String(name) => out.push(ConstantDecl {
                    name: name.clone(),
                    code: name.clone(),
                    type_label: None,
                    default: None,
                }),
                Value::Mapping(_) => {
                    let Some(name) = string_field(item, "name") else {
                        self.doc_error("constant declarations need a 'name'");
                        continue;
                    };
                    let code = string_field(item, "code").unwrap_or_else(|| name.clone());
                    let type_label = string_field(item, "type");
                    let default = item.get("default").and_then(yaml_to_literal);
                    out.push(ConstantDecl {
                        name,
                        code,
                        type_label,
                        default,
                    });
                }
                _ => self.doc_error("constants must be names or {name, code, type, default} mappings"),
            }
        }
        out
    }

    fn assemble_circuit_breaker(&mut self, value: Option<&Value>) -> Option<CircuitBreakerConfig> {
        let value = value?;
        if value.as_mapping().is_none() {
            self.doc_error("circuit_breaker must be a mapping");
            return None;
        }
        let defaults = CircuitBreakerConfig::default();
        Some(CircuitBreakerConfig {
            enabled: value.get("enabled").and_then(Value::as_bool).unwrap_or(defaults.enabled),
            failure_threshold: value
                .get("failure_threshold")
                .and_then(Value::as_u64)
                .map(|v| v as u32)
                .unwrap_or(defaults.failure_threshold),
            timeout_ms: value
                .get("timeout")
                .or_else(|| value.get("timeout_ms"))
                .and_then(Value::as_u64)
                .unwrap_or(defaults.timeout_ms),
            recovery_timeout_ms: value
                .get("recovery_timeout")
                .or_else(|| value.get("recovery_timeout_ms"))
                .and_then(Value::as_u64)
                .unwrap_or(defaults.recovery_timeout_ms),
        })
    }

    /// Assemble one body from a rule or sub-rule mapping, honoring the
    /// `rules` > `conditions` > `when` > `then` precedence.
    fn assemble_body(&mut self, value: &Value, prefix: &str) -> Option<RuleBody> {
        if let Some(rules) = value.get("rules") {
            return self.assemble_multi(rules, prefix);
        }
        if let Some(conditions) = value.get("conditions") {
            let complex = self.assemble_complex(conditions, prefix)?;
            return Some(RuleBody::Complex(complex));
        }
        if let Some(when) = value.get("when") {
            let when = self.assemble_conditions(when, &format!("{}when", prefix));
            let then_actions =
                self.assemble_actions(value.get("then"), &format!("{}then", prefix));
            let else_actions =
                self.assemble_actions(value.get("else"), &format!("{}else", prefix));
            return Some(RuleBody::Simple {
                when,
                then_actions,
                else_actions,
            });
        }
        if let Some(then) = value.get("then") {
            let then_actions = self.assemble_actions(Some(then), &format!("{}then", prefix));
            return Some(RuleBody::ThenOnly { then_actions });
        }
        self.doc_error(format!(
            "rule{} has no executable body (expected 'when'/'then', 'conditions' or 'rules')",
            if prefix.is_empty() { String::new() } else { format!(" section '{}'", prefix) },
        ));
        None
    }

    fn assemble_multi(&mut self, value: &Value, prefix: &str) -> Option<RuleBody> {
        let Some(items) = value.as_sequence() else {
            self.doc_error("'rules' must be a sequence of sub-rules");
            return None;
        };
        let mut rules = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if item.as_mapping().is_none() {
                self.doc_error(format!("sub-rule {} must be a mapping", i));
                continue;
            }
            let sub_prefix = format!("{}rules[{}].", prefix, i);
            let Some(body) = self.assemble_body(item, &sub_prefix) else {
                continue;
            };
            rules.push(SubRule {
                name: string_field(item, "name"),
                description: string_field(item, "description"),
                body,
            });
        }
        if rules.is_empty() {
            self.doc_error("'rules' must contain at least one sub-rule");
            return None;
        }
        Some(RuleBody::Multi { rules })
    }

    /// `conditions: {if, then, else}` with optional nesting inside each
    /// branch block.
    fn assemble_complex(&mut self, value: &Value, prefix: &str) -> Option<ComplexBody> {
        if value.as_mapping().is_none() {
            self.doc_error("'conditions' must be an {if, then, else} mapping");
            return None;
        }
        let condition_text = string_field(value, "if").or_else(|| {
            self.doc_error("'conditions' requires an 'if' condition string");
            None
        })?;
        let condition = self.condition_str(&condition_text, &format!("{}if", prefix))?;

        let then_block = match value.get("then") {
            Some(block) => self.assemble_action_block(block, &format!("{}then", prefix))?,
            None => {
                self.doc_error("'conditions' requires a 'then' block");
                return None;
            }
        };
        let else_block = match value.get("else") {
            Some(block) => Some(self.assemble_action_block(block, &format!("{}else", prefix))?),
            None => None,
        };

        Some(ComplexBody {
            condition,
            then_block,
            else_block,
        })
    }

    fn assemble_action_block(&mut self, value: &Value, prefix: &str) -> Option<ActionBlock> {
        match value {
            Value::Mapping(_) if value.get("actions").is_some() || value.get("conditions").is_some() => {
                let actions = self.assemble_actions(value.get("actions"), prefix);
                let nested = match value.get("conditions") {
                    Some(nested) => {
                        Some(Box::new(self.assemble_complex(nested, &format!("{}.", prefix))?))
                    }
                    None => None,
                };
                Some(ActionBlock { actions, nested })
            }
            _ => {
                let actions = self.assemble_actions(Some(value), prefix);
                Some(ActionBlock {
                    actions,
                    nested: None,
                })
            }
        }
    }

    /// `when`: a scalar condition string or a sequence of them.
    fn assemble_conditions(&mut self, value: &Value, base: &str) -> Vec<Condition> {
        let mut out = Vec::new();
        match value {
            Value::String(text) => {
                if let Some(condition) = self.condition_str(text, &format!("{}[0]", base)) {
                    out.push(condition);
                }
            }
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(text) => {
                            if let Some(condition) =
                                self.condition_str(text, &format!("{}[{}]", base, i))
                            {
                                out.push(condition);
                            }
                        }
                        None => self.doc_error(format!(
                            "condition {}[{}] must be a string",
                            base, i
                        )),
                    }
                }
            }
            _ => self.doc_error(format!("'{}' must be a string or a sequence of strings", base)),
        }
        out
    }

    /// `then`/`else`: a scalar action-list string or a sequence of items,
    /// each a string or a structured mapping.
    fn assemble_actions(&mut self, value: Option<&Value>, base: &str) -> Vec<Action> {
        let mut out = Vec::new();
        match value {
            None => {}
            Some(Value::String(text)) => {
                out.extend(self.action_list_str(text, base));
            }
            Some(Value::Sequence(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let path = format!("{}[{}]", base, i);
                    if let Some(action) = self.action_from_item(item, &path) {
                        out.push(action);
                    }
                }
            }
            Some(_) => self.doc_error(format!(
                "'{}' must be a string or a sequence of actions",
                base
            )),
        }
        out
    }

    fn action_from_item(&mut self, item: &Value, path: &str) -> Option<Action> {
        match item {
            Value::String(text) => self.action_str(text, path),
            Value::Mapping(mapping) => {
                // Multi-key mappings are the structured conditional shape
                if item.get("if").is_some() && mapping.len() > 1 {
                    return self.structured_conditional(item, path);
                }
                if mapping.len() != 1 {
                    self.doc_error(format!(
                        "action {} must be a string or a single-key mapping",
                        path
                    ));
                    return None;
                }
                let (key, value) = mapping.iter().next().unwrap();
                let Some(key) = key.as_str() else {
                    self.doc_error(format!("action {} has a non-string key", path));
                    return None;
                };
                self.structured_action(key, value, path)
            }
            _ => {
                self.doc_error(format!("action {} must be a string or a mapping", path));
                None
            }
        }
    }

    /// Single-key structured forms: the YAML-folded loop (`forEach x in xs:`
    /// as a key), the typed shapes, and the `{variable: value}` assignment
    /// shorthand.
    fn structured_action(&mut self, key: &str, value: &Value, path: &str) -> Option<Action> {
        // Folded loop form: reconstruct the canonical statement and re-parse
        let is_loop_key = key.starts_with("forEach ")
            || key.starts_with("while ")
            || key == "do"
            || key.starts_with("do ");
        if is_loop_key && !matches!(value, Value::Mapping(_)) {
            let Some(body) = join_action_body(value) else {
                self.doc_error(format!("loop body at {} must be a string or a string sequence", path));
                return None;
            };
            let text = format!("{}: {}", key.trim_end_matches(':'), body);
            return self.action_str(&text, path);
        }

        if TYPED_ACTION_KEYS.contains(&key) {
            return self.typed_action(key, value, path);
        }

        // `{variable: value}` assignment shorthand; the value is a literal
        let Some(literal) = yaml_to_literal(value) else {
            self.doc_error(format!(
                "assignment '{}' at {} needs a literal value",
                key, path
            ));
            return None;
        };
        let span = self.doc_span();
        Some(Action::Assignment(AssignmentAction {
            variable: key.to_string(),
            value: Expression::Literal(LiteralExpr {
                value: literal,
                span,
            }),
            span,
        }))
    }

    /// Typed action shapes, rewritten to the canonical string form and
    /// re-parsed so there is one authoritative parser path.
    fn typed_action(&mut self, key: &str, value: &Value, path: &str) -> Option<Action> {
        let text = match key {
            "set" => {
                let variable = self.required_str(value, "variable", path)?;
                let fragment = self.expression_fragment(value.get("value"), "value", path)?;
                format!("set {} to {}", variable, fragment)
            }
            "calculate" => {
                let variable = self.required_str(value, "variable", path)?;
                let expression = match string_field(value, "expression")
                    .or_else(|| string_field(value, "value"))
                {
                    Some(expression) => expression,
                    None => {
                        self.doc_error(format!("'expression' is required at {}", path));
                        return None;
                    }
                };
                format!("calculate {} as {}", variable, expression)
            }
            "run" => {
                let variable = self.required_str(value, "variable", path)?;
                let expression = self.required_str(value, "expression", path)?;
                format!("run {} as {}", variable, expression)
            }
            "call" => {
                let function = self.required_str(value, "function", path)?;
                let mut fragments = Vec::new();
                if let Some(params) = value.get("parameters").or_else(|| value.get("args")) {
                    let Some(items) = params.as_sequence() else {
                        self.doc_error(format!("'parameters' at {} must be a sequence", path));
                        return None;
                    };
                    for param in items {
                        fragments.push(self.fragment_of(param, path)?);
                    }
                }
                format!("call {} with [{}]", function, fragments.join(", "))
            }
            "forEach" => {
                let variable = self.required_str(value, "variable", path)?;
                let iterable = self.required_str(value, "in", path)?;
                let body = self.body_fragment(value.get("do"), path)?;
                match string_field(value, "index") {
                    Some(index) => format!("forEach {}, {} in {}: {}", variable, index, iterable, body),
                    None => format!("forEach {} in {}: {}", variable, iterable, body),
                }
            }
            "while" => {
                let condition = self.required_str(value, "condition", path)?;
                let body = self.body_fragment(value.get("do"), path)?;
                format!("while {}: {}", condition, body)
            }
            "do" => {
                let body = self.body_fragment(value.get("actions"), path)?;
                let condition = self.required_str(value, "while", path)?;
                format!("do: {} while {}", body, condition)
            }
            "if" => return self.structured_conditional_value(value, path),
            _ => unreachable!("key checked against TYPED_ACTION_KEYS"),
        };
        self.action_str(&text, path)
    }

    /// `{if: <condition>, then: [...], else: [...]}` builds the conditional
    /// directly; its branch items recurse through the normal item path.
    fn structured_conditional(&mut self, item: &Value, path: &str) -> Option<Action> {
        let condition_text = self.required_str(item, "if", path)?;
        let condition = self.condition_str(&condition_text, &format!("{}.if", path))?;
        let then_actions = self.assemble_actions(item.get("then"), &format!("{}.then", path));
        let else_actions = self.assemble_actions(item.get("else"), &format!("{}.else", path));
        Some(Action::Conditional(ConditionalAction {
            condition,
            then_actions,
            else_actions,
            span: self.doc_span(),
        }))
    }

    /// `{if: {condition, then, else}}` — the single-key spelling.
    fn structured_conditional_value(&mut self, value: &Value, path: &str) -> Option<Action> {
        let condition_text = match string_field(value, "condition")
            .or_else(|| string_field(value, "if"))
        {
            Some(text) => text,
            None => {
                self.doc_error(format!("'condition' is required at {}", path));
                return None;
            }
        };
        let condition = self.condition_str(&condition_text, &format!("{}.if", path))?;
        let then_actions = self.assemble_actions(value.get("then"), &format!("{}.then", path));
        let else_actions = self.assemble_actions(value.get("else"), &format!("{}.else", path));
        Some(Action::Conditional(ConditionalAction {
            condition,
            then_actions,
            else_actions,
            span: self.doc_span(),
        }))
    }

    fn required_str(&mut self, value: &Value, key: &str, path: &str) -> Option<String> {
        match string_field(value, key) {
            Some(text) => Some(text),
            None => {
                self.doc_error(format!("'{}' is required at {}", key, path));
                None
            }
        }
    }

    fn expression_fragment(&mut self, value: Option<&Value>, key: &str, path: &str) -> Option<String> {
        match value {
            Some(value) => self.fragment_of(value, path),
            None => {
                self.doc_error(format!("'{}' is required at {}", key, path));
                None
            }
        }
    }

    fn fragment_of(&mut self, value: &Value, path: &str) -> Option<String> {
        match yaml_to_dsl_fragment(value) {
            Some(fragment) => Some(fragment),
            None => {
                self.doc_error(format!("value at {} is not a scalar or list", path));
                None
            }
        }
    }

    fn body_fragment(&mut self, value: Option<&Value>, path: &str) -> Option<String> {
        match value.and_then(join_action_body) {
            Some(body) => Some(body),
            None => {
                self.doc_error(format!(
                    "loop body at {} must be a string or a string sequence",
                    path
                ));
                None
            }
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
