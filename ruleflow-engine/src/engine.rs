//! The rule engine facade
//!
//! Owns the configuration, the collaborator handles, the function library
//! and the AST cache, and exposes the blocking and deferred evaluation
//! surfaces.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ruleflow_analyzer::ValidationReport;
use ruleflow_ast::{ComplexBody, Rule, RuleBody};
use ruleflow_cache::{
    cache_key, AstCache, CacheStatsSnapshot, InMemoryRemoteStore, LocalAstCache, RemoteAstCache,
    Singleflight,
};
use ruleflow_diagnostics::{DiagnosticCollection, SourceMap};

use crate::cancel::CancellationToken;
use crate::collaborators::{
    Base64SecurityProvider, Clock, ConstantStore, HttpClient, InMemoryConstantStore,
    InMemoryRuleStore, RuleDefinitionStore, SecurityProvider, SystemClock,
};
use crate::config::{CacheProvider, EngineConfig};
use crate::constants::referenced_constants;
use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::executor::Executor;
use crate::functions::FunctionRegistry;
use crate::result::{EvalEvent, EvaluationResult};
use crate::services::Services;
use crate::value::Value;

/// Per-call options for the `_with` evaluation variants.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    pub operation_id: Option<String>,
    pub cancellation: CancellationToken,
}

/// The engine: construct once, share behind an `Arc`, evaluate many times.
pub struct RuleEngine {
    config: EngineConfig,
    cache: Arc<dyn AstCache>,
    singleflight: Singleflight<Arc<Rule>>,
    constant_store: Arc<dyn ConstantStore>,
    rule_store: Arc<dyn RuleDefinitionStore>,
    http: Option<Arc<dyn HttpClient>>,
    clock: Arc<dyn Clock>,
    security: Arc<dyn SecurityProvider>,
    functions: FunctionRegistry,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache: Arc<dyn AstCache> = match config.cache_provider {
            CacheProvider::Local => Arc::new(LocalAstCache::new(
                config.cache_max_size,
                config.cache_ttl_write,
                config.cache_ttl_access,
            )),
            CacheProvider::Remote => Arc::new(RemoteAstCache::new(
                InMemoryRemoteStore::new(),
                config.cache_ttl_write,
            )),
        };
        Self {
            config,
            cache,
            singleflight: Singleflight::new(),
            constant_store: Arc::new(InMemoryConstantStore::new()),
            rule_store: Arc::new(InMemoryRuleStore::new()),
            http: None,
            clock: Arc::new(SystemClock),
            security: Arc::new(Base64SecurityProvider),
            functions: FunctionRegistry::standard(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn AstCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_constant_store(mut self, store: Arc<dyn ConstantStore>) -> Self {
        self.constant_store = store;
        self
    }

    pub fn with_rule_store(mut self, store: Arc<dyn RuleDefinitionStore>) -> Self {
        self.rule_store = store;
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http = Some(client);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_security_provider(mut self, provider: Arc<dyn SecurityProvider>) -> Self {
        self.security = provider;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse rule text through the cache; at most one concurrent build per
    /// distinct source text.
    pub fn parse(&self, text: &str) -> Result<Arc<Rule>, DiagnosticCollection> {
        let key = cache_key(text);
        if let Some(rule) = self.cache.get(&key) {
            return Ok(rule);
        }
        self.singleflight.run(&key, || {
            // A build may have finished between the lookup above and this
            // flight; the re-check is `peek` so one cold parse records
            // exactly one miss
            if let Some(rule) = self.cache.peek(&key) {
                return Ok(rule);
            }
            let mut sources = SourceMap::new();
            let rule = Arc::new(ruleflow_yaml::parse_rule_str(text, &mut sources)?);
            self.cache.put(&key, rule.clone(), None);
            Ok(rule)
        })
    }

    /// Static validation; never touches the evaluation path.
    pub fn validate(&self, text: &str) -> ValidationReport {
        ruleflow_analyzer::validate_rule(text)
    }

    pub fn evaluate(&self, text: &str, inputs: HashMap<String, Value>) -> EvaluationResult {
        self.evaluate_with(text, inputs, EvaluationOptions::default())
    }

    pub fn evaluate_with(
        &self,
        text: &str,
        inputs: HashMap<String, Value>,
        options: EvaluationOptions,
    ) -> EvaluationResult {
        let rule = match self.parse(text) {
            Ok(rule) => rule,
            Err(diagnostics) => {
                let message = diagnostics
                    .first_error()
                    .map(|d| format!("{}: {}", d.code.as_str(), d.message))
                    .unwrap_or_else(|| "parse failed".to_string());
                return EvaluationResult::failure(message, 0);
            }
        };
        self.evaluate_ast_with(&rule, inputs, options)
    }

    /// Evaluate a JSON object of inputs; a convenience over [`Self::evaluate`].
    pub fn evaluate_json(&self, text: &str, inputs: &serde_json::Value) -> EvaluationResult {
        self.evaluate(text, json_inputs(inputs))
    }

    /// Resolve rule text through the rule-definition store, then evaluate.
    pub fn evaluate_by_code(&self, code: &str, inputs: HashMap<String, Value>) -> EvaluationResult {
        match self.rule_store.get_by_code(code) {
            Ok(Some(text)) => self.evaluate(&text, inputs),
            Ok(None) => EvaluationResult::failure(
                format!("EXT_UNAVAILABLE: no rule definition for code '{}'", code),
                0,
            ),
            Err(error) => {
                EvaluationResult::failure(format!("EXT_UNAVAILABLE: {}", error), 0)
            }
        }
    }

    pub fn evaluate_ast(&self, rule: &Arc<Rule>, inputs: HashMap<String, Value>) -> EvaluationResult {
        self.evaluate_ast_with(rule, inputs, EvaluationOptions::default())
    }

    pub fn evaluate_ast_with(
        &self,
        rule: &Arc<Rule>,
        inputs: HashMap<String, Value>,
        options: EvaluationOptions,
    ) -> EvaluationResult {
        let operation_id = options
            .operation_id
            .unwrap_or_else(|| default_operation_id());
        let mut ctx = EvaluationContext::new(inputs, operation_id, options.cancellation);
        self.load_constants(rule, &mut ctx);

        let services = Services {
            config: &self.config,
            functions: &self.functions,
            http: self.http.as_deref(),
            clock: self.clock.as_ref(),
            security: self.security.as_ref(),
        };

        let outcome = self.run_body(&rule.body, &mut ctx, &services);
        let execution_ms = ctx.elapsed_ms();
        let circuit_breaker_triggered = ctx.breaker_tripped();
        let circuit_breaker_message = ctx.breaker_message().map(str::to_string);
        let events = ctx.take_events();

        let mut outputs: BTreeMap<String, Value> = ctx
            .computed()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for name in rule.output_decl.keys() {
            outputs.entry(name.clone()).or_insert(Value::Null);
        }

        match outcome {
            Ok(condition_result) => {
                outputs.insert("conditionResult".to_string(), Value::Boolean(condition_result));
                EvaluationResult {
                    success: true,
                    condition_result,
                    outputs,
                    execution_ms,
                    circuit_breaker_triggered,
                    circuit_breaker_message,
                    error: None,
                    events,
                }
            }
            Err(error) => EvaluationResult {
                success: false,
                condition_result: false,
                outputs,
                execution_ms,
                circuit_breaker_triggered,
                circuit_breaker_message,
                error: Some(error.to_string()),
                events,
            },
        }
    }

    /// Deferred flavor of [`Self::evaluate`]: a thin adapter for the async
    /// I/O boundary, no suspension inside the core.
    pub async fn evaluate_deferred(
        self: &Arc<Self>,
        text: String,
        inputs: HashMap<String, Value>,
    ) -> EvaluationResult {
        let engine = Arc::clone(self);
        match tokio::task::spawn_blocking(move || engine.evaluate(&text, inputs)).await {
            Ok(result) => result,
            Err(error) => {
                EvaluationResult::failure(format!("EVAL_INTERNAL: {}", error), 0)
            }
        }
    }

    /// Deferred flavor of [`Self::validate`].
    pub async fn validate_deferred(self: &Arc<Self>, text: String) -> ValidationReport {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.validate(&text))
            .await
            .unwrap_or_else(|_| ruleflow_analyzer::validate_rule(""))
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    pub fn invalidate_cached(&self, text: &str) {
        self.cache.invalidate(&cache_key(text));
    }

    /// Snapshot constants into the context: declared constants plus every
    /// UPPER_SNAKE reference, one store batch, defaults on store failure.
    fn load_constants(&self, rule: &Rule, ctx: &mut EvaluationContext) {
        // code → name; auto-detected names use themselves as the code
        let mut codes: BTreeMap<String, String> = BTreeMap::new();
        for declared in &rule.constants {
            codes.insert(declared.code.clone(), declared.name.clone());
        }
        for name in referenced_constants(rule, &self.config.constant_pattern) {
            codes.entry(name.clone()).or_insert(name);
        }
        if codes.is_empty() {
            return;
        }

        let code_list: Vec<String> = codes.keys().cloned().collect();
        let fetched = match self.constant_store.get_many(&code_list) {
            Ok(values) => values,
            Err(error) => {
                ctx.add_event(EvalEvent::warning(
                    "EXT_UNAVAILABLE",
                    format!("constant store failed: {}; using declared defaults", error),
                ));
                HashMap::new()
            }
        };

        for (code, name) in &codes {
            if let Some(value) = fetched.get(code) {
                ctx.set_constant(name.clone(), value.clone());
                continue;
            }
            let declared_default = rule
                .constants
                .iter()
                .find(|declared| &declared.name == name)
                .and_then(|declared| declared.default.as_ref());
            if let Some(default) = declared_default {
                ctx.set_constant(name.clone(), Value::from_literal(default));
            }
            // Otherwise left unbound: reads yield null with a warning
        }
    }

    fn run_body(
        &self,
        body: &RuleBody,
        ctx: &mut EvaluationContext,
        services: &Services<'_>,
    ) -> Result<bool, EngineError> {
        match body {
            RuleBody::Simple {
                when,
                then_actions,
                else_actions,
            } => {
                let mut outcome = true;
                for condition in when {
                    if !Evaluator::new(ctx, services).evaluate_condition(condition)? {
                        outcome = false;
                        break;
                    }
                }
                let branch = if outcome { then_actions } else { else_actions };
                Executor::new(ctx, services).execute_all(branch)?;
                Ok(outcome)
            }
            RuleBody::ThenOnly { then_actions } => {
                Executor::new(ctx, services).execute_all(then_actions)?;
                Ok(true)
            }
            RuleBody::Complex(complex) => self.run_complex(complex, ctx, services),
            RuleBody::Multi { rules } => {
                let mut overall = true;
                for sub in rules {
                    if ctx.breaker_tripped() {
                        break;
                    }
                    let outcome = self.run_body(&sub.body, ctx, services)?;
                    overall = overall && outcome;
                    if let Some(name) = &sub.name {
                        self.record_sub_rule_outcome(name, outcome, ctx, services);
                    }
                }
                Ok(overall)
            }
        }
    }

    fn run_complex(
        &self,
        complex: &ComplexBody,
        ctx: &mut EvaluationContext,
        services: &Services<'_>,
    ) -> Result<bool, EngineError> {
        let outcome = Evaluator::new(ctx, services).evaluate_condition(&complex.condition)?;
        let block = if outcome {
            Some(&complex.then_block)
        } else {
            complex.else_block.as_ref()
        };
        if let Some(block) = block {
            Executor::new(ctx, services).execute_all(&block.actions)?;
            if let Some(nested) = &block.nested {
                self.run_complex(nested, ctx, services)?;
            }
        }
        Ok(outcome)
    }

    /// A named sub-rule records `<name>_result`; names that cannot be
    /// snake_cased are skipped with a warning rather than failing the run.
    fn record_sub_rule_outcome(
        &self,
        name: &str,
        outcome: bool,
        ctx: &mut EvaluationContext,
        services: &Services<'_>,
    ) {
        let variable = format!("{}_result", snake_case(name));
        if ctx
            .write_computed(&variable, Value::Boolean(outcome), &services.config.computed_pattern)
            .is_err()
        {
            ctx.add_event(EvalEvent::warning(
                "NAMING_WRITE",
                format!("cannot record outcome of sub-rule '{}': invalid name", name),
            ));
        }
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_separator = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && !last_was_separator && !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    out.trim_end_matches('_').to_string()
}

fn default_operation_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("op-{:x}", nanos)
}

/// Convert a JSON object into an input map; non-objects become empty input.
pub fn json_inputs(inputs: &serde_json::Value) -> HashMap<String, Value> {
    match inputs {
        serde_json::Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect(),
        _ => HashMap::new(),
    }
}
