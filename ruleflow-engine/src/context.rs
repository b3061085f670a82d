//! Per-evaluation mutable state

use std::collections::HashMap;
use std::time::Instant;

use regex::Regex;

use crate::cancel::CancellationToken;
use crate::error::EngineError;
use crate::result::EvalEvent;
use crate::value::Value;

/// Mutable state for one evaluation call: the three variable namespaces,
/// the circuit-breaker flag, accumulated events and the cancellation token.
///
/// Reads resolve computed > constants > inputs; writes always land in the
/// computed namespace.
pub struct EvaluationContext {
    inputs: HashMap<String, Value>,
    constants: HashMap<String, Value>,
    computed: HashMap<String, Value>,
    operation_id: String,
    started: Instant,
    breaker_message: Option<String>,
    events: Vec<EvalEvent>,
    cancellation: CancellationToken,
}

impl EvaluationContext {
    pub fn new(
        inputs: HashMap<String, Value>,
        operation_id: String,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            inputs,
            constants: HashMap::new(),
            computed: HashMap::new(),
            operation_id,
            started: Instant::now(),
            breaker_message: None,
            events: Vec::new(),
            cancellation,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Snapshot the constants for this evaluation; never refetched.
    pub fn load_constants(&mut self, constants: HashMap<String, Value>) {
        self.constants = constants;
    }

    pub fn set_constant(&mut self, name: impl Into<String>, value: Value) {
        self.constants.insert(name.into(), value);
    }

    /// Resolve a name against the namespaces in precedence order.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.computed
            .get(name)
            .or_else(|| self.constants.get(name))
            .or_else(|| self.inputs.get(name))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Write to the computed namespace, enforcing the snake_case naming
    /// rule.
    pub fn write_computed(
        &mut self,
        name: &str,
        value: Value,
        pattern: &Regex,
    ) -> Result<(), EngineError> {
        if !pattern.is_match(name) {
            return Err(EngineError::NamingWrite(format!(
                "variable '{}' must be snake_case (pattern {})",
                name, pattern
            )));
        }
        self.computed.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind a loop variable, returning the shadowed value for restoration.
    pub fn bind_loop(&mut self, name: &str, value: Value) -> Option<Value> {
        self.computed.insert(name.to_string(), value)
    }

    /// Restore a loop binding to its pre-loop state.
    pub fn restore_loop(&mut self, name: &str, previous: Option<Value>) {
        match previous {
            Some(value) => {
                self.computed.insert(name.to_string(), value);
            }
            None => {
                self.computed.remove(name);
            }
        }
    }

    pub fn computed(&self) -> &HashMap<String, Value> {
        &self.computed
    }

    pub fn trip_breaker(&mut self, message: impl Into<String>) {
        if self.breaker_message.is_none() {
            self.breaker_message = Some(message.into());
        }
    }

    pub fn breaker_tripped(&self) -> bool {
        self.breaker_message.is_some()
    }

    pub fn breaker_message(&self) -> Option<&str> {
        self.breaker_message.as_deref()
    }

    pub fn add_event(&mut self, event: EvalEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<EvalEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.cancellation.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
