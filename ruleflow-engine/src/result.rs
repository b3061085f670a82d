//! Evaluation results and runtime events

use std::collections::BTreeMap;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Info,
    Warning,
}

/// A diagnostic event accumulated while evaluating; the tolerant-runtime
/// counterpart of a hard error.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalEvent {
    pub severity: EventSeverity,
    pub code: String,
    pub message: String,
}

impl EvalEvent {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: EventSeverity::Warning,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: EventSeverity::Info,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The outcome of one evaluation call.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub success: bool,
    /// The overall condition outcome; `true` for unconditional bodies.
    pub condition_result: bool,
    /// Every computed variable plus `conditionResult` and any declared
    /// output names.
    pub outputs: BTreeMap<String, Value>,
    pub execution_ms: u64,
    pub circuit_breaker_triggered: bool,
    pub circuit_breaker_message: Option<String>,
    pub error: Option<String>,
    pub events: Vec<EvalEvent>,
}

impl EvaluationResult {
    pub fn failure(error: String, execution_ms: u64) -> Self {
        Self {
            success: false,
            condition_result: false,
            outputs: BTreeMap::new(),
            execution_ms,
            circuit_breaker_triggered: false,
            circuit_breaker_message: None,
            error: Some(error),
            events: Vec::new(),
        }
    }

    /// JSON form for transports and the CLI.
    pub fn to_json(&self) -> serde_json::Value {
        let outputs: serde_json::Map<String, serde_json::Value> = self
            .outputs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        let events: Vec<serde_json::Value> = self
            .events
            .iter()
            .map(|e| {
                serde_json::json!({
                    "severity": match e.severity {
                        EventSeverity::Info => "info",
                        EventSeverity::Warning => "warning",
                    },
                    "code": e.code,
                    "message": e.message,
                })
            })
            .collect();
        serde_json::json!({
            "success": self.success,
            "conditionResult": self.condition_result,
            "outputs": outputs,
            "executionMs": self.execution_ms,
            "circuitBreakerTriggered": self.circuit_breaker_triggered,
            "circuitBreakerMessage": self.circuit_breaker_message,
            "error": self.error,
            "events": events,
        })
    }
}
