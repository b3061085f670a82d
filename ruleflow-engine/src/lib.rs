//! Ruleflow Engine
//!
//! Evaluates rule ASTs against input records: an expression/condition
//! evaluator and an action executor share one evaluation context, with
//! decimal arithmetic, a circuit breaker, naming enforcement on writes and
//! a bounded loop budget. External concerns (constants, rule definitions,
//! HTTP, time, encryption) are injected collaborators.

pub mod cancel;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod context;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod functions;
pub mod result;
pub mod services;
pub mod value;

#[cfg(test)]
mod tests;

pub use cancel::CancellationToken;
pub use collaborators::{
    Base64SecurityProvider, Clock, ConstantStore, FixedClock, HttpClient, HttpError,
    InMemoryConstantStore, InMemoryRuleStore, ReqwestHttpClient, RuleDefinitionStore,
    SecurityProvider, StoreError, SystemClock,
};
pub use config::{CacheProvider, EngineConfig};
pub use engine::{json_inputs, EvaluationOptions, RuleEngine};
pub use error::EngineError;
pub use result::{EvalEvent, EvaluationResult, EventSeverity};
pub use value::Value;
