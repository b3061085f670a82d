//! Engine error type

use ruleflow_diagnostics::ErrorCode;
use thiserror::Error;

/// Failures that abort an evaluation. The display form leads with the
/// stable error code so `EvaluationResult::error` is machine-matchable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("EVAL_TYPE_ERROR: {0}")]
    Type(String),
    #[error("EVAL_DIV_BY_ZERO: {0}")]
    DivisionByZero(String),
    #[error("NAMING_WRITE: {0}")]
    NamingWrite(String),
    #[error("LOOP_MAX_ITERATIONS: {0}")]
    LoopLimit(String),
    #[error("EVAL_CANCELLED: evaluation cancelled")]
    Cancelled,
    #[error("EXT_TIMEOUT: {0}")]
    ExternalTimeout(String),
    #[error("EXT_UNAVAILABLE: {0}")]
    ExternalUnavailable(String),
    #[error("EVAL_INTERNAL: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Type(_) => ErrorCode::EvalTypeError,
            EngineError::DivisionByZero(_) => ErrorCode::EvalDivByZero,
            EngineError::NamingWrite(_) => ErrorCode::NamingWrite,
            EngineError::LoopLimit(_) => ErrorCode::LoopMaxIterations,
            EngineError::Cancelled => ErrorCode::EvalCancelled,
            EngineError::ExternalTimeout(_) => ErrorCode::ExtTimeout,
            EngineError::ExternalUnavailable(_) => ErrorCode::ExtUnavailable,
            EngineError::Internal(_) => ErrorCode::EvalInternal,
        }
    }
}
