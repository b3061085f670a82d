//! Shared read-only dependencies handed to the two visitors

use crate::collaborators::{Clock, HttpClient, SecurityProvider};
use crate::config::EngineConfig;
use crate::functions::FunctionRegistry;

/// Everything an evaluation needs besides the mutable context: config,
/// the function library and the injected collaborators.
pub struct Services<'a> {
    pub config: &'a EngineConfig,
    pub functions: &'a FunctionRegistry,
    pub http: Option<&'a dyn HttpClient>,
    pub clock: &'a dyn Clock,
    pub security: &'a dyn SecurityProvider,
}
