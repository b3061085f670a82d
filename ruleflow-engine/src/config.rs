//! Engine configuration
//!
//! An explicit value passed to the engine constructor; there is no
//! process-global state.

use regex::Regex;
use std::time::Duration;

pub const DEFAULT_INPUT_PATTERN: &str = "^[a-z][a-zA-Z0-9]*$";
pub const DEFAULT_COMPUTED_PATTERN: &str = "^[a-z][a-z0-9_]*$";
pub const DEFAULT_CONSTANT_PATTERN: &str = "^[A-Z][A-Z0-9_]*$";

/// Which AST cache backend the engine constructs by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheProvider {
    Local,
    Remote,
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cache_provider: CacheProvider,
    pub cache_max_size: usize,
    pub cache_ttl_write: Duration,
    pub cache_ttl_access: Duration,
    pub loop_max_iterations: u64,
    pub decimal_div_scale: i64,
    pub input_pattern: Regex,
    pub computed_pattern: Regex,
    pub constant_pattern: Regex,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_provider: CacheProvider::Local,
            cache_max_size: 1_000,
            cache_ttl_write: Duration::from_secs(2 * 60 * 60),
            cache_ttl_access: Duration::from_secs(30 * 60),
            loop_max_iterations: 10_000,
            decimal_div_scale: 10,
            input_pattern: Regex::new(DEFAULT_INPUT_PATTERN).expect("valid default pattern"),
            computed_pattern: Regex::new(DEFAULT_COMPUTED_PATTERN).expect("valid default pattern"),
            constant_pattern: Regex::new(DEFAULT_CONSTANT_PATTERN).expect("valid default pattern"),
        }
    }
}
