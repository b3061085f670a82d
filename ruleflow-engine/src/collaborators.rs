//! External collaborator interfaces and their default implementations
//!
//! The core is synchronous; every blocking point an evaluation can hit
//! (constant store, REST-call expressions, remote cache) lives behind one
//! of these traits.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::value::Value;

/// Recoverable store failures; the engine falls back to declared defaults.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store timed out: {0}")]
    Timeout(String),
}

/// HTTP collaborator failures, split so they map onto the external error
/// kinds.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("request failed: {0}")]
    Failed(String),
}

/// Resolves constant codes to values in one batch per evaluation.
pub trait ConstantStore: Send + Sync {
    fn get_many(&self, codes: &[String]) -> Result<HashMap<String, Value>, StoreError>;
}

/// Resolves rule codes to rule text for the code-evaluation entry point.
pub trait RuleDefinitionStore: Send + Sync {
    fn get_by_code(&self, code: &str) -> Result<Option<String>, StoreError>;
}

/// Performs REST-call expressions.
pub trait HttpClient: Send + Sync {
    fn request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, HttpError>;
}

/// Time source for `now`, `today` and the age predicates.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

/// Encryption and masking backend for the security utilities.
pub trait SecurityProvider: Send + Sync {
    fn encrypt(&self, plain: &str) -> String;
    fn decrypt(&self, cipher: &str) -> Option<String>;
    /// Default mask preserves the last 4 characters.
    fn mask(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let masked = "*".repeat(chars.len() - 4);
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", masked, tail)
    }
}

/// In-memory constant store, the default collaborator and the test double.
#[derive(Default)]
pub struct InMemoryConstantStore {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryConstantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    pub fn insert(&self, code: impl Into<String>, value: Value) {
        self.values.lock().insert(code.into(), value);
    }
}

impl ConstantStore for InMemoryConstantStore {
    fn get_many(&self, codes: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let values = self.values.lock();
        Ok(codes
            .iter()
            .filter_map(|code| values.get(code).map(|v| (code.clone(), v.clone())))
            .collect())
    }
}

/// In-memory rule-definition store.
#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: Mutex<HashMap<String, String>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, code: impl Into<String>, text: impl Into<String>) {
        self.rules.lock().insert(code.into(), text.into());
    }
}

impl RuleDefinitionStore for InMemoryRuleStore {
    fn get_by_code(&self, code: &str) -> Result<Option<String>, StoreError> {
        Ok(self.rules.lock().get(code).cloned())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A pinned clock for deterministic evaluations and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Reversible-obfuscation default for the security utilities. Production
/// deployments inject a real provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64SecurityProvider;

impl SecurityProvider for Base64SecurityProvider {
    fn encrypt(&self, plain: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(plain.as_bytes())
    }

    fn decrypt(&self, cipher: &str) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(cipher).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Blocking HTTP collaborator over `reqwest`.
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| HttpError::Failed(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, HttpError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| HttpError::Failed(e.to_string()))?;
        let mut request = self.client.request(method, url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(e.to_string())
            } else {
                HttpError::Failed(e.to_string())
            }
        })?;
        response
            .json::<serde_json::Value>()
            .map_err(|e| HttpError::Failed(e.to_string()))
    }
}
