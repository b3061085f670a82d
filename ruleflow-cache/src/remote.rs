//! Remote backend: an adapter over an external byte-oriented key-value
//! collaborator

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use ruleflow_ast::Rule;
use thiserror::Error;

use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::AstCache;

/// Failures from the remote collaborator.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("remote cache unavailable: {0}")]
    Unavailable(String),
    #[error("remote cache timed out: {0}")]
    Timeout(String),
}

/// The external key-value collaborator: opaque binary-safe values with
/// per-entry TTL.
pub trait RemoteStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError>;
    fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), RemoteError>;
    fn delete(&self, key: &str) -> Result<(), RemoteError>;
    fn clear(&self) -> Result<(), RemoteError>;
    fn healthy(&self) -> bool;
}

/// AST cache over a remote store; entries are JSON-serialized rule ASTs.
///
/// Store failures degrade to cache misses — the engine re-parses rather
/// than failing an evaluation over a cache outage.
pub struct RemoteAstCache<S: RemoteStore> {
    store: S,
    default_ttl: Duration,
    stats: CacheStats,
}

impl<S: RemoteStore> RemoteAstCache<S> {
    pub fn new(store: S, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl,
            stats: CacheStats::new(),
        }
    }
}

impl<S: RemoteStore> AstCache for RemoteAstCache<S> {
    fn peek(&self, key: &str) -> Option<Arc<Rule>> {
        match self.store.get(key) {
            Ok(Some(bytes)) => serde_json::from_slice::<Rule>(&bytes).ok().map(Arc::new),
            _ => None,
        }
    }

    fn get(&self, key: &str) -> Option<Arc<Rule>> {
        match self.store.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Rule>(&bytes) {
                Ok(rule) => {
                    self.stats.record_hit();
                    Some(Arc::new(rule))
                }
                Err(_) => {
                    // Corrupt entry: drop it and treat as a miss
                    let _ = self.store.delete(key);
                    self.stats.record_miss();
                    None
                }
            },
            Ok(None) | Err(_) => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn put(&self, key: &str, rule: Arc<Rule>, ttl: Option<Duration>) {
        if let Ok(bytes) = serde_json::to_vec(rule.as_ref()) {
            let _ = self
                .store
                .put(key, bytes, Some(ttl.unwrap_or(self.default_ttl)));
        }
    }

    fn invalidate(&self, key: &str) {
        let _ = self.store.delete(key);
    }

    fn invalidate_all(&self) {
        let _ = self.store.clear();
    }

    fn stats(&self) -> CacheStatsSnapshot {
        // Entry counts live on the remote side; report counters only
        self.stats.snapshot(0, 0)
    }

    fn healthy(&self) -> bool {
        self.store.healthy()
    }
}

/// A process-local [`RemoteStore`] used in tests and as a stand-in when no
/// real remote tier is configured.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((_, Some(expires_at))) if Instant::now() >= *expires_at => {
                entries.remove(key);
                Ok(None)
            }
            Some((bytes, _)) => Ok(Some(bytes.clone())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), RemoteError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), RemoteError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), RemoteError> {
        self.entries.lock().clear();
        Ok(())
    }

    fn healthy(&self) -> bool {
        true
    }
}
