//! Ruleflow AST Cache
//!
//! Content-addressed caching of parsed rule ASTs: keys are the lowercase hex
//! SHA-256 of the source text, entries are `Arc<Rule>` shared freely across
//! evaluations. Two backends sit behind one trait — a local bounded LRU map
//! with dual TTLs, and an adapter over a remote byte-oriented key-value
//! collaborator. A singleflight utility guarantees at most one concurrent
//! build per key.

use std::sync::Arc;
use std::time::Duration;

use ruleflow_ast::Rule;
use sha2::{Digest, Sha256};

pub mod local;
pub mod remote;
pub mod singleflight;
pub mod stats;

pub use local::LocalAstCache;
pub use remote::{InMemoryRemoteStore, RemoteAstCache, RemoteError, RemoteStore};
pub use singleflight::Singleflight;
pub use stats::{CacheStats, CacheStatsSnapshot};

/// The cache key for a rule source text: lowercase hex SHA-256.
pub fn cache_key(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Uniform interface over the AST cache backends.
pub trait AstCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<Rule>>;
    /// Like `get`, but side-effect free: no statistics, no recency update.
    /// Used for the re-check inside a singleflight leader, which must not
    /// count as a second miss.
    fn peek(&self, key: &str) -> Option<Arc<Rule>>;
    /// Store an entry; `ttl` overrides the backend's write TTL.
    fn put(&self, key: &str, rule: Arc<Rule>, ttl: Option<Duration>);
    fn invalidate(&self, key: &str);
    fn invalidate_all(&self);
    fn stats(&self) -> CacheStatsSnapshot;
    /// Backend health; the local tier is always healthy, the remote tier
    /// reports its collaborator's flag.
    fn healthy(&self) -> bool;
}

#[cfg(test)]
mod tests;
