//! Local bounded LRU backend with write and access TTLs

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use ruleflow_ast::Rule;

use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::AstCache;

pub const DEFAULT_MAX_ENTRIES: usize = 1_000;
pub const DEFAULT_TTL_WRITE: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_TTL_ACCESS: Duration = Duration::from_secs(30 * 60);

struct CacheEntry {
    rule: Arc<Rule>,
    last_access: Instant,
    expires_at: Instant,
    estimated_bytes: usize,
}

/// In-process AST cache: LRU-bounded, entries expire a fixed time after
/// write and a shorter time after their last access.
pub struct LocalAstCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl_write: Duration,
    ttl_access: Duration,
    stats: CacheStats,
}

impl LocalAstCache {
    pub fn new(max_entries: usize, ttl_write: Duration, ttl_access: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).expect("capacity is at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl_write,
            ttl_access,
            stats: CacheStats::new(),
        }
    }

    fn expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now >= entry.expires_at || now.duration_since(entry.last_access) >= self.ttl_access
    }
}

impl Default for LocalAstCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_WRITE, DEFAULT_TTL_ACCESS)
    }
}

impl AstCache for LocalAstCache {
    fn peek(&self, key: &str) -> Option<Arc<Rule>> {
        let now = Instant::now();
        let entries = self.entries.lock();
        match entries.peek(key) {
            Some(entry) if !self.expired(entry, now) => Some(entry.rule.clone()),
            _ => None,
        }
    }

    fn get(&self, key: &str) -> Option<Arc<Rule>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if self.expired(entry, now) => {
                entries.pop(key);
                self.stats.record_eviction();
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                entry.last_access = now;
                let rule = entry.rule.clone();
                self.stats.record_hit();
                Some(rule)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn put(&self, key: &str, rule: Arc<Rule>, ttl: Option<Duration>) {
        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.ttl_write);
        let estimated_bytes = serde_json::to_vec(rule.as_ref()).map(|b| b.len()).unwrap_or(0);
        let entry = CacheEntry {
            rule,
            last_access: now,
            expires_at: now + ttl,
            estimated_bytes,
        };
        let mut entries = self.entries.lock();
        if let Some((evicted_key, _)) = entries.push(key.to_string(), entry) {
            // push returns the displaced entry; same-key replacement is not
            // an eviction
            if evicted_key != key {
                self.stats.record_eviction();
            }
        }
    }

    fn invalidate(&self, key: &str) {
        self.entries.lock().pop(key);
    }

    fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    fn stats(&self) -> CacheStatsSnapshot {
        let entries = self.entries.lock();
        let estimated_bytes = entries.iter().map(|(_, e)| e.estimated_bytes).sum();
        self.stats.snapshot(entries.len(), estimated_bytes)
    }

    fn healthy(&self) -> bool {
        true
    }
}
