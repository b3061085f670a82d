use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ruleflow_ast::{Action, CircuitBreakerAction, Rule, RuleBody};
use ruleflow_diagnostics::SourceSpan;

use crate::local::LocalAstCache;
use crate::remote::{InMemoryRemoteStore, RemoteAstCache};
use crate::singleflight::Singleflight;
use crate::{cache_key, AstCache};

fn sample_rule(name: &str) -> Arc<Rule> {
    Arc::new(Rule {
        name: name.to_string(),
        description: None,
        version: None,
        metadata: Default::default(),
        input_decl: Default::default(),
        output_decl: Default::default(),
        constants: Vec::new(),
        body: RuleBody::ThenOnly {
            then_actions: vec![Action::CircuitBreaker(CircuitBreakerAction {
                message: "halt".into(),
                error_code: None,
                span: SourceSpan::default(),
            })],
        },
        circuit_breaker: None,
    })
}

#[test]
fn cache_key_is_lowercase_hex_sha256() {
    // Well-known digest of the empty string
    assert_eq!(
        cache_key(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(cache_key("a"), cache_key("a"));
    assert_ne!(cache_key("a"), cache_key("b"));
    assert_eq!(cache_key("a").len(), 64);
}

#[test]
fn local_cache_hit_and_miss_counters() {
    let cache = LocalAstCache::default();
    let key = cache_key("rule text");

    assert!(cache.get(&key).is_none());
    cache.put(&key, sample_rule("r"), None);
    for _ in 0..3 {
        assert!(cache.get(&key).is_some());
    }

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.entries, 1);
    assert!(stats.estimated_bytes > 0);
    assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
}

#[test]
fn peek_is_side_effect_free() {
    let cache = LocalAstCache::default();
    assert!(cache.peek("k").is_none());
    cache.put("k", sample_rule("r"), None);
    assert!(cache.peek("k").is_some());

    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);

    let remote = RemoteAstCache::new(InMemoryRemoteStore::new(), Duration::from_secs(3600));
    remote.put("k", sample_rule("r"), None);
    assert!(remote.peek("k").is_some());
    assert_eq!(remote.stats().hits, 0);
    assert_eq!(remote.stats().misses, 0);
}

#[test]
fn local_cache_write_ttl_expires_entries() {
    let cache = LocalAstCache::new(10, Duration::from_millis(0), Duration::from_secs(3600));
    let key = cache_key("short lived");
    cache.put(&key, sample_rule("r"), None);
    assert!(cache.get(&key).is_none());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn local_cache_per_put_ttl_overrides_default() {
    let cache = LocalAstCache::new(10, Duration::from_millis(0), Duration::from_secs(3600));
    let key = cache_key("long lived");
    cache.put(&key, sample_rule("r"), Some(Duration::from_secs(3600)));
    assert!(cache.get(&key).is_some());
}

#[test]
fn local_cache_evicts_least_recently_used() {
    let cache = LocalAstCache::new(2, Duration::from_secs(3600), Duration::from_secs(3600));
    cache.put("a", sample_rule("a"), None);
    cache.put("b", sample_rule("b"), None);
    assert!(cache.get("a").is_some()); // refresh a
    cache.put("c", sample_rule("c"), None); // displaces b

    assert!(cache.get("b").is_none());
    assert!(cache.get("a").is_some());
    assert!(cache.get("c").is_some());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn local_cache_invalidate() {
    let cache = LocalAstCache::default();
    cache.put("k", sample_rule("r"), None);
    cache.invalidate("k");
    assert!(cache.get("k").is_none());

    cache.put("k", sample_rule("r"), None);
    cache.invalidate_all();
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn remote_cache_round_trips_rules() {
    let cache = RemoteAstCache::new(InMemoryRemoteStore::new(), Duration::from_secs(3600));
    let key = cache_key("remote rule");

    assert!(cache.get(&key).is_none());
    cache.put(&key, sample_rule("remote"), None);
    let loaded = cache.get(&key).expect("entry present");
    assert_eq!(loaded.name, "remote");
    assert!(cache.healthy());
}

#[test]
fn remote_cache_respects_entry_ttl() {
    let cache = RemoteAstCache::new(InMemoryRemoteStore::new(), Duration::from_secs(3600));
    cache.put("k", sample_rule("r"), Some(Duration::from_millis(0)));
    assert!(cache.get("k").is_none());
}

#[test]
fn singleflight_elects_one_leader() {
    let flight = Arc::new(Singleflight::<Arc<Rule>>::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let flight = flight.clone();
        let builds = builds.clone();
        handles.push(std::thread::spawn(move || {
            flight.run::<()>("key", || {
                builds.fetch_add(1, Ordering::SeqCst);
                // Hold the flight open long enough for followers to join
                std::thread::sleep(Duration::from_millis(50));
                Ok(sample_rule("shared"))
            })
        }));
    }

    for handle in handles {
        let rule = handle.join().unwrap().unwrap();
        assert_eq!(rule.name, "shared");
    }
    // Followers that raced in before the leader finished shared one build;
    // threads that started after completion may build again, but never
    // concurrently.
    assert!(builds.load(Ordering::SeqCst) >= 1);
}

#[test]
fn singleflight_failed_leader_does_not_poison_followers() {
    let flight = Singleflight::<Arc<Rule>>::new();
    let result = flight.run("key", || Err::<Arc<Rule>, &str>("boom"));
    assert!(result.is_err());

    // The key is released; the next caller leads a fresh flight
    let result = flight.run("key", || Ok::<_, &str>(sample_rule("ok")));
    assert!(result.is_ok());
}
