//! The fingerprint-keyed result cache.
//!
//! Deterministic node work is memoised under the SHA-256 of
//! `[kind, resolved_config, inputs]` for a bounded time. The cache is
//! in-process and volatile; it is not part of the durable state. The inner
//! mutex is held only across map mutations, never across I/O.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use nodes::NodeResult;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// Hit/miss counters and the current entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
struct CacheEntry {
    result: NodeResult,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// TTL-bounded, LRU-evicting memo of successful node results.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<CacheInner>,
}

impl ResultCache {
    /// A cache holding at most `max_entries` results.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Derive the cache key for one node invocation.
    ///
    /// Compact JSON of the `[kind, resolved_config, inputs]` triple —
    /// serde_json object keys are ordered, so equal triples serialize
    /// identically — hashed with SHA-256.
    pub fn fingerprint(kind: &str, resolved_config: &Value, inputs: &Map<String, Value>) -> String {
        let material = json!([kind, resolved_config, inputs]).to_string();
        hex::encode(Sha256::digest(material.as_bytes()))
    }

    /// Fetch a live entry. Expired entries are removed on the way.
    pub fn get(&self, key: &str) -> Option<NodeResult> {
        let mut inner = self.inner.lock().unwrap();

        let expired = matches!(
            inner.entries.peek(key),
            Some(entry) if entry.expires_at <= Instant::now()
        );
        if expired {
            inner.entries.pop(key);
        }

        // `get` (not `peek`) so a hit refreshes recency.
        let hit = inner.entries.get(key).map(|entry| entry.result.clone());
        match hit {
            Some(result) => {
                inner.hits += 1;
                Some(result)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a successful result with absolute expiry `now + ttl`.
    /// Failed results are never stored.
    pub fn put(&self, key: String, result: &NodeResult, ttl: Duration) {
        if !result.success {
            return;
        }

        let entry = CacheEntry {
            result: result.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.inner.lock().unwrap().entries.put(key, entry);
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    fn result(value: Value) -> NodeResult {
        NodeResult::succeeded(value, 5)
    }

    #[test]
    fn equal_triples_fingerprint_equally() {
        let inputs: Map<String, Value> =
            [("a".to_string(), json!(1))].into_iter().collect();
        let one = ResultCache::fingerprint("echo", &json!({ "text": "x" }), &inputs);
        let two = ResultCache::fingerprint("echo", &json!({ "text": "x" }), &inputs);
        assert_eq!(one, two);

        let other = ResultCache::fingerprint("echo", &json!({ "text": "y" }), &inputs);
        assert_ne!(one, other);
    }

    #[test]
    fn hit_after_put_and_counters_move() {
        let cache = ResultCache::new(10);
        cache.put("k".into(), &result(json!("v")), HOUR);

        assert_eq!(cache.get("k").unwrap().output, json!("v"));
        assert!(cache.get("missing").is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn failed_results_are_not_stored() {
        let cache = ResultCache::new(10);
        cache.put("k".into(), &NodeResult::failed("boom", 1), HOUR);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn expired_entries_miss_and_are_removed() {
        let cache = ResultCache::new(10);
        cache.put("k".into(), &result(json!(1)), Duration::ZERO);

        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = ResultCache::new(2);
        cache.put("a".into(), &result(json!(1)), HOUR);
        cache.put("b".into(), &result(json!(2)), HOUR);

        // Touch `a` so `b` is the eviction candidate.
        assert!(cache.get("a").is_some());
        cache.put("c".into(), &result(json!(3)), HOUR);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }
}
