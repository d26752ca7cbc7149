//! In-memory result cache with TTL expiry and batch LRU eviction.
//!
//! Caches merged [`SearchPage`]s keyed by (normalised query, page number).
//! Expiry is lazy: a stale entry is removed by the lookup that finds it,
//! there is no background sweep. When a new key arrives at a full cache
//! the least recently accessed fifth of the entries is dropped in one pass.
//!
//! Timestamps come from [`tokio::time::Instant`], so a paused test runtime
//! controls expiry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::types::SearchPage;

/// Multiplier from serialised JSON length to approximate in-memory size.
const SIZE_FACTOR: usize = 2;

/// Deterministic cache key: normalised query + page number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a sanitised query and 1-based page number.
    ///
    /// The query is lowercased and whitespace-collapsed so that
    /// `"Dune "` and `"dune"` share an entry.
    pub fn new(query: &str, page: u32) -> Self {
        let normalised = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self(format!("{normalised}::{page}"))
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached page plus bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Normalised query and page.
    pub key: CacheKey,
    /// The merged page as stored.
    pub payload: SearchPage,
    /// When the entry was written; expiry counts from here.
    pub created_at: Instant,
    /// Last successful `get`; eviction removes the oldest first.
    pub last_accessed_at: Instant,
    /// Successful lookups since the entry was written.
    pub access_count: u64,
    /// Serialized size of `payload`.
    pub estimated_bytes: usize,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Live entries (expired entries not yet looked up still count).
    pub size: usize,
    /// `hit_count / (hit_count + miss_count)`, or 0.0 before any lookup.
    pub hit_rate: f64,
    /// Lookups answered from a live entry.
    pub hit_count: u64,
    /// Lookups that found nothing or an expired entry.
    pub miss_count: u64,
    /// Rough footprint of all payloads, for diagnostics only.
    pub approx_memory_bytes: usize,
    /// Entries removed by capacity eviction since the last clear.
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Time- and size-bounded store of merged search pages.
///
/// Interior locking makes one instance shareable (`Arc<ResultCache>`)
/// across coordinator sessions. Callers own the instance; there is no
/// global.
#[derive(Debug)]
pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl ResultCache {
    /// Create an empty cache with the given bounds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The bounds this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.created_at) > self.config.ttl()
    }

    /// Look up a page. Expired entries are removed and count as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<SearchPage> {
        let now = Instant::now();
        let mut guard = self.lock();
        let state = &mut *guard;

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            tracing::debug!(%key, "cache entry expired");
            state.entries.remove(key);
            state.misses += 1;
            return None;
        }

        let entry = state.entries.get_mut(key)?;
        entry.last_accessed_at = now;
        entry.access_count += 1;
        state.hits += 1;
        Some(entry.payload.clone())
    }

    /// Insert or replace a page.
    ///
    /// A new key arriving at a full cache first evicts the least recently
    /// accessed batch (see [`CacheConfig::eviction_batch`]).
    pub fn set(&self, key: CacheKey, payload: SearchPage) {
        let now = Instant::now();
        let estimated_bytes = estimate_size(&payload);
        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.capacity {
            let evicted = evict_least_recent(&mut state.entries, self.config.eviction_batch());
            state.evictions += evicted as u64;
            tracing::debug!(evicted, "cache at capacity, evicted batch");
        }

        state.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                payload,
                created_at: now,
                last_accessed_at: now,
                access_count: 0,
                estimated_bytes,
            },
        );
    }

    /// Whether a live entry exists. Does not touch hit/miss counters or recency.
    pub fn has(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        let mut state = self.lock();
        let expired = match state.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => return false,
        };
        if expired {
            state.entries.remove(key);
        }
        !expired
    }

    /// Copy of an entry's bookkeeping without counting as an access.
    pub fn inspect(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().entries.get(key).cloned()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        *self.lock() = CacheState::default();
    }

    /// Remove all expired entries now, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| !self.is_expired(entry, now));
        before - state.entries.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            state.hits as f64 / lookups as f64
        };
        CacheStats {
            size: state.entries.len(),
            hit_rate,
            hit_count: state.hits,
            miss_count: state.misses,
            approx_memory_bytes: state.entries.values().map(|e| e.estimated_bytes).sum(),
            evictions: state.evictions,
        }
    }
}

/// Remove up to `count` entries with the oldest `last_accessed_at`.
fn evict_least_recent(entries: &mut HashMap<CacheKey, CacheEntry>, count: usize) -> usize {
    let mut by_access: Vec<(Instant, CacheKey)> = entries
        .values()
        .map(|e| (e.last_accessed_at, e.key.clone()))
        .collect();
    by_access.sort_by_key(|(at, _)| *at);

    let mut removed = 0;
    for (_, key) in by_access.into_iter().take(count) {
        if entries.remove(&key).is_some() {
            removed += 1;
        }
    }
    removed
}

fn estimate_size(page: &SearchPage) -> usize {
    serde_json::to_vec(page).map_or(0, |bytes| bytes.len() * SIZE_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalizedRecord, Source};
    use std::time::Duration;

    fn make_page(query: &str, page_number: u32, title: &str) -> SearchPage {
        let record = NormalizedRecord::new(
            format!("{query}-{page_number}"),
            title,
            &["Some Author".to_string()],
            Source::GoogleBooks,
        )
        .expect("valid title");
        SearchPage {
            records: vec![record],
            has_more: false,
            total_results: 1,
            query: query.to_string(),
            page_number,
            fetched_at: 0,
        }
    }

    fn small_cache(capacity: usize) -> ResultCache {
        ResultCache::new(CacheConfig {
            capacity,
            ..Default::default()
        })
    }

    #[test]
    fn cache_key_deterministic_for_same_inputs() {
        assert_eq!(CacheKey::new("dune", 1), CacheKey::new("dune", 1));
    }

    #[test]
    fn cache_key_differs_by_page() {
        assert_ne!(CacheKey::new("dune", 1), CacheKey::new("dune", 2));
    }

    #[test]
    fn cache_key_normalises_case_and_whitespace() {
        assert_eq!(CacheKey::new("  Science   FICTION ", 3), CacheKey::new("science fiction", 3));
        assert_eq!(CacheKey::new("Dune", 1).as_str(), "dune::1");
    }

    #[tokio::test]
    async fn miss_counts_and_returns_none() {
        let cache = small_cache(10);
        assert!(cache.get(&CacheKey::new("nothing", 1)).is_none());
        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 0);
        assert!((stats.hit_rate - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn insert_and_retrieve_counts_hit() {
        let cache = small_cache(10);
        let key = CacheKey::new("hobbit", 1);
        cache.set(key.clone(), make_page("hobbit", 1, "The Hobbit"));

        let cached = cache.get(&key).expect("should be cached");
        assert_eq!(cached.records[0].title, "The Hobbit");

        let entry = cache.inspect(&key).expect("entry present");
        assert_eq!(entry.access_count, 1);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 1.0).abs() < f64::EPSILON);
        assert!(stats.approx_memory_bytes > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_present_just_before_ttl() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));

        tokio::time::advance(cache.config().ttl() - Duration::from_millis(1)).await;
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_absent_just_after_ttl() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));

        tokio::time::advance(cache.config().ttl() + Duration::from_millis(1)).await;
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0, "expired entry removed by the lookup");
        assert_eq!(cache.stats().miss_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn access_does_not_extend_ttl() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(cache.get(&key).is_some());
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get(&key).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn has_drops_expired_without_counting() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));
        assert!(cache.has(&key));

        tokio::time::advance(cache.config().ttl() + Duration::from_secs(1)).await;
        assert!(!cache.has(&key));
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hit_count + stats.miss_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_removes_only_stale() {
        let cache = small_cache(10);
        cache.set(CacheKey::new("old", 1), make_page("old", 1, "Old Book"));
        tokio::time::advance(Duration::from_secs(600)).await;
        cache.set(CacheKey::new("new", 1), make_page("new", 1, "New Book"));
        tokio::time::advance(Duration::from_secs(400)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.has(&CacheKey::new("new", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_never_exceeds_capacity() {
        let cache = small_cache(100);
        for i in 0..=100 {
            cache.set(CacheKey::new(&format!("q{i}"), 1), make_page("q", 1, "Title"));
            tokio::time::advance(Duration::from_millis(10)).await;
            assert!(cache.len() <= 100);
        }
        // 100 filled, the 101st evicts 20 then inserts.
        assert_eq!(cache.len(), 81);
        assert_eq!(cache.stats().evictions, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_removes_least_recently_accessed() {
        let cache = small_cache(5);
        for i in 0..5 {
            cache.set(CacheKey::new(&format!("q{i}"), 1), make_page("q", 1, "Title"));
            tokio::time::advance(Duration::from_millis(10)).await;
        }
        // Touch q0 so q1 becomes the least recently accessed.
        assert!(cache.get(&CacheKey::new("q0", 1)).is_some());
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.set(CacheKey::new("q5", 1), make_page("q", 1, "Title"));

        assert_eq!(cache.len(), 5);
        assert!(!cache.has(&CacheKey::new("q1", 1)));
        assert!(cache.has(&CacheKey::new("q0", 1)));
        assert!(cache.has(&CacheKey::new("q5", 1)));
    }

    #[tokio::test]
    async fn overwrite_same_key_does_not_evict() {
        let cache = small_cache(2);
        cache.set(CacheKey::new("a", 1), make_page("a", 1, "Old"));
        cache.set(CacheKey::new("b", 1), make_page("b", 1, "Other"));
        cache.set(CacheKey::new("a", 1), make_page("a", 1, "New"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        let cached = cache.get(&CacheKey::new("a", 1)).expect("cached");
        assert_eq!(cached.records[0].title, "New");
    }

    #[tokio::test]
    async fn clear_resets_entries_and_counters() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));
        let _ = cache.get(&key);
        let _ = cache.get(&CacheKey::new("other", 1));

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.approx_memory_bytes, 0);
    }

    #[tokio::test]
    async fn hit_rate_mixes_hits_and_misses() {
        let cache = small_cache(10);
        let key = CacheKey::new("dune", 1);
        cache.set(key.clone(), make_page("dune", 1, "Dune"));
        let _ = cache.get(&key);
        let _ = cache.get(&key);
        let _ = cache.get(&key);
        let _ = cache.get(&CacheKey::new("missing", 1));
        assert!((cache.stats().hit_rate - 0.75).abs() < f64::EPSILON);
    }
}
