//! Bounded, time-expiring response cache.
//!
//! Sits in front of the generation collaborator so that repeated identical
//! requests short-circuit the expensive call. Entries expire after a TTL and
//! the store is capped; at capacity the oldest insertion is evicted, tracked
//! explicitly via per-entry timestamps rather than relying on incidental map
//! iteration order.
//!
//! Expired entries are removed lazily on access and by a periodic
//! [`cache_sweep_task`]. The sweep is purely a memory bound; skipping it
//! never changes observable behavior because [`ResponseCache::get`] treats an
//! expired entry as absent.
//!
//! Hit/miss rates are not tracked by [`ResponseCache::stats`].

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// A stored value together with its expiry bookkeeping.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

/// Snapshot of cache occupancy, as reported by [`ResponseCache::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live entries at the time of the snapshot.
    pub entries: usize,
    /// Configured capacity.
    pub max_entries: usize,
    /// Estimated memory footprint of keys plus JSON-serialized values.
    pub approx_bytes: usize,
}

/// Bounded map from string keys to TTL'd values.
///
/// Values must be `Clone` (a `get` hands out a copy) and `Serialize` (the
/// footprint estimate in [`Self::stats`] serializes them). State is
/// process-local; horizontally scaled deployments each keep their own cache.
///
/// # Examples
///
/// ```
/// use replyguard::ResponseCache;
/// use std::time::Duration;
///
/// let cache: ResponseCache<Vec<String>> = ResponseCache::new(50, Duration::from_secs(600));
/// cache.set("key", vec!["generated reply".into()], None);
/// assert_eq!(cache.get("key").unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct ResponseCache<T: Clone + Serialize> {
    entries: DashMap<String, CacheEntry<T>>,
    max_entries: usize,
    default_ttl: Duration,
}

impl<T: Clone + Serialize> ResponseCache<T> {
    /// Creates a cache holding at most `max_entries` values, each expiring
    /// `default_ttl` after insertion unless overridden per entry.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            default_ttl,
        }
    }

    /// Returns the value for `key` if present and unexpired.
    ///
    /// An expired entry is removed on the way out and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(Instant::now()) {
                return Some(entry.data.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Inserts or overwrites `key`.
    ///
    /// Expired entries are swept first; if the store is still at capacity and
    /// `key` is new, the oldest insertion is evicted to make room. `ttl`
    /// overrides the default expiry for this entry only.
    pub fn set(&self, key: impl Into<String>, data: T, ttl: Option<Duration>) {
        let key = key.into();
        self.cleanup();

        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            if let Some(oldest_key) = self
                .entries
                .iter()
                .min_by_key(|entry| entry.inserted_at)
                .map(|entry| entry.key().clone())
            {
                tracing::debug!(key = %oldest_key, "Evicting oldest cache entry at capacity");
                self.entries.remove(&oldest_key);
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                data,
                inserted_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Whether `key` holds a live value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning whether it was present (live or not).
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Live entry count, after sweeping provably-expired entries.
    pub fn len(&self) -> usize {
        self.cleanup();
        self.entries.len()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    /// Occupancy snapshot with an estimated serialized footprint.
    pub fn stats(&self) -> CacheStats {
        self.cleanup();
        let approx_bytes = self
            .entries
            .iter()
            .map(|entry| {
                let value_len = serde_json::to_string(&entry.data)
                    .map(|s| s.len())
                    .unwrap_or(0);
                entry.key().len() + value_len
            })
            .sum();
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            approx_bytes,
        }
    }
}

/// Derives a deterministic cache key from the request content.
///
/// Review text and tone are trimmed and lower-cased before hashing so that
/// trivially different spellings of the same request share a key. The
/// optional template id keeps template-driven generations separate.
pub fn response_cache_key(review_text: &str, tone: &str, template_id: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(review_text.trim().to_lowercase());
    hasher.update("\x1f");
    hasher.update(tone.trim().to_lowercase());
    hasher.update("\x1f");
    hasher.update(template_id.unwrap_or(""));
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Background task that periodically sweeps expired cache entries.
pub async fn cache_sweep_task<T>(cache: Arc<ResponseCache<T>>, interval: Duration)
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        cache.cleanup();
        tracing::debug!(entries = cache.entries.len(), "Swept expired cache entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(max_entries: usize) -> ResponseCache<String> {
        ResponseCache::new(max_entries, Duration::from_secs(600))
    }

    // ========================================================================
    // Basic operations
    // ========================================================================

    #[test]
    fn test_set_and_get() {
        let cache = test_cache(10);
        cache.set("k", "v".to_string(), None);
        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert!(cache.has("k"));
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache = test_cache(10);
        assert_eq!(cache.get("absent"), None);
        assert!(!cache.has("absent"));
    }

    #[test]
    fn test_overwrite_same_key() {
        let cache = test_cache(10);
        cache.set("k", "first".to_string(), None);
        cache.set("k", "second".to_string(), None);
        assert_eq!(cache.get("k"), Some("second".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = test_cache(10);
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    // ========================================================================
    // Expiry
    // ========================================================================

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = test_cache(10);
        cache.set("k", "v".to_string(), Some(Duration::from_millis(50)));

        assert_eq!(cache.get("k"), Some("v".to_string()));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_len_excludes_expired_entries() {
        let cache = test_cache(10);
        cache.set("short", "v".to_string(), Some(Duration::from_millis(40)));
        cache.set("long", "v".to_string(), None);

        assert_eq!(cache.len(), 2);
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_per_entry_ttl_overrides_default() {
        let cache = ResponseCache::new(10, Duration::from_millis(40));
        cache.set("default", "v".to_string(), None);
        cache.set("pinned", "v".to_string(), Some(Duration::from_secs(600)));

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(cache.get("default"), None);
        assert_eq!(cache.get("pinned"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_cleanup_reclaims_expired_entries() {
        let cache = test_cache(10);
        cache.set("k", "v".to_string(), Some(Duration::from_millis(30)));
        tokio::time::sleep(Duration::from_millis(60)).await;

        cache.cleanup();
        assert_eq!(cache.stats().entries, 0);
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    #[test]
    fn test_capacity_evicts_oldest_insertion() {
        let cache = test_cache(2);
        cache.set("first", "1".to_string(), None);
        cache.set("second", "2".to_string(), None);
        cache.set("third", "3".to_string(), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some("2".to_string()));
        assert_eq!(cache.get("third"), Some("3".to_string()));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = test_cache(2);
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("a", "updated".to_string(), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some("updated".to_string()));
        assert_eq!(cache.get("b"), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entries_free_capacity_before_eviction() {
        let cache = test_cache(2);
        cache.set("stale", "old".to_string(), Some(Duration::from_millis(30)));
        cache.set("live", "keep".to_string(), None);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // The expired entry is swept by set(), so "live" survives
        cache.set("fresh", "new".to_string(), None);
        assert_eq!(cache.get("live"), Some("keep".to_string()));
        assert_eq!(cache.get("fresh"), Some("new".to_string()));
    }

    // ========================================================================
    // Stats
    // ========================================================================

    #[test]
    fn test_stats_reports_occupancy() {
        let cache = test_cache(5);
        cache.set("a", "hello".to_string(), None);
        cache.set("b", "world".to_string(), None);

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.max_entries, 5);
        assert!(stats.approx_bytes > 0);
    }

    // ========================================================================
    // Key derivation
    // ========================================================================

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = response_cache_key("Great service!", "friendly", None);
        let b = response_cache_key("Great service!", "friendly", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_normalizes_case_and_whitespace() {
        let a = response_cache_key("  Great Service!  ", "Friendly", None);
        let b = response_cache_key("great service!", "friendly", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_distinguishes_inputs() {
        let base = response_cache_key("great service", "friendly", None);
        assert_ne!(base, response_cache_key("terrible service", "friendly", None));
        assert_ne!(base, response_cache_key("great service", "formal", None));
        assert_ne!(base, response_cache_key("great service", "friendly", Some("tpl-1")));
    }

    #[test]
    fn test_cache_key_shape() {
        let key = response_cache_key("text", "tone", Some("tpl"));
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
