//! Cache Store Module
//!
//! The cache engine: a concurrent key-entry map with lazy memoized values
//! and least-recently-accessed eviction under an adjustable size limit.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{Cache, CacheEntry, LazyValue, ValueFactory};
use crate::error::Result;

// == Memory Cache ==
/// Thread-safe key-value cache with lazy, memoized value computation.
///
/// Values are produced by caller-supplied factories that run at most once per
/// entry, no matter how many callers race on the same key. When a size limit
/// is set, the least recently accessed entry is evicted until the bound is
/// satisfied; a limit of 0 disables eviction.
pub struct MemoryCache<K, V> {
    /// Key-value storage; sharded locking with atomic insert-if-absent
    entries: DashMap<K, Arc<CacheEntry<V>>>,
    /// Maximum number of entries; 0 = unbounded
    size_limit: AtomicU64,
    /// Logical clock stamping every access; strictly increasing per instance
    access_clock: AtomicU64,
    /// Serializes the scan-then-remove eviction pass
    eviction_lock: Mutex<()>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache bounded to `size_limit` entries; 0 means unbounded.
    pub fn new(size_limit: u64) -> Self {
        Self {
            entries: DashMap::new(),
            size_limit: AtomicU64::new(size_limit),
            access_clock: AtomicU64::new(0),
            eviction_lock: Mutex::new(()),
        }
    }

    // == Size Limit ==
    /// Current size bound; 0 means unbounded.
    pub fn size_limit(&self) -> u64 {
        self.size_limit.load(Ordering::Relaxed)
    }

    /// Updates the bound and immediately evicts down to it.
    pub fn set_size_limit(&self, limit: u64) {
        self.size_limit.store(limit, Ordering::Relaxed);
        self.enforce_size_limit();
    }

    // == Length ==
    /// Returns the current number of entries.
    ///
    /// The value may be stale as soon as it is returned when other tasks
    /// mutate the cache concurrently.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Get ==
    /// Looks up `key`, forcing its value if it has not been computed yet.
    ///
    /// Refreshes the entry's last-accessed tick, then awaits the value. A
    /// memoized factory failure is returned as the same error on every
    /// lookup. Returns `Ok(None)` when the key is absent; a lookup never
    /// creates an entry and never triggers eviction.
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        let entry = match self.entries.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };
        // shard guard dropped above; it is never held across an await

        entry.touch(self.tick());
        let value = entry.value().force().await?;
        Ok(Some(value))
    }

    // == Set ==
    /// Unconditionally installs a fresh entry for `key`, then evicts down to
    /// the bound.
    ///
    /// Any previous entry for the key is discarded along with its memoized
    /// state; a computation already started for the old entry is abandoned,
    /// not cancelled. The factory is not executed here; the first read of
    /// the key runs it.
    pub fn set<F, Fut>(&self, key: K, factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let entry = CacheEntry::new(LazyValue::new(factory), self.tick());
        self.entries.insert(key, Arc::new(entry));
        self.enforce_size_limit();
    }

    // == Get Or Add ==
    /// Returns the value for `key`, installing `factory` if the key is
    /// absent.
    ///
    /// Insert-if-absent is atomic: when several callers race on a key that
    /// was never seen, exactly one factory is kept and executed, and every
    /// caller observes that one outcome. Losing factories are dropped
    /// without running. The eviction pass runs after the value resolves,
    /// whether it resolved to a value or a memoized failure.
    pub async fn get_or_add<F, Fut>(&self, key: K, factory: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let tick = self.tick();
        let entry = {
            let slot = self
                .entries
                .entry(key)
                .or_insert_with(|| Arc::new(CacheEntry::new(LazyValue::new(factory), tick)));
            Arc::clone(slot.value())
        };
        // shard guard dropped above; forcing may suspend for as long as the
        // factory runs and must not block other keys

        entry.touch(self.tick());
        let result = entry.value().force().await;
        self.enforce_size_limit();
        result
    }

    // == Remove ==
    /// Deletes the entry for `key`. A no-op when the key is absent.
    pub fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    // == Eviction ==
    /// Evicts least recently accessed entries until the count fits the
    /// bound.
    ///
    /// The whole pass runs under the eviction lock, so passes started from
    /// different tasks never interleave their scan and remove steps. Lookups
    /// do not take this lock: a concurrent `get` may refresh an entry's tick
    /// after the scan has already picked it, and the entry is evicted in the
    /// running pass anyway.
    fn enforce_size_limit(&self) {
        if self.size_limit() == 0 {
            return;
        }

        let _guard = self.eviction_lock.lock();
        loop {
            // Re-read the limit each round; it can change concurrently.
            let limit = self.size_limit();
            if limit == 0 || self.entries.len() as u64 <= limit {
                break;
            }
            match self.oldest_key() {
                Some(key) => {
                    self.entries.remove(&key);
                    debug!(
                        limit,
                        remaining = self.entries.len(),
                        "evicted least recently accessed entry"
                    );
                }
                None => break,
            }
        }
    }

    /// Key with the smallest last-accessed tick, ties broken by the first
    /// entry encountered in iteration order.
    fn oldest_key(&self) -> Option<K> {
        self.entries
            .iter()
            .min_by_key(|entry| entry.value().last_accessed())
            .map(|entry| entry.key().clone())
    }

    // == Access Clock ==
    /// Next tick of the strictly increasing access clock.
    fn tick(&self) -> u64 {
        self.access_clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// An unbounded cache.
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for MemoryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("count", &self.entries.len())
            .field("size_limit", &self.size_limit.load(Ordering::Relaxed))
            .finish()
    }
}

// == Cache Interface Implementation ==
#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn size_limit(&self) -> u64 {
        MemoryCache::size_limit(self)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn set_size_limit(&self, limit: u64) {
        MemoryCache::set_size_limit(self, limit);
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        MemoryCache::get(self, key).await
    }

    fn set(&self, key: K, factory: ValueFactory<V>) -> Result<()> {
        MemoryCache::set(self, key, factory);
        Ok(())
    }

    async fn get_or_add(&self, key: K, factory: ValueFactory<V>) -> Result<V> {
        MemoryCache::get_or_add(self, key, factory).await
    }

    fn remove(&self, key: &K) {
        MemoryCache::remove(self, key);
    }
}
