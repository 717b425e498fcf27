//! Cache Entry Module
//!
//! Pairs a lazy value with the access-recency bookkeeping used for eviction.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::LazyValue;

// == Cache Entry ==
/// A stored value and the logical tick of its most recent access.
///
/// Ticks come from the owning cache's access clock. Relaxed atomics are
/// enough here: recency is a heuristic input to eviction, not a
/// synchronization point.
pub(crate) struct CacheEntry<V> {
    value: LazyValue<V>,
    last_accessed: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with its creation tick.
    pub(crate) fn new(value: LazyValue<V>, tick: u64) -> Self {
        Self {
            value,
            last_accessed: AtomicU64::new(tick),
        }
    }

    /// The wrapped lazy value.
    pub(crate) fn value(&self) -> &LazyValue<V> {
        &self.value
    }

    // == Touch ==
    /// Marks the entry as accessed at `tick`.
    pub(crate) fn touch(&self, tick: u64) {
        self.last_accessed.store(tick, Ordering::Relaxed);
    }

    /// Tick of the most recent access.
    pub(crate) fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Relaxed)
    }
}

impl<V: Clone> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("resolved", &self.value.is_resolved())
            .field("last_accessed", &self.last_accessed())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: u64) -> CacheEntry<String> {
        CacheEntry::new(
            LazyValue::new(|| async { anyhow::Ok("value".to_string()) }),
            tick,
        )
    }

    #[test]
    fn test_entry_stamped_at_creation() {
        let entry = entry(7);
        assert_eq!(entry.last_accessed(), 7);
    }

    #[test]
    fn test_touch_refreshes_tick() {
        let entry = entry(1);
        entry.touch(5);
        assert_eq!(entry.last_accessed(), 5);
    }

    #[tokio::test]
    async fn test_touch_does_not_force_value() {
        let entry = entry(1);
        entry.touch(2);
        assert!(!entry.value().is_resolved());

        assert_eq!(entry.value().force().await.unwrap(), "value");
        assert!(entry.value().is_resolved());
    }
}
