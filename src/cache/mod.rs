//! Cache Module
//!
//! Provides thread-safe in-memory caching with lazy memoized values and
//! least-recently-accessed eviction.

mod configurable;
mod entry;
mod lazy;
mod store;


use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;

// Re-export public types
pub use configurable::ConfigurableCache;
pub(crate) use entry::CacheEntry;
pub use lazy::LazyValue;
pub use store::MemoryCache;

// == Factory Type ==
/// Boxed value factory, as accepted by the [`Cache`] trait.
///
/// The concrete cache types also take plain closures through their generic
/// inherent methods; this alias exists so the trait stays object safe.
pub type ValueFactory<V> = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<V>> + Send>;

// == Cache Interface ==
/// Common contract implemented by the cache engine and its decorators.
///
/// All operations are safe to call concurrently from multiple threads or
/// tasks on the same instance.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Current size bound; 0 means unbounded.
    fn size_limit(&self) -> u64;

    /// Number of stored entries at the instant of the call. The value may be
    /// stale as soon as it is returned when mutations run concurrently.
    fn count(&self) -> usize;

    /// Updates the bound and synchronously evicts down to it.
    fn set_size_limit(&self, limit: u64);

    /// Looks up `key`, forcing its value if it has not been computed yet.
    /// Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Unconditionally installs a fresh entry for `key` without executing
    /// the factory, then evicts down to the bound.
    fn set(&self, key: K, factory: ValueFactory<V>) -> Result<()>;

    /// Returns the value for `key`, installing `factory` if the key is
    /// absent. At most one factory ever executes per key.
    async fn get_or_add(&self, key: K, factory: ValueFactory<V>) -> Result<V>;

    /// Deletes the entry for `key`. A no-op when the key is absent.
    fn remove(&self, key: &K);
}
