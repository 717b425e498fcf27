//! Configurable Cache Module
//!
//! A reload-then-delegate wrapper that re-reads its size limit from a
//! configuration provider before every mutating operation.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{Cache, MemoryCache, ValueFactory};
use crate::config::{CacheSettings, ConfigurationProvider};
use crate::error::{CacheError, Result};

// == Configurable Cache ==
/// Cache whose size limit follows an external configuration section.
///
/// Before every `set` and `get_or_add`, the wrapper fetches its section from
/// the provider and pushes the configured limit into the wrapped engine,
/// which may evict synchronously. Plain reads delegate without a reload, so
/// configuration lookups are only paid on the operations that can grow the
/// cache, while an operator shrinking the limit still sees eviction take
/// effect on the very next write.
pub struct ConfigurableCache<K, V> {
    inner: MemoryCache<K, V>,
    provider: Arc<dyn ConfigurationProvider>,
    section: String,
}

impl<K, V> ConfigurableCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Wraps a fresh engine and performs one configuration reload.
    ///
    /// Fails when the provider cannot resolve `section`; no instance is
    /// produced and no default limit is substituted.
    pub fn new(
        provider: Arc<dyn ConfigurationProvider>,
        section: impl Into<String>,
    ) -> Result<Self> {
        let cache = Self {
            inner: MemoryCache::default(),
            provider,
            section: section.into(),
        };
        cache.reload()?;
        Ok(cache)
    }

    // == Reload ==
    /// Applies the currently configured size limit to the wrapped engine.
    fn reload(&self) -> Result<()> {
        let raw = self.provider.get(&self.section)?;
        let settings: CacheSettings = serde_json::from_value(raw)
            .map_err(|err| CacheError::InvalidConfig(format!("section {}: {err}", self.section)))?;
        debug!(
            section = %self.section,
            size_limit = settings.size_limit,
            "applying configured size limit"
        );
        self.inner.set_size_limit(settings.size_limit);
        Ok(())
    }

    // == Size Limit ==
    /// Current size bound of the wrapped engine; 0 means unbounded.
    pub fn size_limit(&self) -> u64 {
        self.inner.size_limit()
    }

    /// Updates the bound directly, bypassing the provider.
    ///
    /// The next `set` or `get_or_add` reloads configuration and overwrites
    /// whatever is pushed here.
    pub fn set_size_limit(&self, limit: u64) {
        self.inner.set_size_limit(limit);
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    // == Get ==
    /// Looks up `key` without reloading configuration.
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        self.inner.get(key).await
    }

    // == Set ==
    /// Reloads configuration, then installs a fresh entry for `key`.
    pub fn set<F, Fut>(&self, key: K, factory: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.reload()?;
        self.inner.set(key, factory);
        Ok(())
    }

    // == Get Or Add ==
    /// Reloads configuration, then delegates to the wrapped engine.
    pub async fn get_or_add<F, Fut>(&self, key: K, factory: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.reload()?;
        self.inner.get_or_add(key, factory).await
    }

    // == Remove ==
    /// Deletes the entry for `key` without reloading configuration.
    pub fn remove(&self, key: &K) {
        self.inner.remove(key);
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ConfigurableCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurableCache")
            .field("section", &self.section)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

// == Cache Interface Implementation ==
#[async_trait]
impl<K, V> Cache<K, V> for ConfigurableCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn size_limit(&self) -> u64 {
        ConfigurableCache::size_limit(self)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn set_size_limit(&self, limit: u64) {
        ConfigurableCache::set_size_limit(self, limit);
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        ConfigurableCache::get(self, key).await
    }

    fn set(&self, key: K, factory: ValueFactory<V>) -> Result<()> {
        ConfigurableCache::set(self, key, factory)
    }

    async fn get_or_add(&self, key: K, factory: ValueFactory<V>) -> Result<V> {
        ConfigurableCache::get_or_add(self, key, factory).await
    }

    fn remove(&self, key: &K) {
        ConfigurableCache::remove(self, key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryProvider;
    use serde_json::json;

    const SECTION: &str = "MemoryCache";

    fn provider_with_limit(limit: u64) -> Arc<InMemoryProvider> {
        let provider = InMemoryProvider::new();
        provider.insert(SECTION, json!({ "SizeLimit": limit }));
        Arc::new(provider)
    }

    fn value_factory(value: &str) -> impl Future<Output = anyhow::Result<String>> {
        let value = value.to_string();
        async move { Ok(value) }
    }

    #[test]
    fn test_missing_section_fails_construction() {
        let provider = Arc::new(InMemoryProvider::new());

        let result = ConfigurableCache::<i32, String>::new(provider, SECTION);

        assert!(matches!(result, Err(CacheError::SectionNotFound(_))));
    }

    #[test]
    fn test_reads_size_limit_from_provider() {
        let cache =
            ConfigurableCache::<i32, String>::new(provider_with_limit(20), SECTION).unwrap();
        assert_eq!(cache.size_limit(), 20);
    }

    #[test]
    fn test_defaults_when_field_absent() {
        let provider = InMemoryProvider::new();
        provider.insert(SECTION, json!({}));

        let cache = ConfigurableCache::<i32, String>::new(Arc::new(provider), SECTION).unwrap();

        assert_eq!(cache.size_limit(), crate::config::DEFAULT_SIZE_LIMIT);
    }

    #[test]
    fn test_malformed_section_value_is_rejected() {
        let provider = InMemoryProvider::new();
        provider.insert(SECTION, json!("not a section"));

        let result = ConfigurableCache::<i32, String>::new(Arc::new(provider), SECTION);

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_reads_do_not_reload_writes_do() {
        let provider = provider_with_limit(2);
        let handle = Arc::clone(&provider);
        let cache = ConfigurableCache::<i32, String>::new(handle, SECTION).unwrap();
        assert_eq!(cache.size_limit(), 2);

        provider.insert(SECTION, json!({ "SizeLimit": 1 }));

        // A lookup leaves the previously applied limit in place.
        cache.get(&1).await.unwrap();
        assert_eq!(cache.size_limit(), 2);

        // The next write picks the new limit up.
        cache.set(1, || value_factory("one")).unwrap();
        assert_eq!(cache.size_limit(), 1);
    }

    #[test]
    fn test_section_removed_after_construction() {
        let provider = provider_with_limit(2);
        let handle = Arc::clone(&provider);
        let cache = ConfigurableCache::<i32, String>::new(handle, SECTION).unwrap();

        provider.remove(SECTION);

        let result = cache.set(1, || value_factory("one"));
        assert!(matches!(result, Err(CacheError::SectionNotFound(_))));
    }
}
