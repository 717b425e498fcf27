//! Memo Cache - a lightweight in-memory cache with lazy values
//!
//! Provides generic, thread-safe key-value caching where values are computed
//! on first read, memoized per key, and kept within an adjustable size limit
//! by least-recently-accessed eviction.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, ConfigurableCache, LazyValue, MemoryCache, ValueFactory};
pub use config::{
    CacheSettings, ConfigurationProvider, EnvProvider, InMemoryProvider, DEFAULT_SIZE_LIMIT,
};
pub use error::{CacheError, Result};
