//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// The type is `Clone` so a memoized factory failure can be handed out to
/// every caller that forces the same entry.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// A value factory failed. The failure is memoized for the entry's
    /// lifetime and replayed on every subsequent read of the key.
    #[error("value factory failed: {0}")]
    Factory(Arc<anyhow::Error>),

    /// The configuration provider could not resolve the requested section.
    #[error("configuration section not found: {0}")]
    SectionNotFound(String),

    /// A configuration section was found but its value could not be
    /// interpreted as cache settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
