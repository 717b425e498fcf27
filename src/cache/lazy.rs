//! Lazy Value Module
//!
//! A deferred computation that runs at most once and shares its outcome with
//! every caller that forces it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{CacheError, Result};

/// Outcome as memoized inside the shared future. The error is reference
/// counted so every force can hand out an owned copy of the same failure.
type Outcome<V> = std::result::Result<V, Arc<anyhow::Error>>;

// == Lazy Value ==
/// A memoized asynchronous value.
///
/// The factory supplied at construction is not executed until the first
/// [`force`](LazyValue::force). Concurrent forces while the computation is in
/// flight all await the same completion, so the factory runs at most once.
/// Whatever the factory produced, value or failure, is replayed verbatim on
/// every later force.
pub struct LazyValue<V> {
    computation: Shared<BoxFuture<'static, Outcome<V>>>,
}

impl<V> LazyValue<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Wraps `factory` without executing it.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let computation = async move { factory().await.map_err(Arc::new) }
            .boxed()
            .shared();
        Self { computation }
    }

    // == Force ==
    /// Forces the computation, starting the factory on first use.
    ///
    /// Suspends until the factory completes when the computation is still in
    /// flight. A caller that drops out mid-force does not abandon the
    /// computation; the next force resumes it where it left off.
    pub async fn force(&self) -> Result<V> {
        self.computation.clone().await.map_err(CacheError::Factory)
    }
}

impl<V: Clone> LazyValue<V> {
    /// Whether the computation has already completed.
    pub fn is_resolved(&self) -> bool {
        self.computation.peek().is_some()
    }
}

impl<V: Clone> fmt::Debug for LazyValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
