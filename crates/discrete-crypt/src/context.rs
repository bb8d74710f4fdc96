//! Application context.
//!
//! Holds the state shared by every operation: the exchange cache and the
//! KDF backend. Construct one per application and pass it explicitly;
//! clones share the same cache.

use std::sync::Arc;

use crate::cache::ExchangeCache;
use crate::kdf::{Kdf, KdfBackend};

/// Shared state for identity, exchange and signature operations.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cache: Arc<ExchangeCache>,
    kdf: Kdf,
}

impl Context {
    /// Context with a fresh cache and the default (blocking pool) KDF.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a customized context.
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// The exchange cache.
    #[must_use]
    pub fn cache(&self) -> &ExchangeCache {
        &self.cache
    }

    /// The KDF service.
    #[must_use]
    pub fn kdf(&self) -> &Kdf {
        &self.kdf
    }

    /// Drop every memoized shared secret.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Builder for [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    cache: Option<Arc<ExchangeCache>>,
    backend: KdfBackend,
}

impl ContextBuilder {
    /// Share an existing cache, e.g. between several contexts.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ExchangeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Select where scrypt runs.
    #[must_use]
    pub fn with_backend(mut self, backend: KdfBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Context {
        Context {
            cache: self.cache.unwrap_or_default(),
            kdf: Kdf::new(self.backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ctx = Context::builder().build();
        assert_eq!(ctx.kdf().backend(), KdfBackend::Blocking);
        assert!(ctx.cache().is_empty());
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(ExchangeCache::new());
        let a = Context::builder().with_cache(Arc::clone(&cache)).build();
        let b = Context::builder()
            .with_cache(Arc::clone(&cache))
            .with_backend(KdfBackend::Inline)
            .build();

        a.cache().put_if_absent("1", "2", "3".into());
        assert_eq!(b.cache().get("1", "2").as_deref(), Some("3"));

        b.clear_cache();
        assert!(a.cache().is_empty());
    }

    #[test]
    fn test_clones_share_cache() {
        let ctx = Context::new();
        let clone = ctx.clone();
        clone.cache().put_if_absent("1", "2", "3".into());
        assert_eq!(ctx.cache().len(), 1);
    }
}
