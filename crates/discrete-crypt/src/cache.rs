//! Diffie-Hellman shared secret cache.
//!
//! Computing `peer^private mod p` for a 3080-bit prime dominates the cost of
//! repeated exchanges between the same two parties, so shared values are
//! memoized here.
//!
//! Entries are keyed by the *ordered* pair of decimal public keys exactly
//! as supplied by the caller: `(sender, receiver)` when sealing and
//! `(envelope sender, receiver)` when opening. The same DH value may
//! therefore be stored under both orderings.
//!
//! The cache is never evicted except by [`ExchangeCache::clear`], and
//! correctness never depends on it: a missing entry is recomputed.
//!
//! Each pair owns a slot with its own mutex. The map's shard lock is held
//! only long enough to find or create the slot; the exponentiation runs
//! under the slot lock, so unrelated pairs never wait on it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::error::Result;

type Slot = Arc<Mutex<Option<String>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<String>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Memoized DH shared values, hex encoded.
///
/// Concurrent exchanges between the same pair compute the value once.
#[derive(Debug, Default)]
pub struct ExchangeCache {
    entries: DashMap<(String, String), Slot>,

    /// Statistics: lookups answered from the cache
    hits: AtomicU64,

    /// Statistics: lookups that had to compute
    misses: AtomicU64,
}

impl ExchangeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the shared value for an ordered pair of public keys.
    #[must_use]
    pub fn get(&self, first: &str, second: &str) -> Option<String> {
        let slot = self
            .entries
            .get(&(first.to_owned(), second.to_owned()))
            .map(|entry| Arc::clone(entry.value()))?;
        lock(&slot).clone()
    }

    fn slot(&self, key: &(String, String)) -> Slot {
        Arc::clone(self.entries.entry(key.clone()).or_default().value())
    }

    /// Return the cached value for the pair, computing and storing it with
    /// `compute` on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute`; nothing is stored in that case.
    pub fn get_or_insert_with<F>(&self, first: &str, second: &str, compute: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let key = (first.to_owned(), second.to_owned());
        let slot = self.slot(&key);
        let mut value = lock(&slot);

        if let Some(cached) = value.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("exchange cache hit");
            return Ok(cached.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("exchange cache miss");
        match compute() {
            Ok(computed) => {
                *value = Some(computed.clone());
                Ok(computed)
            }
            Err(e) => {
                drop(value);
                // A slot another caller is filling stays
                self.entries.remove_if(&key, |_, current| {
                    Arc::ptr_eq(current, &slot)
                        && current.try_lock().is_ok_and(|guard| guard.is_none())
                });
                Err(e)
            }
        }
    }

    /// Store a value unless the pair already has one.
    ///
    /// Returns `true` if the value was inserted.
    pub fn put_if_absent(&self, first: &str, second: &str, value: String) -> bool {
        let slot = self.slot(&(first.to_owned(), second.to_owned()));
        let mut current = lock(&slot);
        if current.is_some() {
            return false;
        }
        *current = Some(value);
        true
    }

    /// Drop every memoized value.
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        tracing::debug!(dropped, "exchange cache cleared");
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Exchange cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached pairs
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that computed a value
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache (0.0 when unused).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
