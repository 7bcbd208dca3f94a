//! Typed facade over the byte-oriented cache.
//!
//! Marshals arbitrary `serde` keys and values through `bincode` and
//! forwards to [`RawCache`] — a thin layer: every semantic (TTLs,
//! eviction, persistence, the latent error) belongs to the byte store
//! underneath. Keys serialize to the byte strings the store indexes,
//! so two keys are the same entry iff their encodings are equal.

use std::marker::PhantomData;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheConfig, RawCache};
use crate::error::{CacheError, Result};

/// Typed key/value cache database.
///
/// ```no_run
/// use std::time::Duration;
/// use stashkit::{Cache, CacheConfig, PolicyKind};
///
/// let cache: Cache<String, u64> = Cache::open_mem(CacheConfig {
///     policy: PolicyKind::Lru,
///     max_cost: 1 << 20,
///     ..Default::default()
/// })?;
///
/// cache.set(&"hits".to_string(), &41, Duration::ZERO)?;
/// cache.update_in_place(&"hits".to_string(), |n| Ok(n + 1), Duration::ZERO)?;
/// let (hits, _ttl) = cache.get(&"hits".to_string())?;
/// assert_eq!(hits, 42);
/// # Ok::<(), stashkit::CacheError>(())
/// ```
pub struct Cache<K, V> {
    raw: RawCache,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("raw", &self.raw).finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    /// Opens an in-memory typed cache.
    pub fn open_mem(config: CacheConfig) -> Result<Self> {
        Ok(Self::from_raw(RawCache::open_mem(config)?))
    }

    /// Opens a file-backed typed cache.
    pub fn open_file(path: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        Ok(Self::from_raw(RawCache::open_file(path, config)?))
    }

    /// Wraps an already-open byte cache.
    pub fn from_raw(raw: RawCache) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Access to the underlying byte cache.
    pub fn raw(&self) -> &RawCache {
        &self.raw
    }

    /// Stores `value` under `key` with `ttl` (zero = unbounded).
    pub fn set(&self, key: &K, value: &V, ttl: Duration) -> Result<()> {
        let key = bincode::serialize(key)?;
        let value = bincode::serialize(value)?;
        self.raw.set(&key, &value, ttl)
    }

    /// Fetches `key`, returning the decoded value and remaining ttl.
    /// A byte-store miss surfaces [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &K) -> Result<(V, Duration)> {
        let key = bincode::serialize(key)?;
        let (bytes, ttl) = self.raw.get(&key)?;
        let value = bincode::deserialize(&bytes)?;
        Ok((value, ttl))
    }

    /// Removes `key`; `Ok(true)` when an entry was present.
    pub fn delete(&self, key: &K) -> Result<bool> {
        let key = bincode::serialize(key)?;
        self.raw.delete(&key)
    }

    /// Decodes the current value, applies `apply`, and stores the
    /// re-encoded result in place under the write lock.
    pub fn update_in_place<F>(&self, key: &K, apply: F, ttl: Duration) -> Result<()>
    where
        F: FnOnce(V) -> Result<V>,
    {
        let key = bincode::serialize(key)?;
        self.raw.update_in_place(
            &key,
            |bytes| {
                let current: V = bincode::deserialize(bytes)?;
                let updated = apply(current)?;
                Ok(bincode::serialize(&updated)?)
            },
            ttl,
        )
    }

    /// Get-or-compute; the factory runs under the cache's write lock
    /// (single-flight) and must not re-enter the cache.
    pub fn memorize<F>(&self, key: &K, factory: F, ttl: Duration) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let key = bincode::serialize(key)?;
        let bytes = self.raw.memorize(
            &key,
            || {
                let value = factory()?;
                Ok(bincode::serialize(&value)?)
            },
            ttl,
        )?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.raw.clear();
    }

    /// Writes a snapshot now (no-op in memory).
    pub fn flush(&self) -> Result<()> {
        self.raw.flush()
    }

    /// Sum of encoded `key.len() + value.len()` over live entries.
    pub fn cost(&self) -> u64 {
        self.raw.cost()
    }

    /// Current entry count.
    pub fn len(&self) -> u64 {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Latent background error, if any.
    pub fn error(&self) -> Option<CacheError> {
        self.raw.error()
    }

    /// Stops the worker and flushes a final snapshot.
    pub fn close(self) -> Result<()> {
        self.raw.close()
    }
}
