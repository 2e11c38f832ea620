//! In-memory TTL cache.
//!
//! A read-through cache with one store and one expiry policy, shared by a
//! blocking ([`TtlCache::read_blocking`]) and an async ([`TtlCache::read`])
//! read path. Entries expire lazily: an expired entry is dropped the next
//! time it is looked up.
//!
//! There is no single-flight guarantee. Concurrent misses on the same key
//! may each run the factory; the last write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::CacheError;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }
}

/// Thread-safe cache keyed by non-empty strings.
///
/// Cloning the cache shares the underlying store.
///
/// # Examples
///
/// ```rust
/// use etvas_sdk::cache::TtlCache;
/// use std::time::Duration;
///
/// let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
/// cache.write("greeting", "hello".to_string(), None).unwrap();
///
/// assert_eq!(cache.get("greeting").unwrap(), Some("hello".to_string()));
/// ```
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

fn check_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache. A zero `default_ttl` means entries never expire.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Whether a live entry exists for `key`.
    pub fn has(&self, key: &str) -> Result<bool, CacheError> {
        check_key(key)?;
        let entries = self.entries.read().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire read lock: {}", e),
        })?;
        Ok(entries
            .get(key)
            .is_some_and(|entry| entry.is_valid(Instant::now())))
    }

    /// Cached value for `key`, removing it if it has expired.
    pub fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        check_key(key)?;
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|e| CacheError::OperationFailed {
                message: format!("Failed to acquire read lock: {}", e),
            })?;
            match entries.get(key) {
                Some(entry) if entry.is_valid(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        self.evict_expired(key)
    }

    /// Drop `key` if it is still expired under the write lock. Returns the
    /// entry's value if another writer refreshed it in the meantime.
    fn evict_expired(&self, key: &str) -> Result<Option<V>, CacheError> {
        let mut entries = self.entries.write().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        match entries.get(key) {
            Some(entry) if entry.is_valid(Instant::now()) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Store a value. `ttl` defaults to the cache's default; zero, or a TTL
    /// too large to represent as a deadline, never expires.
    pub fn write(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        check_key(key)?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };

        let mut entries = self.entries.write().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    /// Read through the cache, calling `factory` on a miss.
    ///
    /// The lock is not held while the factory runs. Factory errors are
    /// returned as-is and nothing is cached.
    pub async fn read<F, Fut, E>(&self, key: &str, factory: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: From<CacheError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        debug!(key = %key, "Cache miss");
        let value = factory().await?;
        self.write(key, value.clone(), None)?;
        Ok(value)
    }

    /// Blocking variant of [`TtlCache::read`].
    pub fn read_blocking<F, E>(&self, key: &str, factory: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        E: From<CacheError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        debug!(key = %key, "Cache miss");
        let value = factory()?;
        self.write(key, value.clone(), None)?;
        Ok(value)
    }

    /// Remove one entry.
    pub fn clear(&self, key: &str) -> Result<(), CacheError> {
        check_key(key)?;
        let mut entries = self.entries.write().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        entries.remove(key);
        Ok(())
    }

    /// Remove every entry.
    pub fn clear_all(&self) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire write lock: {}", e),
        })?;
        entries.clear();
        Ok(())
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> Result<usize, CacheError> {
        let entries = self.entries.read().map_err(|e| CacheError::OperationFailed {
            message: format!("Failed to acquire read lock: {}", e),
        })?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
