//! Volatile record cache.
//!
//! The [`CacheStore`] trait is a plain key/value store with absolute expiry. Keys are built by
//! [`cache_key`] from a normalized `(domain, qtype)` pair, values are opaque bytes.
//!
//! [`RecordCache`] layers the record-list encoding on top: each entry is a JSON snapshot of
//! every [`StoredRecord`] for one pair at the time it was written. Entries are only ever
//! replaced whole, never patched.

use crate::error::Error;
use crate::record::{normalize_domain, normalize_qtype, StoredRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryCacheStore;

/// Namespace prefix for every record cache key.
pub const KEY_PREFIX: &str = "dns:record";

/// Lifetime of entries written by the promotion policy and the admin cache warm path.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// `DynCacheStore` is a type alias for a [`CacheStore`] shared across tasks.
#[allow(clippy::module_name_repetitions)]
pub type DynCacheStore = Arc<dyn CacheStore + Send + Sync>;

/// An async trait describing a key/value store whose entries expire at an absolute time.
#[async_trait::async_trait]
#[allow(clippy::module_name_repetitions)]
pub trait CacheStore {
    /// The value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Store `value` under `key`, replacing any existing entry, expiring `ttl` from now.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Error>;

    /// Remove `key`, returning whether a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, Error>;

    /// Whether a live entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool, Error>;
}

/// The cache key for `(domain, qtype)`: `dns:record:<lowercase domain>:<UPPERCASE qtype>`.
pub fn cache_key(domain: &str, qtype: &str) -> String {
    format!(
        "{KEY_PREFIX}:{}:{}",
        normalize_domain(domain),
        normalize_qtype(qtype)
    )
}

/// Record-list view over a [`CacheStore`].
#[derive(Clone)]
pub struct RecordCache {
    store: DynCacheStore,
    ttl: Duration,
}

impl RecordCache {
    pub fn new(store: DynCacheStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// The cached records for `(domain, qtype)`.
    ///
    /// A missing key, an unreachable cache and an entry that doesn't decode are all reported
    /// the same way, as a miss.
    pub async fn get_records(&self, domain: &str, qtype: &str) -> Option<Vec<StoredRecord>> {
        let key = cache_key(domain, qtype);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                debug!("cache read failed for {key}: {err}");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(records) => Some(records),
            Err(err) => {
                debug!("ignoring undecodable cache entry {key}: {err}");
                None
            }
        }
    }

    /// Replace the entry for `(domain, qtype)` with `records`, resetting its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToCache`] if `records` is empty, or the underlying store error.
    pub async fn put_records(
        &self,
        domain: &str,
        qtype: &str,
        records: &[StoredRecord],
    ) -> Result<(), Error> {
        if records.is_empty() {
            return Err(Error::NothingToCache);
        }
        let raw = serde_json::to_vec(records)?;
        self.store
            .set(&cache_key(domain, qtype), raw, self.ttl)
            .await
    }

    /// Evict the entry for `(domain, qtype)`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn evict(&self, domain: &str, qtype: &str) -> Result<bool, Error> {
        self.store.delete(&cache_key(domain, qtype)).await
    }

    /// Whether a live entry exists for `(domain, qtype)`.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn contains(&self, domain: &str, qtype: &str) -> Result<bool, Error> {
        self.store.exists(&cache_key(domain, qtype)).await
    }
}
