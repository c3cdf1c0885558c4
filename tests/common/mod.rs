#![allow(dead_code)]

use async_trait::async_trait;
use cachecrab::cache::{DynCacheStore, InMemoryCacheStore, RecordCache};
use cachecrab::dns::{PromotionPolicy, Promoter, Resolver};
use cachecrab::error::Error;
use cachecrab::store::{DynRecordStore, InMemoryRecordStore, RecordStore};
use cachecrab::StoredRecord;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps an [`InMemoryRecordStore`], counting lookups and optionally failing them.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryRecordStore,
    lookups: AtomicUsize,
    fail_lookups: AtomicBool,
    lookup_delay: Option<Duration>,
}

impl CountingStore {
    pub async fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        Self {
            inner: InMemoryRecordStore::with_records(records).await,
            ..Self::default()
        }
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn upsert(&self, record: &StoredRecord) -> Result<(), Error> {
        self.inner.upsert(record).await
    }

    async fn lookup(&self, domain: &str, qtype: &str) -> Result<Vec<StoredRecord>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        self.inner.lookup(domain, qtype).await
    }

    async fn scan_all(&self) -> Result<Vec<StoredRecord>, Error> {
        self.inner.scan_all().await
    }

    async fn delete(&self, domain: &str, qtype: &str) -> Result<u64, Error> {
        self.inner.delete(domain, qtype).await
    }

    async fn increment_hits(&self, domain: &str, qtype: &str) -> Result<(), Error> {
        self.inner.increment_hits(domain, qtype).await
    }

    async fn read_hits(&self, domain: &str, qtype: &str) -> Result<Option<u64>, Error> {
        self.inner.read_hits(domain, qtype).await
    }
}

pub struct Fixture {
    pub store: Arc<CountingStore>,
    pub cache_store: DynCacheStore,
    pub cache: RecordCache,
    pub resolver: Resolver,
}

impl Fixture {
    pub async fn new(records: impl IntoIterator<Item = StoredRecord>, min_hits: u64) -> Self {
        Self::with_store(CountingStore::with_records(records).await, min_hits)
    }

    pub fn with_store(store: CountingStore, min_hits: u64) -> Self {
        let store = Arc::new(store);
        let dyn_store: DynRecordStore = store.clone();
        let cache_store: DynCacheStore = Arc::new(InMemoryCacheStore::new());
        let cache = RecordCache::new(cache_store.clone(), Duration::from_secs(3600));
        let policy = PromotionPolicy::new(dyn_store.clone(), cache.clone(), min_hits);
        let resolver = Resolver::new(dyn_store, cache.clone(), Promoter::new(policy, 16));
        Self {
            store,
            cache_store,
            cache,
            resolver,
        }
    }
}
