//! Demand-driven cache promotion.
//!
//! Every answered query counts one hit for its `(domain, qtype)` pair. Once a pair reaches
//! the configured threshold, the next answer served from the store copies the pair's current
//! records into the cache. Answers served from the cache only count.
//!
//! Promotions run detached from the query that triggered them through a [`Promoter`], which
//! bounds how many may run at once. Failures are logged and never reach the client.

use crate::cache::RecordCache;
use crate::record::Question;
use crate::store::DynRecordStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Reference threshold of hits before a pair is cached.
pub const DEFAULT_MIN_HITS: u64 = 5;

/// Where an answer was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Cache,
    Store,
}

/// What a single promotion run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// The hit counter couldn't be updated or read back.
    CounterUnavailable,
    BelowThreshold { hits: u64 },
    /// The answer came from the cache; the entry is left as is.
    AlreadyCached { hits: u64 },
    /// The store had nothing left to cache, or the re-fetch failed.
    NothingToCache { hits: u64 },
    CacheWriteFailed { hits: u64 },
    Cached { hits: u64, records: usize },
}

pub struct PromotionPolicy {
    store: DynRecordStore,
    cache: RecordCache,
    min_hits: u64,
}

impl PromotionPolicy {
    pub fn new(store: DynRecordStore, cache: RecordCache, min_hits: u64) -> Self {
        Self {
            store,
            cache,
            min_hits,
        }
    }

    /// Count a hit for `question` and cache its records if it has earned it.
    pub async fn run(&self, question: &Question, source: AnswerSource) -> PromotionOutcome {
        let (domain, qtype) = (question.domain.as_str(), question.qtype());
        debug!("incrementing hits for {question}");

        if let Err(err) = self.store.increment_hits(domain, &qtype).await {
            warn!("failed to increment hits for {question}: {err}");
        }
        let hits = match self.store.read_hits(domain, &qtype).await {
            Ok(Some(hits)) => hits,
            Ok(None) => {
                debug!("no hit counter for {question}");
                return PromotionOutcome::CounterUnavailable;
            }
            Err(err) => {
                error!("failed to read hits for {question}: {err}");
                return PromotionOutcome::CounterUnavailable;
            }
        };

        if hits < self.min_hits {
            debug!("{question} below cache threshold: {hits} hits");
            return PromotionOutcome::BelowThreshold { hits };
        }
        if source == AnswerSource::Cache {
            debug!("{question} already cached: {hits} hits");
            return PromotionOutcome::AlreadyCached { hits };
        }

        let records = match self.store.lookup(domain, &qtype).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => return PromotionOutcome::NothingToCache { hits },
            Err(err) => {
                error!("failed to re-fetch {question} for caching: {err}");
                return PromotionOutcome::NothingToCache { hits };
            }
        };
        debug!("caching {question}: {hits} hits");
        match self.cache.put_records(domain, &qtype, &records).await {
            Ok(()) => PromotionOutcome::Cached {
                hits,
                records: records.len(),
            },
            Err(err) => {
                error!("failed to cache {question}: {err}");
                PromotionOutcome::CacheWriteFailed { hits }
            }
        }
    }
}

/// Runs [`PromotionPolicy`] instances as detached tasks, at most `capacity` at a time.
///
/// A promotion scheduled while every slot is busy is dropped: the hit count is advisory. After
/// [`Promoter::shutdown`] nothing new is scheduled; promotions already running are left to finish.
#[derive(Clone)]
pub struct Promoter {
    policy: Arc<PromotionPolicy>,
    permits: Arc<Semaphore>,
    capacity: u32,
    accepting: Arc<AtomicBool>,
}

impl Promoter {
    pub fn new(policy: PromotionPolicy, capacity: usize) -> Self {
        let capacity = u32::try_from(capacity.max(1)).unwrap_or(u32::MAX);
        Self {
            policy: Arc::new(policy),
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Spawn a promotion for `question`. Returns `None` when it was not scheduled.
    pub fn schedule(
        &self,
        question: Question,
        source: AnswerSource,
    ) -> Option<JoinHandle<PromotionOutcome>> {
        if !self.accepting.load(Ordering::Acquire) {
            debug!("shutting down, not promoting {question}");
            return None;
        }
        let Ok(permit) = self.permits.clone().try_acquire_owned() else {
            warn!("too many pending promotions, dropping {question}");
            return None;
        };
        let policy = self.policy.clone();
        Some(tokio::spawn(async move {
            let outcome = policy.run(&question, source).await;
            drop(permit);
            outcome
        }))
    }

    /// Stop scheduling new promotions.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Wait until no promotion is running.
    pub async fn wait_idle(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity).await {
            drop(all);
        }
    }
}
