//! Persistent record and hit-counter storage.
//!
//! The [`RecordStore`] trait is the authoritative source of truth consulted by the
//! [resolver][crate::dns::resolver] on a cache miss, and the home of the per `(domain, qtype)`
//! hit counters driving [cache promotion][crate::dns::promotion].
//!
//! Two implementations are provided, [`memory::InMemoryRecordStore`] and
//! [`sqlite::SqliteRecordStore`]. The former is not durable across restarts. The latter keeps
//! records and counters in a SQLite database.

use crate::error::Error;
use crate::record::StoredRecord;
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryRecordStore;
#[allow(clippy::module_name_repetitions)]
pub use sqlite::SqliteRecordStore;

/// `DynRecordStore` is a type alias for a [`RecordStore`] shared by the resolver, the promotion
/// policy and the admin API.
#[allow(clippy::module_name_repetitions)]
pub type DynRecordStore = Arc<dyn RecordStore + Send + Sync>;

/// An async trait describing durable storage of [`StoredRecord`]s and their hit counters.
///
/// Domains and qtypes passed in are expected to be normalized (see
/// [`normalize_domain`][crate::record::normalize_domain]).
#[async_trait::async_trait]
pub trait RecordStore {
    /// Insert a record, or update the TTL of the record with the same
    /// `(domain, qtype, value)` identity.
    async fn upsert(&self, record: &StoredRecord) -> Result<(), Error>;

    /// All records for `(domain, qtype)`, possibly none. A qtype of `ANY` matches every type.
    async fn lookup(&self, domain: &str, qtype: &str) -> Result<Vec<StoredRecord>, Error>;

    /// Every stored record.
    async fn scan_all(&self) -> Result<Vec<StoredRecord>, Error>;

    /// Delete every record for `(domain, qtype)`, returning how many were removed. Hit counters
    /// are kept.
    async fn delete(&self, domain: &str, qtype: &str) -> Result<u64, Error>;

    /// Create the hit counter for `(domain, qtype)` at 1, or increment it.
    async fn increment_hits(&self, domain: &str, qtype: &str) -> Result<(), Error>;

    /// The hit counter for `(domain, qtype)`, or `None` if the pair was never counted.
    async fn read_hits(&self, domain: &str, qtype: &str) -> Result<Option<u64>, Error>;
}
