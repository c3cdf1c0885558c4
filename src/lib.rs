//! Cache Crab
//!
//! A small authoritative DNS server that answers from a persistent record store and lazily
//! promotes popular records into a volatile cache.
//!
//! Queries are served [cache-first][dns::resolver]; on a miss the [record store][store] is
//! consulted. Every answer counts a hit for its `(domain, qtype)` pair, and pairs that reach the
//! configured threshold are [promoted][dns::promotion] into the [cache] by a bounded pool of
//! background tasks. Records are managed through a private [HTTP admin API][api].
#![warn(clippy::pedantic)]

pub mod api;
pub mod cache;
pub mod config;
pub mod dns;
pub mod error;
pub mod record;
pub mod store;

pub use api::new as new_http;
pub use cache::{InMemoryCacheStore, RecordCache};
pub use config::{Config, SharedConfig};
pub use dns::new as new_dns;
pub use record::{Question, StoredRecord};
pub use store::{InMemoryRecordStore, SqliteRecordStore};
