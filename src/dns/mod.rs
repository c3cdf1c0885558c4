//! Cache-aside DNS server.
//!
//! # Resolution
//!
//! Cache Crab answers `A`, `AAAA`, `CNAME` and `TXT` queries (and `ANY`, matching all of them)
//! from records held in the [`RecordStore`][crate::store::RecordStore]. Each query is first
//! looked up in the [`RecordCache`][crate::cache::RecordCache] under its normalized
//! `(domain, qtype)` key; only on a miss is the store consulted, for every record of the domain.
//!
//! E.g. with a record added through the [admin API][crate::api]:
//!
//! ```bash
//! ❯ curl --json '{"domain":"example.com","qtype":"A","ttl":300,"value":"203.0.113.5"}' \
//!    http://localhost:8080/records
//! ```
//!
//! An `A` query for `example.com` would return:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 1053 +noall +answer example.com A
//! example.com.		300	IN	A	203.0.113.5
//! ```
//!
//! Response codes:
//!
//! * `FORMERR` for a query without a question.
//! * `SERVFAIL` when the store can't be read. No retry is attempted.
//! * `NXDOMAIN` when the store has no records at all for the domain.
//! * `NOERROR` otherwise, with one answer per record whose value is valid for its type. `A`
//!   records that aren't IPv4 literals are left out of the answer without failing it.
//!
//! ## Quirks
//!
//! * `AAAA` records holding an IPv4 literal are served as the IPv4-mapped IPv6 address.
//! * The `NXDOMAIN` decision only looks at whether the store returned rows, before they are
//!   filtered by type. A domain with only `A` records answers `AAAA` queries with an empty
//!   `NOERROR`, as does one whose `A` values aren't valid addresses, or a cached entry that
//!   yields no answers.
//!
//! # Promotion
//!
//! Records are never cached on first sight. Every answer counts a hit for its pair in the store,
//! and once a pair reaches [`Config::min_hits_for_cache`][crate::config::Config::min_hits_for_cache]
//! the store-served answer that crosses the threshold copies the pair's records into the cache
//! for [`Config::cache_ttl`][crate::config::Config::cache_ttl]. See [`promotion`].
//!
//! Concurrent queries for the same uncached pair each reach the store; there is no
//! single-flight deduplication.

pub mod answer;
mod handlers;
pub mod promotion;
pub mod resolver;
pub mod server;

pub use promotion::{AnswerSource, PromotionOutcome, PromotionPolicy, Promoter};
pub use resolver::{Resolution, Resolver};
pub use server::new;
