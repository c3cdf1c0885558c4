//! Error types.

use std::net::IpAddr;
use trust_dns_server::proto::error::ProtoError;

/// Error enumerates the possible Cache Crab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a record is written with a type the
    /// [answer synthesizer][crate::dns::answer] can't serve. Only `A`, `AAAA`, `CNAME` and `TXT`
    /// records are accepted by the [admin API][crate::api].
    #[error("unsupported record type: \"{0}\"")]
    UnsupportedRecordType(String),

    /// Returned when a record or request names a domain that isn't a valid DNS name.
    #[error("invalid domain name: \"{0}\"")]
    InvalidDomain(String),

    /// Returned by the [admin API][crate::api] when a `(domain, qtype)` pair has no records in
    /// the [`RecordStore`][crate::store::RecordStore].
    #[error("no {1} records for \"{0}\"")]
    RecordNotFound(String, String),

    /// Returned when asked to write an empty record set into the
    /// [`RecordCache`][crate::cache::RecordCache]. Cache entries always hold at least one record.
    #[error("no records to cache")]
    NothingToCache,

    /// Returned when the [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`] is
    /// not a loopback address, or an address within a private network space. The admin API
    /// performs no authentication and is only intended to be reachable on private networks.
    #[error("API bind address ({0}) must be a loopback or private IP")]
    InsecureAPIBind(IpAddr),

    /// Returned when [`Config::cache_ttl`][`crate::config::Config::cache_ttl`] is zero or longer
    /// than [`MAX_CACHE_TTL`][crate::config::MAX_CACHE_TTL].
    #[error("cache_ttl ({0}s) must be between 1s and {1}s")]
    InvalidCacheTTL(u64, u64),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when JSON from disk (e.g. the [`Config`][crate::config::Config]) or from the
    /// cache can't be processed.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the persistent store reports a query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Returned when the Cache Crab DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),
}
