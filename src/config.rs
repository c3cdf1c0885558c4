//! JSON configuration.
//!
//! E.g.:
//! ```json
//! {
//!   "dns_bind_addr": "0.0.0.0:1053",
//!   "dns_tcp_timeout": 5,
//!   "database_url": "sqlite://cachecrab.db",
//!   "min_hits_for_cache": 5,
//!   "cache_ttl": 3600,
//!   "api_bind_addr": "127.0.0.1:8080"
//! }
//! ```
//!
//! Only `dns_bind_addr` is required. Without `database_url` records are kept in memory; without
//! `api_bind_addr` the admin API isn't started.
use crate::cache::{DynCacheStore, InMemoryCacheStore, RecordCache, DEFAULT_CACHE_TTL};
use crate::dns::promotion::{PromotionPolicy, Promoter, DEFAULT_MIN_HITS};
use crate::dns::resolver::Resolver;
use crate::error::Error;
use crate::store::{DynRecordStore, InMemoryRecordStore, SqliteRecordStore};
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub dns_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_dns_tcp_timeout")]
    pub dns_tcp_timeout: Duration,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_hits_for_cache")]
    pub min_hits_for_cache: u64,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: Duration,
    #[serde(default = "default_max_pending_promotions")]
    pub max_pending_promotions: usize,
    #[serde(default)]
    pub api_bind_addr: Option<SocketAddr>,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_api_timeout")]
    pub api_timeout: Duration,
}

/// Longest accepted [`Config::cache_ttl`].
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn default_dns_tcp_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_min_hits_for_cache() -> u64 {
    DEFAULT_MIN_HITS
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

fn default_max_pending_promotions() -> usize {
    256
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(10)
}

lazy_static! {
    // NOTE(XXX): Once the "ip" feature has stabilized we can use Ipv6Addr.is_unique_local[0].
    //            Presently this feature is unstable so we home-roll. See also RFC 4193[1].
    // [0]: https://doc.rust-lang.org/std/net/struct.Ipv6Addr.html#method.is_unique_local
    // [1]: https://www.rfc-editor.org/rfc/rfc4193.html
    static ref IPV6_UNIQUE_LOCAL_NETWORK: IpNetwork = IpNetwork::from_str("fc00::/7").unwrap();
}

impl Config {
    /// Load and check a config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] or [`Error::InvalidJSON`] if the file can't be read or parsed, and
    /// [`Error::InsecureAPIBind`] for a public admin API bind address, and
    /// [`Error::InvalidCacheTTL`] for a `cache_ttl` of zero or over [`MAX_CACHE_TTL`].
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.check()?;
        Ok(conf)
    }

    fn check(&self) -> Result<(), Error> {
        self.bind_addr_is_secure()?;
        self.cache_ttl_in_range()
    }

    fn cache_ttl_in_range(&self) -> Result<(), Error> {
        if self.cache_ttl.is_zero() || self.cache_ttl > MAX_CACHE_TTL {
            return Err(Error::InvalidCacheTTL(
                self.cache_ttl.as_secs(),
                MAX_CACHE_TTL.as_secs(),
            ));
        }
        Ok(())
    }

    /// The configured record store: SQLite when a `database_url` is set, otherwise in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the database can't be opened or prepared.
    pub async fn record_store(&self) -> Result<DynRecordStore, Error> {
        let store: DynRecordStore = match &self.database_url {
            Some(url) => {
                tracing::info!("using SQLite record store {url}");
                Arc::new(SqliteRecordStore::connect(url, self.database_max_connections).await?)
            }
            None => {
                tracing::warn!("no database_url configured, records will not survive restarts");
                Arc::new(InMemoryRecordStore::new())
            }
        };
        Ok(store)
    }

    /// Wire a [`Resolver`] over `store` and `cache_store` with the configured promotion policy.
    pub fn resolver(&self, store: DynRecordStore, cache_store: DynCacheStore) -> Resolver {
        let cache = RecordCache::new(cache_store, self.cache_ttl);
        let policy = PromotionPolicy::new(store.clone(), cache.clone(), self.min_hits_for_cache);
        let promoter = Promoter::new(policy, self.max_pending_promotions);
        Resolver::new(store, cache, promoter)
    }

    pub fn cache_store(&self) -> Arc<InMemoryCacheStore> {
        Arc::new(InMemoryCacheStore::new())
    }

    fn bind_addr_is_secure(&self) -> Result<(), Error> {
        match self.api_bind_addr {
            None => Ok(()),
            Some(SocketAddr::V4(v4_addr)) => {
                let ip = v4_addr.ip();
                if !ip.is_loopback() && !ip.is_private() {
                    return Err(Error::InsecureAPIBind(IpAddr::V4(*ip)));
                }
                Ok(())
            }
            Some(SocketAddr::V6(v6_addr)) => {
                let ip = v6_addr.ip();
                if !ip.is_loopback() && !IPV6_UNIQUE_LOCAL_NETWORK.contains(IpAddr::V6(*ip)) {
                    return Err(Error::InsecureAPIBind(IpAddr::V6(*ip)));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Config, Error> {
        let conf: Config = serde_json::from_str(json)?;
        conf.check()?;
        Ok(conf)
    }

    #[test]
    fn defaults_apply() {
        let conf = parse(r#"{"dns_bind_addr":"127.0.0.1:1053"}"#).unwrap();
        assert_eq!(conf.min_hits_for_cache, 5);
        assert_eq!(conf.cache_ttl, Duration::from_secs(3600));
        assert_eq!(conf.dns_tcp_timeout, Duration::from_secs(5));
        assert!(conf.database_url.is_none());
        assert!(conf.api_bind_addr.is_none());
    }

    #[test]
    fn durations_are_seconds() {
        let conf = parse(
            r#"{"dns_bind_addr":"127.0.0.1:1053","cache_ttl":60,"min_hits_for_cache":2}"#,
        )
        .unwrap();
        assert_eq!(conf.cache_ttl, Duration::from_secs(60));
        assert_eq!(conf.min_hits_for_cache, 2);
    }

    #[test]
    fn private_api_bind_addrs_are_accepted() {
        for addr in ["127.0.0.1:8080", "10.0.0.1:8080", "[::1]:8080", "[fd00::1]:8080"] {
            let json = format!(r#"{{"dns_bind_addr":"127.0.0.1:1053","api_bind_addr":"{addr}"}}"#);
            assert!(parse(&json).is_ok(), "{addr} should be accepted");
        }
    }

    #[test]
    fn public_api_bind_addrs_are_rejected() {
        for addr in ["0.0.0.0:8080", "203.0.113.1:8080", "[2001:db8::1]:8080"] {
            let json = format!(r#"{{"dns_bind_addr":"127.0.0.1:1053","api_bind_addr":"{addr}"}}"#);
            assert!(
                matches!(parse(&json), Err(Error::InsecureAPIBind(_))),
                "{addr} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_range_cache_ttl_is_rejected() {
        for ttl in ["0", "31536001", "18446744073709551615"] {
            let json = format!(r#"{{"dns_bind_addr":"127.0.0.1:1053","cache_ttl":{ttl}}}"#);
            assert!(
                matches!(parse(&json), Err(Error::InvalidCacheTTL(_, _))),
                "cache_ttl {ttl} should be rejected"
            );
        }
        let json = r#"{"dns_bind_addr":"127.0.0.1:1053","cache_ttl":31536000}"#;
        assert_eq!(parse(json).unwrap().cache_ttl, MAX_CACHE_TTL);
    }
}
