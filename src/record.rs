//! Record data model shared by the stores, the cache and the resolver.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trust_dns_server::client::rr::{LowerName, Name, RecordType};

/// The record types the [answer synthesizer][crate::dns::answer] knows how to serve.
pub const SUPPORTED_QTYPES: [&str; 4] = ["A", "AAAA", "CNAME", "TXT"];

/// The query type name that matches every stored record type.
pub const WILDCARD_QTYPE: &str = "ANY";

/// TTL applied by the admin API when a new record doesn't specify one.
pub const DEFAULT_TTL: u32 = 300;

/// A record as held by the [`RecordStore`][crate::store::RecordStore] and serialized into
/// [cache entries][crate::cache::RecordCache].
///
/// Identity is the `(domain, qtype, value)` triple. Several records may share a
/// `(domain, qtype)` pair, e.g. round-robin `A` records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredRecord {
    pub domain: String,
    pub qtype: String,
    pub ttl: u32,
    pub value: String,
}

impl StoredRecord {
    /// Build a record with a normalized domain and qtype.
    pub fn new(
        domain: impl AsRef<str>,
        qtype: impl AsRef<str>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: normalize_domain(domain.as_ref()),
            qtype: normalize_qtype(qtype.as_ref()),
            ttl,
            value: value.into(),
        }
    }

    /// Return a copy with the domain and qtype normalized.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.domain, self.qtype, self.ttl, self.value)
    }

    /// Whether the record shares an identity with `other`, ignoring TTL.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.domain == other.domain && self.qtype == other.qtype && self.value == other.value
    }

    /// Check the record can be served: a supported type and a parseable owner name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRecordType`] or [`Error::InvalidDomain`].
    pub fn validate(&self) -> Result<(), Error> {
        if !SUPPORTED_QTYPES.contains(&self.qtype.as_str()) {
            return Err(Error::UnsupportedRecordType(self.qtype.clone()));
        }
        fqdn(&self.domain).map(|_| ())
    }
}

/// The question the resolver answers: a normalized domain and the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub domain: String,
    pub query_type: RecordType,
}

impl Question {
    pub fn new(domain: impl AsRef<str>, query_type: RecordType) -> Self {
        Self {
            domain: normalize_domain(domain.as_ref()),
            query_type,
        }
    }

    /// The protocol type name for the question, e.g. `"AAAA"` or `"ANY"`.
    pub fn qtype(&self) -> String {
        self.query_type.to_string().to_ascii_uppercase()
    }
}

impl From<(&LowerName, RecordType)> for Question {
    fn from((name, query_type): (&LowerName, RecordType)) -> Self {
        Self::new(name.to_string(), query_type)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.query_type, self.domain)
    }
}

/// Lowercase a domain and strip the trailing root label.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    domain
        .strip_suffix('.')
        .unwrap_or(domain)
        .to_ascii_lowercase()
}

pub fn normalize_qtype(qtype: &str) -> String {
    qtype.trim().to_ascii_uppercase()
}

/// Parse `domain` as a fully qualified [`Name`], appending the root label if it is missing.
///
/// # Errors
///
/// Returns [`Error::InvalidDomain`] if the name can't be parsed.
pub fn fqdn(domain: &str) -> Result<Name, Error> {
    let mut name =
        Name::from_str(domain).map_err(|_| Error::InvalidDomain(domain.to_string()))?;
    name.set_fqdn(true);
    Ok(name)
}
