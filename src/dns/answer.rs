//! Answer synthesis: stored records to protocol answer records.

use crate::record::{fqdn, StoredRecord};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use tracing::debug;
use trust_dns_server::client::rr::rdata::TXT;
use trust_dns_server::client::rr::{RData, Record, RecordType};

/// Build the answer section for `requested` from `records`.
///
/// A record takes part when its type matches `requested` (ignoring case) or `requested` is
/// `ANY`. Records whose value can't be represented for their type are left out; the rest of the
/// answer is unaffected. Each answer carries the stored TTL and the record's fully qualified
/// domain as owner name.
pub fn synthesize(records: &[StoredRecord], requested: RecordType) -> Vec<Record> {
    let requested_name = requested.to_string();
    records
        .iter()
        .filter(|r| requested == RecordType::ANY || r.qtype.eq_ignore_ascii_case(&requested_name))
        .filter_map(answer_record)
        .collect()
}

fn answer_record(record: &StoredRecord) -> Option<Record> {
    let rdata = match rdata(record) {
        Some(rdata) => rdata,
        None => {
            debug!(
                "dropping {} {} record with value {:?}",
                record.qtype, record.domain, record.value
            );
            return None;
        }
    };
    let owner = match fqdn(&record.domain) {
        Ok(owner) => owner,
        Err(err) => {
            debug!("dropping {} record: {err}", record.qtype);
            return None;
        }
    };
    Some(Record::from_rdata(owner, record.ttl, rdata))
}

fn rdata(record: &StoredRecord) -> Option<RData> {
    match record.qtype.to_ascii_uppercase().as_str() {
        "A" => Ipv4Addr::from_str(&record.value).ok().map(RData::A),
        // NB: an IPv4 literal is accepted here and served as its IPv4-mapped IPv6 form.
        "AAAA" => match IpAddr::from_str(&record.value).ok()? {
            IpAddr::V4(v4) => Some(RData::AAAA(v4.to_ipv6_mapped())),
            IpAddr::V6(v6) => Some(RData::AAAA(v6)),
        },
        "CNAME" => fqdn(&record.value).ok().map(RData::CNAME),
        "TXT" => Some(RData::TXT(TXT::new(vec![record.value.clone()]))),
        _ => None,
    }
}
